use async_trait::async_trait;
use jobcore::{
    error::BackendError,
    perms::Permission,
    role::{
        DeleteRoleOutcome,
        GuardName,
        Role,
        RoleGrant,
        RolePermission,
    },
    traits::RoleBackend,
};

use crate::{
    SqliteBackend,
    chrono::Utc,
    impls::perms::to_permission,
};

type RoleRow = (i64, String, String, i32, String, String, i64);

fn to_role(
    (id, guard_name, job, grade, name, description, created_ts): RoleRow,
) -> Role {
    Role { id, job, grade, guard_name, name, description, created_ts }
}

type RolePermissionRow = (i64, i64, String, String, String);

fn to_role_permission(
    (role_id, permission_id, category, name, attributes): RolePermissionRow,
) -> Result<RolePermission, BackendError> {
    Ok(RolePermission {
        role_id,
        permission_id,
        category,
        name,
        attributes: serde_json::from_str(&attributes)?,
    })
}

async fn add_role_sqlite(
    backend: &SqliteBackend,
    guard: &GuardName,
    name: &str,
    description: &str,
) -> Result<Option<i64>, BackendError> {
    let ts = Utc::now().timestamp();
    let result = sqlx::query(r#"
INSERT INTO role (
    guard_name,
    job,
    grade,
    name,
    description,
    created_ts
)
VALUES ( ?1, ?2, ?3, ?4, ?5, ?6 )
ON CONFLICT(guard_name) DO NOTHING
        "#)
        .bind(guard.to_string())
        .bind(&guard.job)
        .bind(guard.grade)
        .bind(name)
        .bind(description)
        .bind(ts)
        .execute(&*backend.pool)
        .await?;
    Ok((result.rows_affected() > 0).then(|| result.last_insert_rowid()))
}

async fn get_role_sqlite(
    backend: &SqliteBackend,
    id: i64,
) -> Result<Option<Role>, BackendError> {
    let rec = sqlx::query_as::<_, RoleRow>(r#"
SELECT
    id,
    guard_name,
    job,
    grade,
    name,
    description,
    created_ts
FROM
    role
WHERE
    id = ?1
        "#)
        .bind(id)
        .fetch_optional(&*backend.pool)
        .await?
        .map(to_role);
    Ok(rec)
}

async fn get_role_by_guard_name_sqlite(
    backend: &SqliteBackend,
    guard_name: &str,
) -> Result<Option<Role>, BackendError> {
    let rec = sqlx::query_as::<_, RoleRow>(r#"
SELECT
    id,
    guard_name,
    job,
    grade,
    name,
    description,
    created_ts
FROM
    role
WHERE
    guard_name = ?1
        "#)
        .bind(guard_name)
        .fetch_optional(&*backend.pool)
        .await?
        .map(to_role);
    Ok(rec)
}

async fn list_roles_for_job_sqlite(
    backend: &SqliteBackend,
    job: &str,
) -> Result<Vec<Role>, BackendError> {
    let recs = sqlx::query_as::<_, RoleRow>(r#"
SELECT
    id,
    guard_name,
    job,
    grade,
    name,
    description,
    created_ts
FROM
    role
WHERE
    job = ?1
ORDER BY grade
        "#)
        .bind(job)
        .fetch_all(&*backend.pool)
        .await?
        .into_iter()
        .map(to_role)
        .collect();
    Ok(recs)
}

async fn count_roles_sqlite(
    backend: &SqliteBackend,
    prefix: &str,
) -> Result<i64, BackendError> {
    let (count,) = sqlx::query_as::<_, (i64,)>(r#"
SELECT
    COUNT(*)
FROM
    role
WHERE
    substr(guard_name, 1, length(?1)) = ?1
        "#)
        .bind(prefix)
        .fetch_one(&*backend.pool)
        .await?;
    Ok(count)
}

async fn delete_role_sqlite(
    backend: &SqliteBackend,
    id: i64,
) -> Result<DeleteRoleOutcome, BackendError> {
    let mut tx = backend.pool.begin().await?;
    let role = sqlx::query_as::<_, RoleRow>(r#"
SELECT
    id,
    guard_name,
    job,
    grade,
    name,
    description,
    created_ts
FROM
    role
WHERE
    id = ?1
        "#)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .map(to_role);
    let role = match role {
        Some(role) => role,
        None => return Ok(DeleteRoleOutcome::NotFound),
    };

    let (count,) = sqlx::query_as::<_, (i64,)>(r#"
SELECT
    COUNT(*)
FROM
    role
WHERE
    job = ?1
        "#)
        .bind(&role.job)
        .fetch_one(&mut *tx)
        .await?;
    if count <= 1 {
        return Ok(DeleteRoleOutcome::LastRole(role));
    }

    sqlx::query("DELETE FROM role_permission WHERE role_id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM user_role WHERE role_id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM role WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(DeleteRoleOutcome::Deleted(role))
}

async fn add_permissions_to_role_sqlite(
    backend: &SqliteBackend,
    role_id: i64,
    grants: &[RoleGrant],
) -> Result<(), BackendError> {
    let mut tx = backend.pool.begin().await?;
    for grant in grants {
        let attributes = serde_json::to_string(&grant.attributes)?;
        sqlx::query(r#"
INSERT INTO role_permission (
    role_id,
    permission_id,
    attributes
)
VALUES ( ?1, ?2, ?3 )
ON CONFLICT(role_id, permission_id) DO UPDATE SET
    attributes = excluded.attributes
            "#)
            .bind(role_id)
            .bind(grant.permission_id)
            .bind(attributes)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

async fn remove_permissions_from_role_sqlite(
    backend: &SqliteBackend,
    role_id: i64,
    permission_ids: &[i64],
) -> Result<(), BackendError> {
    let mut tx = backend.pool.begin().await?;
    for permission_id in permission_ids {
        sqlx::query(r#"
DELETE FROM
    role_permission
WHERE
    role_id = ?1 AND permission_id = ?2
            "#)
            .bind(role_id)
            .bind(*permission_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

async fn get_role_permissions_sqlite(
    backend: &SqliteBackend,
    role_id: i64,
) -> Result<Vec<RolePermission>, BackendError> {
    sqlx::query_as::<_, RolePermissionRow>(r#"
SELECT
    rp.role_id,
    rp.permission_id,
    p.category,
    p.name,
    rp.attributes
FROM
    role_permission AS rp
    JOIN permission AS p ON p.id = rp.permission_id
WHERE
    rp.role_id = ?1
ORDER BY p.category, p.name
        "#)
        .bind(role_id)
        .fetch_all(&*backend.pool)
        .await?
        .into_iter()
        .map(to_role_permission)
        .collect()
}

async fn list_role_permissions_for_job_sqlite(
    backend: &SqliteBackend,
    job: &str,
) -> Result<Vec<RolePermission>, BackendError> {
    sqlx::query_as::<_, RolePermissionRow>(r#"
SELECT
    rp.role_id,
    rp.permission_id,
    p.category,
    p.name,
    rp.attributes
FROM
    role_permission AS rp
    JOIN permission AS p ON p.id = rp.permission_id
    JOIN role AS r ON r.id = rp.role_id
WHERE
    r.job = ?1
ORDER BY rp.role_id, p.category, p.name
        "#)
        .bind(job)
        .fetch_all(&*backend.pool)
        .await?
        .into_iter()
        .map(to_role_permission)
        .collect()
}

async fn grant_role_to_user_sqlite(
    backend: &SqliteBackend,
    user_id: i64,
    role_id: i64,
) -> Result<bool, BackendError> {
    let ts = Utc::now().timestamp();
    let result = sqlx::query(r#"
INSERT INTO user_role (
    user_id,
    role_id,
    created_ts
)
VALUES ( ?1, ?2, ?3 )
ON CONFLICT(user_id, role_id) DO NOTHING
        "#)
        .bind(user_id)
        .bind(role_id)
        .bind(ts)
        .execute(&*backend.pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn revoke_role_from_user_sqlite(
    backend: &SqliteBackend,
    user_id: i64,
    role_id: i64,
) -> Result<bool, BackendError> {
    let result = sqlx::query(r#"
DELETE FROM
    user_role
WHERE
    user_id = ?1 AND role_id = ?2
        "#)
        .bind(user_id)
        .bind(role_id)
        .execute(&*backend.pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn get_roles_for_user_sqlite(
    backend: &SqliteBackend,
    user_id: i64,
) -> Result<Vec<Role>, BackendError> {
    let recs = sqlx::query_as::<_, RoleRow>(r#"
SELECT
    r.id,
    r.guard_name,
    r.job,
    r.grade,
    r.name,
    r.description,
    r.created_ts
FROM
    user_role AS ur
    JOIN role AS r ON r.id = ur.role_id
WHERE
    ur.user_id = ?1
ORDER BY r.job, r.grade
        "#)
        .bind(user_id)
        .fetch_all(&*backend.pool)
        .await?
        .into_iter()
        .map(to_role)
        .collect();
    Ok(recs)
}

async fn get_permissions_for_user_sqlite(
    backend: &SqliteBackend,
    user_id: i64,
) -> Result<Vec<Permission>, BackendError> {
    let recs = sqlx::query_as::<_, (i64, String, String, String)>(r#"
SELECT DISTINCT
    p.id,
    p.category,
    p.name,
    p.guard_name
FROM
    user_role AS ur
    JOIN role_permission AS rp ON rp.role_id = ur.role_id
    JOIN permission AS p ON p.id = rp.permission_id
WHERE
    ur.user_id = ?1
ORDER BY p.category, p.name
        "#)
        .bind(user_id)
        .fetch_all(&*backend.pool)
        .await?
        .into_iter()
        .map(to_permission)
        .collect();
    Ok(recs)
}

#[async_trait]
impl RoleBackend for SqliteBackend {
    async fn add_role(
        &self,
        guard: &GuardName,
        name: &str,
        description: &str,
    ) -> Result<Option<i64>, BackendError> {
        add_role_sqlite(self, guard, name, description).await
    }

    async fn get_role(
        &self,
        id: i64,
    ) -> Result<Option<Role>, BackendError> {
        get_role_sqlite(self, id).await
    }

    async fn get_role_by_guard_name(
        &self,
        guard_name: &str,
    ) -> Result<Option<Role>, BackendError> {
        get_role_by_guard_name_sqlite(self, guard_name).await
    }

    async fn list_roles_for_job(
        &self,
        job: &str,
    ) -> Result<Vec<Role>, BackendError> {
        list_roles_for_job_sqlite(self, job).await
    }

    async fn count_roles(
        &self,
        prefix: &str,
    ) -> Result<i64, BackendError> {
        count_roles_sqlite(self, prefix).await
    }

    async fn delete_role(
        &self,
        id: i64,
    ) -> Result<DeleteRoleOutcome, BackendError> {
        delete_role_sqlite(self, id).await
    }

    async fn add_permissions_to_role(
        &self,
        role_id: i64,
        grants: &[RoleGrant],
    ) -> Result<(), BackendError> {
        add_permissions_to_role_sqlite(self, role_id, grants).await
    }

    async fn remove_permissions_from_role(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> Result<(), BackendError> {
        remove_permissions_from_role_sqlite(self, role_id, permission_ids).await
    }

    async fn get_role_permissions(
        &self,
        role_id: i64,
    ) -> Result<Vec<RolePermission>, BackendError> {
        get_role_permissions_sqlite(self, role_id).await
    }

    async fn list_role_permissions_for_job(
        &self,
        job: &str,
    ) -> Result<Vec<RolePermission>, BackendError> {
        list_role_permissions_for_job_sqlite(self, job).await
    }

    async fn grant_role_to_user(
        &self,
        user_id: i64,
        role_id: i64,
    ) -> Result<bool, BackendError> {
        grant_role_to_user_sqlite(self, user_id, role_id).await
    }

    async fn revoke_role_from_user(
        &self,
        user_id: i64,
        role_id: i64,
    ) -> Result<bool, BackendError> {
        revoke_role_from_user_sqlite(self, user_id, role_id).await
    }

    async fn get_roles_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<Role>, BackendError> {
        get_roles_for_user_sqlite(self, user_id).await
    }

    async fn get_permissions_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<Permission>, BackendError> {
        get_permissions_for_user_sqlite(self, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use jobcore::{
        perms::{
            AttributeValues,
            StringList,
        },
        role::{
            DeleteRoleOutcome,
            GuardName,
            RoleGrant,
        },
        traits::{
            PermissionBackend,
            RoleBackend,
        },
    };
    use crate::impls::tests::backend;

    #[async_std::test]
    async fn add_get_role() -> anyhow::Result<()> {
        let backend = backend().await?;
        let guard = GuardName::new("ambulance", 1);
        let id = backend.add_role(&guard, "Paramedic", "").await?
            .expect("role is new");
        assert_eq!(backend.add_role(&guard, "Paramedic", "again").await?, None);

        let role = backend.get_role(id).await?
            .expect("role exists");
        assert_eq!(role.guard_name, "job-ambulance-1");
        assert_eq!(role.job, "ambulance");
        assert_eq!(role.grade, 1);
        assert_eq!(role.created_ts, 1234567890);
        assert_eq!(role.guard(), guard);
        assert_eq!(
            backend.get_role_by_guard_name("job-ambulance-1").await?,
            Some(role),
        );
        assert_eq!(backend.get_role_by_guard_name("job-ambulance-2").await?, None);
        Ok(())
    }

    #[async_std::test]
    async fn count_and_delete() -> anyhow::Result<()> {
        let backend = backend().await?;
        let a1 = backend.add_role(&GuardName::new("ambulance", 1), "", "").await?
            .expect("role is new");
        let a2 = backend.add_role(&GuardName::new("ambulance", 2), "", "").await?
            .expect("role is new");
        backend.add_role(&GuardName::new("police", 0), "", "").await?;

        assert_eq!(backend.count_roles("job-ambulance-").await?, 2);
        assert_eq!(backend.count_roles("job-").await?, 3);
        assert_eq!(backend.list_roles_for_job("ambulance").await?.len(), 2);

        assert!(matches!(
            backend.delete_role(a1).await?,
            DeleteRoleOutcome::Deleted(role) if role.id == a1,
        ));
        assert_eq!(backend.count_roles("job-ambulance-").await?, 1);
        assert!(matches!(
            backend.delete_role(a2).await?,
            DeleteRoleOutcome::LastRole(role) if role.id == a2,
        ));
        assert_eq!(backend.count_roles("job-ambulance-").await?, 1);
        assert_eq!(backend.delete_role(a1).await?, DeleteRoleOutcome::NotFound);
        Ok(())
    }

    #[async_std::test]
    async fn role_permissions() -> anyhow::Result<()> {
        let backend = backend().await?;
        let list = backend.sync_permission("Conduct", "ListEntries").await?;
        let create = backend.sync_permission("Conduct", "CreateEntry").await?;
        let role_id = backend.add_role(&GuardName::new("ambulance", 1), "", "").await?
            .expect("role is new");

        let own = AttributeValues::StringList(StringList::from_iter(["Own"]));
        backend.add_permissions_to_role(role_id, &[
            RoleGrant::new(list).attribute("Access", own.clone()),
            RoleGrant::new(create),
        ]).await?;
        let perms = backend.get_role_permissions(role_id).await?;
        assert_eq!(perms.len(), 2);
        assert_eq!(perms[0].name, "CreateEntry");
        assert!(perms[0].attributes.is_empty());
        assert_eq!(perms[1].attributes.get("Access"), Some(&own));

        // granting again replaces the attributes
        let any = AttributeValues::StringList(StringList::from_iter(["Any"]));
        backend.add_permissions_to_role(role_id, &[
            RoleGrant::new(list).attribute("Access", any.clone()),
        ]).await?;
        let perms = backend.list_role_permissions_for_job("ambulance").await?;
        assert_eq!(perms.len(), 2);
        assert_eq!(perms[1].attributes.get("Access"), Some(&any));

        backend.remove_permissions_from_role(role_id, &[create]).await?;
        let perms = backend.get_role_permissions(role_id).await?;
        assert_eq!(perms.len(), 1);
        assert!(perms[0].matches("Conduct", "ListEntries"));
        assert!(backend.list_role_permissions_for_job("police").await?.is_empty());
        Ok(())
    }

    #[async_std::test]
    async fn user_roles() -> anyhow::Result<()> {
        let backend = backend().await?;
        let get_user = backend.sync_permission("JobsService", "GetUser.ambulance").await?;
        let list = backend.sync_permission("Conduct", "ListEntries").await?;
        let r1 = backend.add_role(&GuardName::new("ambulance", 1), "", "").await?
            .expect("role is new");
        let r2 = backend.add_role(&GuardName::new("police", 1), "", "").await?
            .expect("role is new");
        backend.add_permissions_to_role(r1, &[RoleGrant::new(get_user), RoleGrant::new(list)]).await?;
        backend.add_permissions_to_role(r2, &[RoleGrant::new(list)]).await?;

        assert!(backend.grant_role_to_user(7, r1).await?);
        assert!(!backend.grant_role_to_user(7, r1).await?);
        assert!(backend.grant_role_to_user(7, r2).await?);

        let roles = backend.get_roles_for_user(7).await?;
        assert_eq!(roles.iter().map(|r| r.id).collect::<Vec<_>>(), vec![r1, r2]);

        // distinct, despite two roles granting ListEntries
        let perms = backend.get_permissions_for_user(7).await?;
        assert_eq!(
            perms.iter().map(|p| p.guard_name.as_str()).collect::<Vec<_>>(),
            vec!["Conduct.ListEntries", "JobsService.GetUser.ambulance"],
        );

        assert!(backend.revoke_role_from_user(7, r1).await?);
        assert!(!backend.revoke_role_from_user(7, r1).await?);
        assert_eq!(backend.get_permissions_for_user(7).await?.len(), 1);
        assert!(backend.get_roles_for_user(8).await?.is_empty());
        Ok(())
    }
}
