use async_trait::async_trait;
use jobcore::{
    error::BackendError,
    perms::{
        Permission,
        guard_name,
    },
    traits::PermissionBackend,
};

use crate::{
    SqliteBackend,
    chrono::Utc,
};

type PermissionRow = (i64, String, String, String);

pub(crate) fn to_permission(
    (id, category, name, guard_name): PermissionRow,
) -> Permission {
    Permission { id, category, name, guard_name }
}

async fn sync_permission_sqlite(
    backend: &SqliteBackend,
    category: &str,
    name: &str,
) -> Result<i64, BackendError> {
    let ts = Utc::now().timestamp();
    let guard = guard_name(category, name);
    sqlx::query(r#"
INSERT INTO permission (
    category,
    name,
    guard_name,
    created_ts
)
VALUES ( ?1, ?2, ?3, ?4 )
ON CONFLICT(category, name) DO NOTHING
        "#)
        .bind(category)
        .bind(name)
        .bind(&guard)
        .bind(ts)
        .execute(&*backend.pool)
        .await?;
    let (id,) = sqlx::query_as::<_, (i64,)>(r#"
SELECT
    id
FROM
    permission
WHERE
    category = ?1 AND name = ?2
        "#)
        .bind(category)
        .bind(name)
        .fetch_one(&*backend.pool)
        .await?;
    Ok(id)
}

async fn list_permissions_sqlite(
    backend: &SqliteBackend,
) -> Result<Vec<Permission>, BackendError> {
    let recs = sqlx::query_as::<_, PermissionRow>(r#"
SELECT
    id,
    category,
    name,
    guard_name
FROM
    permission
ORDER BY category, name
        "#)
        .fetch_all(&*backend.pool)
        .await?
        .into_iter()
        .map(to_permission)
        .collect();
    Ok(recs)
}

async fn get_permission_by_id_sqlite(
    backend: &SqliteBackend,
    id: i64,
) -> Result<Option<Permission>, BackendError> {
    let rec = sqlx::query_as::<_, PermissionRow>(r#"
SELECT
    id,
    category,
    name,
    guard_name
FROM
    permission
WHERE
    id = ?1
        "#)
        .bind(id)
        .fetch_optional(&*backend.pool)
        .await?
        .map(to_permission);
    Ok(rec)
}

#[async_trait]
impl PermissionBackend for SqliteBackend {
    async fn sync_permission(
        &self,
        category: &str,
        name: &str,
    ) -> Result<i64, BackendError> {
        sync_permission_sqlite(self, category, name).await
    }

    async fn list_permissions(
        &self,
    ) -> Result<Vec<Permission>, BackendError> {
        list_permissions_sqlite(self).await
    }

    async fn get_permission_by_id(
        &self,
        id: i64,
    ) -> Result<Option<Permission>, BackendError> {
        get_permission_by_id_sqlite(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use jobcore::traits::PermissionBackend;
    use crate::impls::tests::backend;

    #[async_std::test]
    async fn sync_is_idempotent() -> anyhow::Result<()> {
        let backend = backend().await?;
        let a = backend.sync_permission("Conduct", "ListEntries").await?;
        let b = backend.sync_permission("Conduct", "CreateEntry").await?;
        assert_ne!(a, b);
        assert_eq!(backend.sync_permission("Conduct", "ListEntries").await?, a);

        let perms = backend.list_permissions().await?;
        assert_eq!(perms.len(), 2);
        // ordered by category then name
        assert_eq!(perms[0].name, "CreateEntry");
        assert_eq!(perms[1].guard_name, "Conduct.ListEntries");

        let perm = backend.get_permission_by_id(a).await?
            .expect("permission exists");
        assert_eq!(perm.category, "Conduct");
        assert_eq!(perm.name, "ListEntries");
        assert_eq!(backend.get_permission_by_id(a + b).await?, None);
        Ok(())
    }
}
