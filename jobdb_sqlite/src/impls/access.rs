use async_trait::async_trait;
use jobcore::{
    access::{
        AccessChanges,
        AccessLevel,
        JobAccess,
        ResourceAccess,
        UserAccess,
        reconcile::reconcile,
    },
    error::BackendError,
    traits::AccessBackend,
};
use sqlx::sqlite::{
    SqliteConnection,
    SqliteExecutor,
    SqliteQueryResult,
};

use crate::SqliteBackend;

fn to_access_level(value: i32) -> Result<AccessLevel, BackendError> {
    AccessLevel::try_from(value)
        .map_err(|_| BackendError::AppInvariantViolation(format!(
            "stored access level {value} is not a valid access level"
        )))
}

async fn fetch_job_access<'e>(
    executor: impl SqliteExecutor<'e>,
    resource: &str,
) -> Result<Vec<JobAccess>, BackendError> {
    sqlx::query_as::<_, (i64, String, String, i32, i32)>(r#"
SELECT
    id,
    resource,
    job,
    minimum_grade,
    access
FROM
    job_access
WHERE
    resource = ?1
ORDER BY id
        "#)
        .bind(resource)
        .fetch_all(executor)
        .await?
        .into_iter()
        .map(|(id, resource, job, minimum_grade, access)| {
            to_access_level(access).map(|access| JobAccess {
                id,
                resource,
                job,
                minimum_grade,
                access,
            })
        })
        .collect()
}

async fn fetch_user_access<'e>(
    executor: impl SqliteExecutor<'e>,
    resource: &str,
) -> Result<Vec<UserAccess>, BackendError> {
    sqlx::query_as::<_, (i64, String, i64, i32)>(r#"
SELECT
    id,
    resource,
    user_id,
    access
FROM
    user_access
WHERE
    resource = ?1
ORDER BY id
        "#)
        .bind(resource)
        .fetch_all(executor)
        .await?
        .into_iter()
        .map(|(id, resource, user_id, access)| {
            to_access_level(access).map(|access| UserAccess {
                id,
                resource,
                user_id,
                access,
            })
        })
        .collect()
}

async fn fetch_resource_access<'e>(
    executor: impl SqliteExecutor<'e>,
    resource: &str,
) -> Result<Vec<ResourceAccess>, BackendError> {
    sqlx::query_as::<_, (i64, String, String, i32)>(r#"
SELECT
    id,
    resource,
    target_resource,
    access
FROM
    resource_access
WHERE
    resource = ?1
ORDER BY id
        "#)
        .bind(resource)
        .fetch_all(executor)
        .await?
        .into_iter()
        .map(|(id, resource, target_resource, access)| {
            to_access_level(access).map(|access| ResourceAccess {
                id,
                resource,
                target_resource,
                access,
            })
        })
        .collect()
}

fn expect_one(
    result: SqliteQueryResult,
    table: &str,
    id: i64,
    resource: &str,
) -> Result<(), BackendError> {
    match result.rows_affected() {
        1 => Ok(()),
        _ => Err(BackendError::AppInvariantViolation(format!(
            "{table} entry {id} of {resource} no longer exists"
        ))),
    }
}

// Changes are applied as delete, update then insert, and only to rows
// belonging to the named resource.

async fn write_job_access(
    conn: &mut SqliteConnection,
    resource: &str,
    changes: &AccessChanges<JobAccess>,
) -> Result<(), BackendError> {
    for entry in changes.to_delete.iter() {
        let result = sqlx::query("DELETE FROM job_access WHERE id = ?1 AND resource = ?2")
            .bind(entry.id)
            .bind(resource)
            .execute(&mut *conn)
            .await?;
        expect_one(result, "job_access", entry.id, resource)?;
    }
    for entry in changes.to_update.iter() {
        let result = sqlx::query(r#"
UPDATE
    job_access
SET
    minimum_grade = ?1,
    access = ?2
WHERE
    id = ?3 AND resource = ?4
            "#)
            .bind(entry.minimum_grade)
            .bind(i32::from(entry.access))
            .bind(entry.id)
            .bind(resource)
            .execute(&mut *conn)
            .await?;
        expect_one(result, "job_access", entry.id, resource)?;
    }
    for entry in changes.to_create.iter() {
        sqlx::query(r#"
INSERT INTO job_access (
    resource,
    job,
    minimum_grade,
    access
)
VALUES ( ?1, ?2, ?3, ?4 )
            "#)
            .bind(resource)
            .bind(&entry.job)
            .bind(entry.minimum_grade)
            .bind(i32::from(entry.access))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn write_user_access(
    conn: &mut SqliteConnection,
    resource: &str,
    changes: &AccessChanges<UserAccess>,
) -> Result<(), BackendError> {
    for entry in changes.to_delete.iter() {
        let result = sqlx::query("DELETE FROM user_access WHERE id = ?1 AND resource = ?2")
            .bind(entry.id)
            .bind(resource)
            .execute(&mut *conn)
            .await?;
        expect_one(result, "user_access", entry.id, resource)?;
    }
    for entry in changes.to_update.iter() {
        let result = sqlx::query(r#"
UPDATE
    user_access
SET
    access = ?1
WHERE
    id = ?2 AND resource = ?3
            "#)
            .bind(i32::from(entry.access))
            .bind(entry.id)
            .bind(resource)
            .execute(&mut *conn)
            .await?;
        expect_one(result, "user_access", entry.id, resource)?;
    }
    for entry in changes.to_create.iter() {
        sqlx::query(r#"
INSERT INTO user_access (
    resource,
    user_id,
    access
)
VALUES ( ?1, ?2, ?3 )
            "#)
            .bind(resource)
            .bind(entry.user_id)
            .bind(i32::from(entry.access))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn write_resource_access(
    conn: &mut SqliteConnection,
    resource: &str,
    changes: &AccessChanges<ResourceAccess>,
) -> Result<(), BackendError> {
    for entry in changes.to_delete.iter() {
        let result = sqlx::query("DELETE FROM resource_access WHERE id = ?1 AND resource = ?2")
            .bind(entry.id)
            .bind(resource)
            .execute(&mut *conn)
            .await?;
        expect_one(result, "resource_access", entry.id, resource)?;
    }
    for entry in changes.to_update.iter() {
        let result = sqlx::query(r#"
UPDATE
    resource_access
SET
    access = ?1
WHERE
    id = ?2 AND resource = ?3
            "#)
            .bind(i32::from(entry.access))
            .bind(entry.id)
            .bind(resource)
            .execute(&mut *conn)
            .await?;
        expect_one(result, "resource_access", entry.id, resource)?;
    }
    for entry in changes.to_create.iter() {
        sqlx::query(r#"
INSERT INTO resource_access (
    resource,
    target_resource,
    access
)
VALUES ( ?1, ?2, ?3 )
            "#)
            .bind(resource)
            .bind(&entry.target_resource)
            .bind(i32::from(entry.access))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn apply_job_access_sqlite(
    backend: &SqliteBackend,
    resource: &str,
    changes: &AccessChanges<JobAccess>,
) -> Result<(), BackendError> {
    let mut tx = backend.pool.begin().await?;
    write_job_access(&mut *tx, resource, changes).await?;
    tx.commit().await?;
    Ok(())
}

async fn set_job_access_sqlite(
    backend: &SqliteBackend,
    resource: &str,
    desired: &[JobAccess],
) -> Result<AccessChanges<JobAccess>, BackendError> {
    let mut tx = backend.pool.begin().await?;
    let current = fetch_job_access(&mut *tx, resource).await?;
    let changes = reconcile(&current, desired);
    if !changes.is_empty() {
        write_job_access(&mut *tx, resource, &changes).await?;
    }
    tx.commit().await?;
    Ok(changes)
}

async fn apply_user_access_sqlite(
    backend: &SqliteBackend,
    resource: &str,
    changes: &AccessChanges<UserAccess>,
) -> Result<(), BackendError> {
    let mut tx = backend.pool.begin().await?;
    write_user_access(&mut *tx, resource, changes).await?;
    tx.commit().await?;
    Ok(())
}

async fn set_user_access_sqlite(
    backend: &SqliteBackend,
    resource: &str,
    desired: &[UserAccess],
) -> Result<AccessChanges<UserAccess>, BackendError> {
    let mut tx = backend.pool.begin().await?;
    let current = fetch_user_access(&mut *tx, resource).await?;
    let changes = reconcile(&current, desired);
    if !changes.is_empty() {
        write_user_access(&mut *tx, resource, &changes).await?;
    }
    tx.commit().await?;
    Ok(changes)
}

async fn apply_resource_access_sqlite(
    backend: &SqliteBackend,
    resource: &str,
    changes: &AccessChanges<ResourceAccess>,
) -> Result<(), BackendError> {
    let mut tx = backend.pool.begin().await?;
    write_resource_access(&mut *tx, resource, changes).await?;
    tx.commit().await?;
    Ok(())
}

async fn set_resource_access_sqlite(
    backend: &SqliteBackend,
    resource: &str,
    desired: &[ResourceAccess],
) -> Result<AccessChanges<ResourceAccess>, BackendError> {
    let mut tx = backend.pool.begin().await?;
    let current = fetch_resource_access(&mut *tx, resource).await?;
    let changes = reconcile(&current, desired);
    if !changes.is_empty() {
        write_resource_access(&mut *tx, resource, &changes).await?;
    }
    tx.commit().await?;
    Ok(changes)
}

#[async_trait]
impl AccessBackend for SqliteBackend {
    async fn get_job_access(
        &self,
        resource: &str,
    ) -> Result<Vec<JobAccess>, BackendError> {
        fetch_job_access(&*self.pool, resource).await
    }

    async fn get_user_access(
        &self,
        resource: &str,
    ) -> Result<Vec<UserAccess>, BackendError> {
        fetch_user_access(&*self.pool, resource).await
    }

    async fn get_resource_access(
        &self,
        resource: &str,
    ) -> Result<Vec<ResourceAccess>, BackendError> {
        fetch_resource_access(&*self.pool, resource).await
    }

    async fn apply_job_access(
        &self,
        resource: &str,
        changes: &AccessChanges<JobAccess>,
    ) -> Result<(), BackendError> {
        apply_job_access_sqlite(self, resource, changes).await
    }

    async fn apply_user_access(
        &self,
        resource: &str,
        changes: &AccessChanges<UserAccess>,
    ) -> Result<(), BackendError> {
        apply_user_access_sqlite(self, resource, changes).await
    }

    async fn apply_resource_access(
        &self,
        resource: &str,
        changes: &AccessChanges<ResourceAccess>,
    ) -> Result<(), BackendError> {
        apply_resource_access_sqlite(self, resource, changes).await
    }

    async fn set_job_access(
        &self,
        resource: &str,
        desired: &[JobAccess],
    ) -> Result<AccessChanges<JobAccess>, BackendError> {
        set_job_access_sqlite(self, resource, desired).await
    }

    async fn set_user_access(
        &self,
        resource: &str,
        desired: &[UserAccess],
    ) -> Result<AccessChanges<UserAccess>, BackendError> {
        set_user_access_sqlite(self, resource, desired).await
    }

    async fn set_resource_access(
        &self,
        resource: &str,
        desired: &[ResourceAccess],
    ) -> Result<AccessChanges<ResourceAccess>, BackendError> {
        set_resource_access_sqlite(self, resource, desired).await
    }
}
