use async_trait::async_trait;
use crate::{
    access::{
        AccessChanges,
        JobAccess,
        ResourceAccess,
        UserAccess,
    },
    error::BackendError,
    perms::Permission,
    role::{
        DeleteRoleOutcome,
        GuardName,
        Role,
        RoleGrant,
        RolePermission,
    },
};

#[async_trait]
pub trait PermissionBackend {
    /// Ensures the permission exists, returning its id.
    async fn sync_permission(
        &self,
        category: &str,
        name: &str,
    ) -> Result<i64, BackendError>;
    async fn list_permissions(
        &self,
    ) -> Result<Vec<Permission>, BackendError>;
    async fn get_permission_by_id(
        &self,
        id: i64,
    ) -> Result<Option<Permission>, BackendError>;
}

#[async_trait]
pub trait RoleBackend {
    /// Returns `None` if a role with the same guard name already exists.
    async fn add_role(
        &self,
        guard: &GuardName,
        name: &str,
        description: &str,
    ) -> Result<Option<i64>, BackendError>;
    async fn get_role(
        &self,
        id: i64,
    ) -> Result<Option<Role>, BackendError>;
    async fn get_role_by_guard_name(
        &self,
        guard_name: &str,
    ) -> Result<Option<Role>, BackendError>;
    async fn list_roles_for_job(
        &self,
        job: &str,
    ) -> Result<Vec<Role>, BackendError>;
    /// Counts the roles whose guard name starts with `prefix`.  This is
    /// a plain string match: `job-fire-` also counts `job-fire-dept-0`
    /// as job names may contain dashes; use `list_roles_for_job` to
    /// count the roles of exactly one job.
    async fn count_roles(
        &self,
        prefix: &str,
    ) -> Result<i64, BackendError>;
    /// Deletes the role unless it is the last one of its job; the check
    /// and the removal happen within the same transaction.
    async fn delete_role(
        &self,
        id: i64,
    ) -> Result<DeleteRoleOutcome, BackendError>;
    /// Grants (or replaces the attributes of) every permission listed.
    async fn add_permissions_to_role(
        &self,
        role_id: i64,
        grants: &[RoleGrant],
    ) -> Result<(), BackendError>;
    async fn remove_permissions_from_role(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> Result<(), BackendError>;
    async fn get_role_permissions(
        &self,
        role_id: i64,
    ) -> Result<Vec<RolePermission>, BackendError>;
    /// Every grant of every role belonging to the job.
    async fn list_role_permissions_for_job(
        &self,
        job: &str,
    ) -> Result<Vec<RolePermission>, BackendError>;
    async fn grant_role_to_user(
        &self,
        user_id: i64,
        role_id: i64,
    ) -> Result<bool, BackendError>;
    async fn revoke_role_from_user(
        &self,
        user_id: i64,
        role_id: i64,
    ) -> Result<bool, BackendError>;
    async fn get_roles_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<Role>, BackendError>;
    /// The distinct permissions granted to the user through every role
    /// assigned to them.
    async fn get_permissions_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<Permission>, BackendError>;
}

#[async_trait]
pub trait AccessBackend {
    async fn get_job_access(
        &self,
        resource: &str,
    ) -> Result<Vec<JobAccess>, BackendError>;
    async fn get_user_access(
        &self,
        resource: &str,
    ) -> Result<Vec<UserAccess>, BackendError>;
    async fn get_resource_access(
        &self,
        resource: &str,
    ) -> Result<Vec<ResourceAccess>, BackendError>;
    /// Applies all three sets of changes within a single transaction.
    /// Every update and deletion must hit exactly one stored entry of
    /// the resource, otherwise nothing is applied.
    async fn apply_job_access(
        &self,
        resource: &str,
        changes: &AccessChanges<JobAccess>,
    ) -> Result<(), BackendError>;
    async fn apply_user_access(
        &self,
        resource: &str,
        changes: &AccessChanges<UserAccess>,
    ) -> Result<(), BackendError>;
    async fn apply_resource_access(
        &self,
        resource: &str,
        changes: &AccessChanges<ResourceAccess>,
    ) -> Result<(), BackendError>;
    /// Reconciles the stored entries of the resource against the desired
    /// ones and applies the result, reading and writing within the same
    /// transaction.  Returns the changes that were applied.
    async fn set_job_access(
        &self,
        resource: &str,
        desired: &[JobAccess],
    ) -> Result<AccessChanges<JobAccess>, BackendError>;
    async fn set_user_access(
        &self,
        resource: &str,
        desired: &[UserAccess],
    ) -> Result<AccessChanges<UserAccess>, BackendError>;
    async fn set_resource_access(
        &self,
        resource: &str,
        desired: &[ResourceAccess],
    ) -> Result<AccessChanges<ResourceAccess>, BackendError>;
}

/// Answers grant questions for a single caller.
pub trait Enforcer {
    type Error;

    fn can(&self, category: &str, name: &str) -> Result<bool, Self::Error>;
}
