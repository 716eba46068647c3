use async_trait::async_trait;
use jobcore::{
    access::{
        AccessChanges,
        JobAccess,
        ResourceAccess,
        UserAccess,
    },
    error::BackendError,
    perms::Permission,
    platform::{
        DefaultPermsPlatform,
        PlatformUrl,
    },
    role::{
        DeleteRoleOutcome,
        GuardName,
        Role,
        RoleGrant,
        RolePermission,
    },
    traits::{
        AccessBackend,
        PermissionBackend,
        RoleBackend,
    },
};
use mockall::mock;

mock! {
    pub Platform {}

    #[async_trait]
    impl PermissionBackend for Platform {
        async fn sync_permission(&self, category: &str, name: &str) -> Result<i64, BackendError>;
        async fn list_permissions(&self) -> Result<Vec<Permission>, BackendError>;
        async fn get_permission_by_id(&self, id: i64) -> Result<Option<Permission>, BackendError>;
    }

    #[async_trait]
    impl RoleBackend for Platform {
        async fn add_role(&self, guard: &GuardName, name: &str, description: &str) -> Result<Option<i64>, BackendError>;
        async fn get_role(&self, id: i64) -> Result<Option<Role>, BackendError>;
        async fn get_role_by_guard_name(&self, guard_name: &str) -> Result<Option<Role>, BackendError>;
        async fn list_roles_for_job(&self, job: &str) -> Result<Vec<Role>, BackendError>;
        async fn count_roles(&self, prefix: &str) -> Result<i64, BackendError>;
        async fn delete_role(&self, id: i64) -> Result<DeleteRoleOutcome, BackendError>;
        async fn add_permissions_to_role(&self, role_id: i64, grants: &[RoleGrant]) -> Result<(), BackendError>;
        async fn remove_permissions_from_role(&self, role_id: i64, permission_ids: &[i64]) -> Result<(), BackendError>;
        async fn get_role_permissions(&self, role_id: i64) -> Result<Vec<RolePermission>, BackendError>;
        async fn list_role_permissions_for_job(&self, job: &str) -> Result<Vec<RolePermission>, BackendError>;
        async fn grant_role_to_user(&self, user_id: i64, role_id: i64) -> Result<bool, BackendError>;
        async fn revoke_role_from_user(&self, user_id: i64, role_id: i64) -> Result<bool, BackendError>;
        async fn get_roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, BackendError>;
        async fn get_permissions_for_user(&self, user_id: i64) -> Result<Vec<Permission>, BackendError>;
    }

    #[async_trait]
    impl AccessBackend for Platform {
        async fn get_job_access(&self, resource: &str) -> Result<Vec<JobAccess>, BackendError>;
        async fn get_user_access(&self, resource: &str) -> Result<Vec<UserAccess>, BackendError>;
        async fn get_resource_access(&self, resource: &str) -> Result<Vec<ResourceAccess>, BackendError>;
        async fn apply_job_access(&self, resource: &str, changes: &AccessChanges<JobAccess>) -> Result<(), BackendError>;
        async fn apply_user_access(&self, resource: &str, changes: &AccessChanges<UserAccess>) -> Result<(), BackendError>;
        async fn apply_resource_access(&self, resource: &str, changes: &AccessChanges<ResourceAccess>) -> Result<(), BackendError>;
        async fn set_job_access(&self, resource: &str, desired: &[JobAccess]) -> Result<AccessChanges<JobAccess>, BackendError>;
        async fn set_user_access(&self, resource: &str, desired: &[UserAccess]) -> Result<AccessChanges<UserAccess>, BackendError>;
        async fn set_resource_access(&self, resource: &str, desired: &[ResourceAccess]) -> Result<AccessChanges<ResourceAccess>, BackendError>;
    }

    impl PlatformUrl for Platform {
        fn url(&self) -> &str;
    }
}

impl DefaultPermsPlatform for MockPlatform {}
