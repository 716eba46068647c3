use jobcore::{
    access::{
        AccessChanges,
        AccessEntry,
        AccessLevel,
        JobAccess,
        ResourceAccess,
        UserAccess,
        reconcile::find_duplicate,
    },
    error::BackendError,
    identity::{
        CallerIdentity,
        TargetActor,
    },
    perms::{
        AttributeValues,
        JobGradeList,
        Permission,
        StringList,
        PERM_ANY,
        genpolicy::GrantPolicy,
        guard_name,
    },
    platform::PermsPlatform,
    role::{
        DeleteRoleOutcome,
        GuardName,
        Role,
        RoleGrant,
        RolePermission,
    },
    traits::{
        AccessBackend,
        Enforcer as _,
        PermissionBackend,
        RoleBackend,
    },
};
use jobrbac::{
    Enforcer,
    PolicyEnforcer,
    access_level::{
        check_access,
        check_resource_access,
    },
    method::{
        RemapTable,
        ResolvedPerm,
        resolve_permission,
    },
};
use std::{
    collections::BTreeMap,
    str::FromStr,
    sync::Arc,
};

use crate::{
    cache::{
        JobSnapshot,
        PermsCache,
    },
    error::{
        Error,
        InvalidRequestError,
    },
    registry::Registry,
};

use super::*;

impl Builder {
    pub fn new() -> Self {
        Self {
            rbac_builder: RbacBuilder::new(),
            .. Default::default()
        }
    }

    pub fn perms_platform(mut self, val: impl PermsPlatform + 'static) -> Self {
        self.perms_platform = Some(Box::new(val));
        self
    }

    pub fn boxed_perms_platform(mut self, val: Box<dyn PermsPlatform>) -> Self {
        self.perms_platform = Some(val);
        self
    }

    pub fn registry(mut self, val: Registry) -> Self {
        self.registry = val;
        self
    }

    pub fn rbac_builder(mut self, val: RbacBuilder) -> Self {
        self.rbac_builder = val;
        self
    }

    pub fn build(self) -> Result<Platform, Error> {
        Ok(Platform(Arc::new(PlatformInner {
            perms_platform: self.perms_platform
                .ok_or(Error::Misconfiguration("missing required argument perms_platform"))?,
            registry: self.registry,
            cache: PermsCache::new(),
            rbac_builder: self.rbac_builder,
        })))
    }
}

impl Platform {
    pub fn perms_platform(&self) -> &dyn PermsPlatform {
        self.0.perms_platform.as_ref()
    }

    pub fn registry(&self) -> &Registry {
        &self.0.registry
    }

    pub fn cache(&self) -> &PermsCache {
        &self.0.cache
    }
}

fn invariant(msg: String) -> Error {
    BackendError::AppInvariantViolation(msg).into()
}

// Permission catalog

impl Platform {
    /// Ensures every registered permission is stored, returning the
    /// stored rows of the registered permissions.
    pub async fn sync_permissions(&self) -> Result<Vec<Permission>, Error> {
        for def in self.0.registry.iter() {
            self.0.perms_platform.sync_permission(&def.category, &def.name).await?;
        }
        let permissions = self.0.perms_platform.list_permissions().await?
            .into_iter()
            .filter(|perm| self.0.registry.lookup(&perm.category, &perm.name).is_some())
            .collect::<Vec<_>>();
        log::info!("synchronized {} permission(s)", permissions.len());
        Ok(permissions)
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permission>, Error> {
        Ok(self.0.perms_platform.list_permissions().await?)
    }

    async fn grantable_permission(&self, id: i64) -> Result<Permission, Error> {
        let permission = self.0.perms_platform.get_permission_by_id(id).await?
            .ok_or_else(|| InvalidRequestError::UnknownPermission(id.to_string()))?;
        if permission.is_ignored() {
            log::warn!("refusing to change grants of {}", permission.guard_name);
            return Err(InvalidRequestError::IgnoredPermission(permission.guard_name).into());
        }
        Ok(permission)
    }

    fn validate_attributes(
        &self,
        permission: &Permission,
        attributes: &BTreeMap<String, AttributeValues>,
    ) -> Result<(), Error> {
        for (key, value) in attributes.iter() {
            let attr = self.0.registry
                .attr(&permission.category, &permission.name, key)
                .ok_or_else(|| InvalidRequestError::UnknownAttribute {
                    permission: permission.guard_name.clone(),
                    key: key.clone(),
                })?;
            value.validate(attr.value_type, attr.valid_values.as_ref())
                .map_err(|source| InvalidRequestError::InvalidAttribute {
                    key: key.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

// Grant evaluation

impl Platform {
    async fn snapshot(&self, job: &str) -> Result<Arc<JobSnapshot>, Error> {
        if let Some(snapshot) = self.0.cache.get(job) {
            return Ok(snapshot);
        }
        let generation = self.0.cache.generation();
        let grants = self.0.perms_platform.list_role_permissions_for_job(job).await?;
        log::debug!("loaded {} grant(s) for job {job:?}", grants.len());
        Ok(self.0.cache.insert(job, generation, JobSnapshot::new(grants)))
    }

    /// The caller together with every grant of the roles it holds in
    /// its own job.
    pub async fn generate_policy(
        &self,
        identity: &CallerIdentity,
    ) -> Result<GrantPolicy, Error> {
        Ok(self.snapshot(&identity.job).await?.policy_for(identity))
    }

    /// An enforcer for repeated checks on behalf of the caller, built
    /// by the configured enforcer builder.
    pub async fn enforcer(
        &self,
        identity: &CallerIdentity,
    ) -> Result<Box<Enforcer>, Error> {
        Ok(self.0.rbac_builder
            .build_with_policy(self.generate_policy(identity).await?)
            .await?)
    }

    pub async fn can(
        &self,
        identity: &CallerIdentity,
        category: &str,
        name: &str,
    ) -> Result<bool, Error> {
        if identity.superuser || name == PERM_ANY {
            log::trace!("{identity} can {category}.{name}: bypassed");
            return Ok(true);
        }
        let enforcer = PolicyEnforcer::from(self.generate_policy(identity).await?);
        Ok(enforcer.can(category, name)?)
    }

    /// Resolves the value of the attribute for the caller.
    ///
    /// Values granted by every held role are merged.  Without any such
    /// grant the default values apply, except for superusers who
    /// receive the valid values where those are declared.
    pub async fn attr(
        &self,
        identity: &CallerIdentity,
        category: &str,
        name: &str,
        key: &str,
    ) -> Result<AttributeValues, Error> {
        let attr = self.0.registry.lookup(category, name)
            .ok_or_else(|| InvalidRequestError::UnknownPermission(guard_name(category, name)))?
            .get_attr(key)
            .ok_or_else(|| InvalidRequestError::UnknownAttribute {
                permission: guard_name(category, name),
                key: key.to_string(),
            })?;
        let enforcer = PolicyEnforcer::from(self.generate_policy(identity).await?);
        let value = match enforcer.attr(category, name, attr) {
            Some(value) => value,
            None if identity.superuser => attr.valid_values
                .clone()
                .filter(|valid| !valid.is_empty())
                .unwrap_or_else(|| attr.default_or_empty()),
            None => attr.default_or_empty(),
        };
        log::trace!("{identity} attr {category}.{name}.{key}: {value:?}");
        Ok(value)
    }

    pub async fn attr_string_list(
        &self,
        identity: &CallerIdentity,
        category: &str,
        name: &str,
        key: &str,
    ) -> Result<StringList, Error> {
        Ok(self.attr(identity, category, name, key).await?.into_string_list()?)
    }

    pub async fn attr_job_list(
        &self,
        identity: &CallerIdentity,
        category: &str,
        name: &str,
        key: &str,
    ) -> Result<StringList, Error> {
        Ok(self.attr(identity, category, name, key).await?.into_job_list()?)
    }

    pub async fn attr_job_grade_list(
        &self,
        identity: &CallerIdentity,
        category: &str,
        name: &str,
        key: &str,
    ) -> Result<JobGradeList, Error> {
        Ok(self.attr(identity, category, name, key).await?.into_job_grade_list()?)
    }

    /// Checks the caller against the target using the rank levels held
    /// in the `StringList` attribute of the permission.
    pub async fn check_attr_access(
        &self,
        identity: &CallerIdentity,
        category: &str,
        name: &str,
        key: &str,
        target_job: &str,
        target: Option<&TargetActor>,
    ) -> Result<bool, Error> {
        let levels = self.attr_string_list(identity, category, name, key).await?;
        Ok(check_access(levels.strings.as_slice(), identity, target_job, target))
    }

    /// Decides whether the caller may invoke the method.
    ///
    /// Any failure, including a malformed method or a missing caller,
    /// results in an error; only `Ok(())` permits the call.
    pub async fn authorize(
        &self,
        identity: Option<&CallerIdentity>,
        method: &str,
        remap: Option<&RemapTable>,
    ) -> Result<(), Error> {
        let resolved = resolve_permission(method, remap)
            .map_err(|e| {
                log::warn!("rejecting call to {method:?}: {e}");
                Error::PermissionDenied
            })?;
        let allowed = match (resolved, identity) {
            (ResolvedPerm::Any, _) => true,
            (_, None) => {
                log::debug!("rejecting call to {method:?} without a caller");
                false
            }
            (ResolvedPerm::Superuser, Some(identity)) => identity.superuser,
            (ResolvedPerm::Key(key), Some(identity)) => {
                self.can(identity, &key.category, &key.name).await?
            }
        };
        if allowed {
            Ok(())
        } else {
            log::debug!("permission denied for call to {method:?}");
            Err(Error::PermissionDenied)
        }
    }
}

// Role management

impl Platform {
    pub async fn create_role_with_guard(
        &self,
        name: &str,
        guard_name: &str,
        description: &str,
    ) -> Result<Role, Error> {
        let guard = GuardName::from_str(guard_name)
            .map_err(|_| InvalidRequestError::MalformedGuardName(guard_name.to_string()))?;
        let id = self.0.perms_platform.add_role(&guard, name, description).await?
            .ok_or_else(|| InvalidRequestError::AlreadyExists(guard.to_string()))?;
        self.0.cache.invalidate(&guard.job);
        log::info!("created role {id} ({guard})");
        self.0.perms_platform.get_role(id).await?
            .ok_or_else(|| invariant(format!("role {id} missing after creation")))
    }

    /// Creates the rank ladder role of the job at the grade.
    pub async fn create_role(
        &self,
        job: &str,
        grade: i32,
    ) -> Result<Role, Error> {
        let guard = GuardName::new(job, grade).to_string();
        self.create_role_with_guard(&guard, &guard, "").await
    }

    pub async fn get_role(
        &self,
        id: i64,
    ) -> Result<Option<Role>, Error> {
        Ok(self.0.perms_platform.get_role(id).await?)
    }

    pub async fn get_role_by_guard_name(
        &self,
        guard_name: &str,
    ) -> Result<Option<Role>, Error> {
        Ok(self.0.perms_platform.get_role_by_guard_name(guard_name).await?)
    }

    pub async fn list_roles(
        &self,
        job: &str,
    ) -> Result<Vec<Role>, Error> {
        Ok(self.0.perms_platform.list_roles_for_job(job).await?)
    }

    /// Counts the roles by guard name prefix; a job prefix such as
    /// `job-fire-` also matches the roles of `fire-dept`.
    pub async fn count_roles(
        &self,
        prefix: &str,
    ) -> Result<i64, Error> {
        Ok(self.0.perms_platform.count_roles(prefix).await?)
    }

    async fn require_role(&self, id: i64) -> Result<Role, Error> {
        Ok(self.get_role(id).await?
            .ok_or(InvalidRequestError::UnknownRole(id))?)
    }

    /// Deletes the role, refusing to delete the last role of a job.
    pub async fn delete_role(
        &self,
        id: i64,
    ) -> Result<Role, Error> {
        match self.0.perms_platform.delete_role(id).await? {
            DeleteRoleOutcome::Deleted(role) => {
                self.0.cache.invalidate(&role.job);
                log::info!("deleted role {id} ({})", role.guard_name);
                Ok(role)
            }
            DeleteRoleOutcome::LastRole(role) => {
                Err(InvalidRequestError::LastRole(role.guard_name))?
            }
            DeleteRoleOutcome::NotFound => {
                Err(InvalidRequestError::UnknownRole(id))?
            }
        }
    }

    /// Grants the permissions to the role.  Nothing is granted if any
    /// of the permissions is unknown, may not be granted, or carries an
    /// invalid attribute value.
    pub async fn add_permissions_to_role(
        &self,
        role_id: i64,
        grants: &[RoleGrant],
    ) -> Result<(), Error> {
        let role = self.require_role(role_id).await?;
        for grant in grants.iter() {
            let permission = self.grantable_permission(grant.permission_id).await?;
            self.validate_attributes(&permission, &grant.attributes)?;
        }
        self.0.perms_platform.add_permissions_to_role(role_id, grants).await?;
        self.0.cache.invalidate(&role.job);
        Ok(())
    }

    pub async fn remove_permissions_from_role(
        &self,
        role_id: i64,
        permission_ids: &[i64],
    ) -> Result<(), Error> {
        let role = self.require_role(role_id).await?;
        for id in permission_ids.iter() {
            self.grantable_permission(*id).await?;
        }
        self.0.perms_platform.remove_permissions_from_role(role_id, permission_ids).await?;
        self.0.cache.invalidate(&role.job);
        Ok(())
    }

    pub async fn get_role_permissions(
        &self,
        role_id: i64,
    ) -> Result<Vec<RolePermission>, Error> {
        Ok(self.0.perms_platform.get_role_permissions(role_id).await?)
    }
}

// Role assignment

impl Platform {
    pub async fn grant_role_to_user(
        &self,
        user_id: i64,
        role_id: i64,
    ) -> Result<bool, Error> {
        self.require_role(role_id).await?;
        Ok(self.0.perms_platform.grant_role_to_user(user_id, role_id).await?)
    }

    pub async fn revoke_role_from_user(
        &self,
        user_id: i64,
        role_id: i64,
    ) -> Result<bool, Error> {
        Ok(self.0.perms_platform.revoke_role_from_user(user_id, role_id).await?)
    }

    pub async fn get_roles_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<Role>, Error> {
        Ok(self.0.perms_platform.get_roles_for_user(user_id).await?)
    }

    /// Builds the identity of a user acting within the job at the
    /// grade, holding the roles assigned to the user in that job along
    /// with the rank ladder role of the grade.
    pub async fn resolve_identity(
        &self,
        user_id: i64,
        job: &str,
        grade: i32,
        superuser: bool,
    ) -> Result<CallerIdentity, Error> {
        let mut roles = self.0.perms_platform.get_roles_for_user(user_id).await?
            .into_iter()
            .filter(|role| role.job == job)
            .map(|role| role.id)
            .collect::<Vec<_>>();
        let ladder = GuardName::new(job, grade).to_string();
        if let Some(role) = self.0.perms_platform.get_role_by_guard_name(&ladder).await? {
            if !roles.contains(&role.id) {
                roles.push(role.id);
            }
        }
        Ok(CallerIdentity::new(user_id, job, grade)
            .superuser(superuser)
            .roles(roles))
    }

    /// The distinct remainders of the guard names of the permissions
    /// granted to the caller that start with the prefix, e.g. the grades
    /// out of `JobsService.GetUser.ambulance.<grade>`.
    ///
    /// Only the grants of the roles held in the caller's own job count,
    /// the same grants `can` consults.
    pub async fn get_suffix_of_permissions_by_prefix_of_user(
        &self,
        identity: &CallerIdentity,
        prefix: &str,
    ) -> Result<Vec<String>, Error> {
        let mut suffixes = self.generate_policy(identity).await?
            .permissions
            .into_iter()
            .filter_map(|perm| guard_name(&perm.category, &perm.name)
                .strip_prefix(prefix)
                .filter(|suffix| !suffix.is_empty())
                .map(str::to_string)
            )
            .collect::<Vec<_>>();
        suffixes.sort();
        suffixes.dedup();
        Ok(suffixes)
    }

    /// The distinct permissions granted through every role explicitly
    /// assigned to the user, regardless of job.
    pub async fn get_permissions_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<Permission>, Error> {
        Ok(self.0.perms_platform.get_permissions_for_user(user_id).await?)
    }
}

// Resource access

fn prepare_entries<T: AccessEntry>(
    resource: &str,
    mut entries: Vec<T>,
) -> Result<Vec<T>, Error> {
    if let Some(i) = find_duplicate(&entries) {
        Err(InvalidRequestError::DuplicateAccessEntry(i))?
    }
    entries.iter_mut()
        .for_each(|entry| entry.set_resource(resource));
    Ok(entries)
}

fn log_changes<T>(resource: &str, changes: &AccessChanges<T>) {
    log::debug!(
        "access for {resource}: {} created, {} updated, {} deleted",
        changes.to_create.len(),
        changes.to_update.len(),
        changes.to_delete.len(),
    );
}

impl Platform {
    pub async fn get_job_access(
        &self,
        resource: &str,
    ) -> Result<Vec<JobAccess>, Error> {
        Ok(self.0.perms_platform.get_job_access(resource).await?)
    }

    pub async fn get_user_access(
        &self,
        resource: &str,
    ) -> Result<Vec<UserAccess>, Error> {
        Ok(self.0.perms_platform.get_user_access(resource).await?)
    }

    pub async fn get_resource_access(
        &self,
        resource: &str,
    ) -> Result<Vec<ResourceAccess>, Error> {
        Ok(self.0.perms_platform.get_resource_access(resource).await?)
    }

    /// Replaces the job access entries of the resource with the
    /// desired ones, returning the changes that were applied.  The
    /// stored entries are read, reconciled and written within a single
    /// backend transaction.
    pub async fn set_job_access(
        &self,
        resource: &str,
        desired: Vec<JobAccess>,
    ) -> Result<AccessChanges<JobAccess>, Error> {
        let desired = prepare_entries(resource, desired)?;
        let changes = self.0.perms_platform.set_job_access(resource, &desired).await?;
        log_changes(resource, &changes);
        Ok(changes)
    }

    pub async fn set_user_access(
        &self,
        resource: &str,
        desired: Vec<UserAccess>,
    ) -> Result<AccessChanges<UserAccess>, Error> {
        let desired = prepare_entries(resource, desired)?;
        let changes = self.0.perms_platform.set_user_access(resource, &desired).await?;
        log_changes(resource, &changes);
        Ok(changes)
    }

    pub async fn set_resource_access(
        &self,
        resource: &str,
        desired: Vec<ResourceAccess>,
    ) -> Result<AccessChanges<ResourceAccess>, Error> {
        let desired = prepare_entries(resource, desired)?;
        let changes = self.0.perms_platform.set_resource_access(resource, &desired).await?;
        log_changes(resource, &changes);
        Ok(changes)
    }

    /// Whether the access entries of the resource grant the caller at
    /// least the level.
    pub async fn check_resource_access(
        &self,
        identity: &CallerIdentity,
        resource: &str,
        level: AccessLevel,
    ) -> Result<bool, Error> {
        if identity.superuser {
            return Ok(true);
        }
        let job_access = self.0.perms_platform.get_job_access(resource).await?;
        let user_access = self.0.perms_platform.get_user_access(resource).await?;
        let result = check_resource_access(identity, &job_access, &user_access, level);
        log::trace!("{identity} has {level} access to {resource}: {result}");
        Ok(result)
    }
}
