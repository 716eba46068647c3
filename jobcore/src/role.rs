use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::perms::AttributeValues;

mod impls;

/// The prefix of every job scoped guard name.
pub const GUARD_PREFIX: &str = "job";

/// A role scoped to a single job and grade.
///
/// The `job` and `grade` are parsed out of the guard name once when the
/// role is created and are stored alongside it.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Role {
    pub id: i64,
    pub job: String,
    pub grade: i32,
    pub guard_name: String,
    pub name: String,
    pub description: String,
    pub created_ts: i64,
}

/// The parsed form of a `job-<job>-<grade>` guard name.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct GuardName {
    pub job: String,
    pub grade: i32,
}

/// A request to grant a permission to a role, optionally narrowed by
/// attribute values keyed by `Attr::key`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RoleGrant {
    pub permission_id: i64,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValues>,
}

/// A permission as granted to a role.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RolePermission {
    pub role_id: i64,
    pub permission_id: i64,
    pub category: String,
    pub name: String,
    pub attributes: BTreeMap<String, AttributeValues>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeleteRoleOutcome {
    Deleted(Role),
    /// The role is the last one of its job and was kept.
    LastRole(Role),
    NotFound,
}
