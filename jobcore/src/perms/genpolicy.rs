//! Generated Policy
//!
//! The structs provided by this module represent grant policies generated
//! for consumption by some enforcer, and are not meant to be persisted in
//! some datastore.

use serde::{Deserialize, Serialize};
use crate::{
    identity::CallerIdentity,
    role::RolePermission,
};

/// Every permission granted to the caller through the roles it holds in
/// its own job, passed into the enforcer as a complete policy.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct GrantPolicy {
    pub identity: CallerIdentity,
    pub permissions: Vec<RolePermission>,
}

impl GrantPolicy {
    pub fn new(identity: CallerIdentity, permissions: Vec<RolePermission>) -> Self {
        Self { identity, permissions }
    }
}
