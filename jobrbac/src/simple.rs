use jobcore::perms::{
    PermKey,
    genpolicy::GrantPolicy,
};
use std::collections::HashMap;

/// Indexes into the permissions of the policy, grouped by permission.
pub struct PermGrantMap(HashMap<PermKey, Vec<usize>>);

/// A simplified enforcer that provides methods that will do a direct
/// check of the permissions granted by the roles of the caller.  It
/// assumes the policy was generated for the identity it carries.
pub struct PolicyEnforcer {
    policy: GrantPolicy,
    grant_map: PermGrantMap,
}

mod impls;
