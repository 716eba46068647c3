use jobcore::{
    perms::{
        Attr,
        AttributeValues,
        PermKey,
        PERM_ANY,
        genpolicy::GrantPolicy,
    },
    role::RolePermission,
    traits::Enforcer,
};
use std::collections::HashMap;

use crate::error::Error;
use super::*;

impl From<GrantPolicy> for PolicyEnforcer {
    fn from(policy: GrantPolicy) -> Self {
        Self {
            grant_map: PermGrantMap::from_policy(&policy),
            policy,
        }
    }
}

impl From<PolicyEnforcer> for GrantPolicy {
    fn from(enforcer: PolicyEnforcer) -> Self {
        enforcer.policy
    }
}

impl PermGrantMap {
    fn from_policy(policy: &GrantPolicy) -> Self {
        Self(policy.permissions.iter()
            .enumerate()
            // only grants from roles held by the identity apply
            .filter(|(_, perm)| policy.identity.holds_role(perm.role_id))
            .fold(HashMap::new(), |mut m, (i, perm)| {
                m.entry(PermKey::new(&perm.category, &perm.name))
                    .or_insert_with(Vec::new)
                    .push(i);
                m
            })
        )
    }
}

impl PolicyEnforcer {
    pub fn policy(&self) -> &GrantPolicy {
        &self.policy
    }

    /// Whether any held role grants the permission, without the
    /// superuser or `Any` bypass.
    pub fn granted(&self, category: &str, name: &str) -> bool {
        self.grant_map.0.contains_key(&PermKey::new(category, name))
    }

    fn grants(&self, category: &str, name: &str) -> impl Iterator<Item = &RolePermission> {
        self.grant_map.0
            .get(&PermKey::new(category, name))
            .into_iter()
            .flatten()
            .map(|i| &self.policy.permissions[*i])
    }

    /// Resolves the attribute across every held role that grants the
    /// permission, merging the value contributed by each role.  A role
    /// that leaves the attribute unset contributes its default.
    ///
    /// Returns `None` if no held role grants the permission.
    pub fn attr(
        &self,
        category: &str,
        name: &str,
        attr: &Attr,
    ) -> Option<AttributeValues> {
        self.grants(category, name)
            .map(|perm| perm.attributes
                .get(&attr.key)
                .cloned()
                .unwrap_or_else(|| attr.default_or_empty())
            )
            .reduce(AttributeValues::merge)
    }
}

impl Enforcer for PolicyEnforcer {
    type Error = Error;

    fn can(&self, category: &str, name: &str) -> Result<bool, Self::Error> {
        let result = self.policy.identity.superuser
            || name == PERM_ANY
            || self.granted(category, name);
        log::trace!(
            "{} can {category}.{name}: {result}",
            self.policy.identity,
        );
        Ok(result)
    }
}
