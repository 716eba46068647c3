//! Derivation of permission keys from RPC method names.
//!
//! Every RPC method is guarded by the permission named after it: the
//! method `/services.jobs.Conduct/ListEntries` is guarded by the
//! permission `Conduct/ListEntries`.  A remap table may point several
//! methods at a single shared permission.

use jobcore::perms::{
    PermKey,
    PERM_ANY,
    PERM_SUPERUSER,
};
use std::{
    collections::HashMap,
    str::FromStr,
};

use crate::error::Error;

/// Maps the `Category/Name` of a method onto the `Category/Name` of the
/// permission that guards it, or onto one of the reserved names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemapTable(HashMap<String, String>);

/// Implemented by handlers that share permissions across their methods.
pub trait PermsRemap {
    fn perms_remap(&self) -> Option<&RemapTable> {
        None
    }
}

/// The permission that was resolved for a method.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResolvedPerm {
    /// Every caller may proceed.
    Any,
    /// Only superusers may proceed.
    Superuser,
    Key(PermKey),
}

impl RemapTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Option<String> {
        self.0.insert(from.into(), to.into())
    }

    pub fn get(&self, key: &PermKey) -> Option<&str> {
        self.0.get(&key.to_string()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RemapTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect())
    }
}

impl PermsRemap for RemapTable {
    fn perms_remap(&self) -> Option<&RemapTable> {
        Some(self)
    }
}

/// Parses a full method name of the form `/<namespace>.<Category>/<Name>`.
///
/// The category is the last dot separated segment of the service name,
/// and at least one namespace segment must precede it.
pub fn parse_method(method: &str) -> Result<PermKey, Error> {
    method.strip_prefix('/')
        .and_then(|rest| rest.split_once('/'))
        .filter(|(_, name)| !name.is_empty() && !name.contains('/'))
        .and_then(|(service, name)| {
            service.rsplit_once('.')
                .filter(|(ns, category)| {
                    !ns.is_empty()
                        && !ns.split('.').any(str::is_empty)
                        && !category.is_empty()
                })
                .map(|(_, category)| PermKey::new(category, name))
        })
        .ok_or_else(|| Error::MalformedMethod(method.to_string()))
}

/// Resolves the permission guarding the method, applying the remap table
/// if one is provided.
pub fn resolve_permission(
    method: &str,
    remap: Option<&RemapTable>,
) -> Result<ResolvedPerm, Error> {
    let key = parse_method(method)?;
    let key = match remap.and_then(|remap| remap.get(&key)) {
        Some(PERM_ANY) => return Ok(ResolvedPerm::Any),
        Some(PERM_SUPERUSER) => return Ok(ResolvedPerm::Superuser),
        Some(target) => {
            log::trace!("remapped {key} to {target}");
            PermKey::from_str(target)
                .map_err(|_| Error::MalformedMethod(target.to_string()))?
        }
        None => key,
    };
    Ok(if key.name == PERM_ANY {
        ResolvedPerm::Any
    } else {
        ResolvedPerm::Key(key)
    })
}
