//! The catalog of permissions declared by the services.
//!
//! Every service registers the permissions guarding its methods while
//! the platform is being assembled; once handed to the platform the
//! registry is only ever read.

use jobcore::perms::{
    Attr,
    PermKey,
    PermissionDef,
    PERM_ANY,
    PERM_SUPERUSER,
};
use std::collections::{
    BTreeMap,
    HashSet,
};

use crate::error::RegistryError;

#[derive(Clone, Debug, Default)]
pub struct Registry {
    defs: BTreeMap<PermKey, PermissionDef>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the definitions.
    ///
    /// Registering a definition identical to one already present is a
    /// no-op; a different definition under the same key fails the whole
    /// batch and nothing from it is registered.
    pub fn register(
        &mut self,
        defs: impl IntoIterator<Item = PermissionDef>,
    ) -> Result<(), RegistryError> {
        let mut staged = BTreeMap::new();
        for def in defs.into_iter() {
            validate(&def)?;
            let key = def.key();
            let existing = staged.get(&key).or_else(|| self.defs.get(&key));
            match existing {
                Some(existing) if *existing == def => continue,
                Some(_) => return Err(RegistryError::Duplicate(key.to_string())),
                None => {
                    staged.insert(key, def);
                }
            }
        }
        log::debug!("registering {} permission(s)", staged.len());
        self.defs.extend(staged);
        Ok(())
    }

    pub fn with(
        mut self,
        defs: impl IntoIterator<Item = PermissionDef>,
    ) -> Result<Self, RegistryError> {
        self.register(defs)?;
        Ok(self)
    }

    pub fn lookup(&self, category: &str, name: &str) -> Option<&PermissionDef> {
        self.defs.get(&PermKey::new(category, name))
    }

    pub fn attr(&self, category: &str, name: &str, key: &str) -> Option<&Attr> {
        self.lookup(category, name)
            .and_then(|def| def.get_attr(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionDef> {
        self.defs.values()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// The name may carry parameter segments after the method name, e.g.
/// `GetUser.ambulance.3`, which are recovered through the suffix lookup
/// of the platform.
fn validate(def: &PermissionDef) -> Result<(), RegistryError> {
    let key = def.key();
    let malformed_category = def.category.is_empty()
        || def.category.contains(['/', '.']);
    let malformed_name = def.name.contains('/')
        || def.name.split('.').any(str::is_empty);
    if malformed_category || malformed_name {
        return Err(RegistryError::Malformed(key.to_string()));
    }
    if def.name == PERM_ANY || def.name == PERM_SUPERUSER {
        return Err(RegistryError::Reserved(def.name.clone()));
    }

    let mut seen = HashSet::new();
    for attr in def.attrs.iter() {
        if !seen.insert(attr.key.as_str()) {
            return Err(RegistryError::DuplicateAttribute {
                permission: key.to_string(),
                key: attr.key.clone(),
            });
        }
        let invalid = |reason: String| RegistryError::InvalidAttribute {
            permission: key.to_string(),
            key: attr.key.clone(),
            reason,
        };
        if let Some(valid) = &attr.valid_values {
            valid.validate(attr.value_type, None)
                .map_err(|e| invalid(format!("valid values: {e}")))?;
        }
        if let Some(default) = &attr.default_values {
            default.validate(attr.value_type, attr.valid_values.as_ref())
                .map_err(|e| invalid(format!("default values: {e}")))?;
        }
    }
    Ok(())
}
