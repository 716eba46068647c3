//! Permission catalog types.
//!
//! A permission is identified by its `(category, name)` pair, which is
//! derived from the RPC method it guards (`/<namespace>.<Category>/<Name>`).
//! Permissions may carry typed attributes that narrow what a grant of the
//! permission actually allows.

use serde::{Deserialize, Serialize};

pub mod attr;
pub mod genpolicy;
mod impls;

pub use impls::guard_name;

pub use attr::{
    AttrValueType,
    AttributeValues,
    JobGradeList,
    StringList,
};

/// Name of the reserved permission every caller holds.
pub const PERM_ANY: &str = "Any";

/// Name of the reserved permission only superusers hold.
pub const PERM_SUPERUSER: &str = "Superuser";

/// Permissions that are internal to bootstrapping and must never be
/// granted or revoked through role management, in guard name form.
pub const IGNORED_GUARD_PERMISSIONS: &[&str] = &[
    "Superuser.Superuser",
    "Superuser.CanBeSuperuser",
];

/// The two part key of a permission.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct PermKey {
    pub category: String,
    pub name: String,
}

/// A typed, constrained parameter attached to a permission.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Attr {
    pub key: String,
    pub value_type: AttrValueType,
    /// Whitelist of values a grantor may choose from; `None` leaves the
    /// attribute unconstrained.
    #[serde(default)]
    pub valid_values: Option<AttributeValues>,
    /// Applied when a role grants the permission without setting this
    /// attribute.
    #[serde(default)]
    pub default_values: Option<AttributeValues>,
}

/// Static definition of a permission as declared by the owning service.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PermissionDef {
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub attrs: Vec<Attr>,
}

/// A permission as persisted by the backend.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Permission {
    pub id: i64,
    pub category: String,
    pub name: String,
    pub guard_name: String,
}
