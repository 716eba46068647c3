//! Resource level access control entries.
//!
//! Each resource (identified by a string such as `/qualification/12`)
//! carries its own list of access entries.  Entries come in three
//! variants which differ only in the subject they grant access to.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

mod impls;
pub mod reconcile;

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd,
    IntoPrimitive, TryFromPrimitive, Deserialize, Serialize,
)]
#[repr(i32)]
pub enum AccessLevel {
    Blocked = 0,
    View = 1,
    Edit = 2,
    Grant = 3,
}

/// Access granted to every member of a job at or above a minimum grade.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct JobAccess {
    pub id: i64,
    pub resource: String,
    pub job: String,
    pub minimum_grade: i32,
    pub access: AccessLevel,
}

/// Access granted to a single user.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct UserAccess {
    pub id: i64,
    pub resource: String,
    pub user_id: i64,
    pub access: AccessLevel,
}

/// Access granted by way of another resource.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct ResourceAccess {
    pub id: i64,
    pub resource: String,
    pub target_resource: String,
    pub access: AccessLevel,
}

/// The behaviour shared by all access entry variants that is required to
/// reconcile a current list of entries against a desired one.
pub trait AccessEntry: Clone {
    fn id(&self) -> i64;
    fn access(&self) -> AccessLevel;
    fn set_resource(&mut self, resource: &str);
    /// Whether both entries share the same natural key.
    fn same_key(&self, other: &Self) -> bool;
    /// Whether any mutable field differs between the entries.
    fn differs(&self, other: &Self) -> bool;
    /// Copies the mutable fields of `other` into `self`.
    fn update_from(&mut self, other: &Self);
}

/// The operations required to move from one list of entries to another.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct AccessChanges<T> {
    pub to_create: Vec<T>,
    pub to_update: Vec<T>,
    pub to_delete: Vec<T>,
}
