use async_trait::async_trait;
use crate::traits::{
    AccessBackend,
    PermissionBackend,
    RoleBackend,
};

mod connector;
pub use connector::{ConnectorOption, PlatformConnector};

pub trait PlatformUrl {
    fn url(&self) -> &str;
}

/// PermsPlatform - Permissions Platform
///
/// Persists the permission catalog, the job scoped roles with their
/// grants, role assignments and the per resource access entries.
///
/// This trait is applicable to everything that correctly implements the
/// relevant backends that compose this trait.
#[async_trait]
pub trait PermsPlatform: PermissionBackend
    + RoleBackend
    + AccessBackend

    + PlatformUrl

    + Send
    + Sync
{
    fn as_dyn(&self) -> &dyn PermsPlatform;
}

/// Marker for backends that accept the blanket `PermsPlatform` impl.
pub trait DefaultPermsPlatform {}

impl<P: PermissionBackend
    + RoleBackend
    + AccessBackend

    + PlatformUrl

    + DefaultPermsPlatform

    + Send
    + Sync
> PermsPlatform for P {
    fn as_dyn(&self) -> &(dyn PermsPlatform) {
        self
    }
}
