use jobcore::platform::PermsPlatform;
use jobrbac::Builder as RbacBuilder;
use std::sync::Arc;

use crate::{
    cache::PermsCache,
    registry::Registry,
};

#[derive(Default)]
pub struct Builder {
    perms_platform: Option<Box<dyn PermsPlatform>>,
    registry: Registry,
    rbac_builder: RbacBuilder,
}

/// The permissions engine.
///
/// Cloning is cheap; every clone shares the backend, the registry and
/// the cache.
#[derive(Clone)]
pub struct Platform(Arc<PlatformInner>);

pub(crate) struct PlatformInner {
    perms_platform: Box<dyn PermsPlatform>,
    registry: Registry,
    cache: PermsCache,
    rbac_builder: RbacBuilder,
}

mod impls;
