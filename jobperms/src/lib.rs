//! The job permissions engine.
//!
//! A `Platform` is assembled through its `Builder` from a backend and
//! the `Registry` of declared permissions; it answers grant and
//! attribute questions for callers, manages the job scoped roles and
//! keeps the resource access entries in line with what is desired.
//! `PermsLayer` places the platform in front of an RPC service.

pub mod cache;
pub mod error;
pub mod interceptor;
pub mod platform;
pub mod registry;

pub use interceptor::PermsLayer;
pub use jobrbac::{
    access_level::check_access,
    method::{
        PermsRemap,
        RemapTable,
    },
};
pub use platform::Platform;
pub use registry::Registry;
