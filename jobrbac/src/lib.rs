//! Decision code for the job permissions engine.
//!
//! Nothing in this crate touches storage; every function operates on
//! values that were loaded by the caller.

pub mod access_level;
pub mod builder;
pub mod error;
pub mod method;
pub mod simple;
#[cfg(feature = "casbin")]
pub mod casbin;

pub use builder::Builder;
pub use simple::PolicyEnforcer;

pub type Enforcer = dyn jobcore::traits::Enforcer<Error = error::Error> + Send + Sync;
