pub mod access;
pub mod error;
pub mod identity;
pub mod perms;
pub mod platform;
pub mod role;
pub mod traits;
