#[cfg(feature = "chrono")]
pub mod chrono;
pub mod mock;
#[cfg(feature = "perms")]
pub mod perms;

pub fn is_send_sync<T: Send + Sync>(_: &T) -> bool {
    true
}
