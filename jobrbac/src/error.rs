#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed method: {0}")]
    MalformedMethod(String),
    #[cfg(feature = "casbin")]
    #[error(transparent)]
    Casbin(#[from] casbin::Error),
}
