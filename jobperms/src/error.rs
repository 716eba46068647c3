use jobcore::error::{
    BackendError,
    ValueError,
};
use thiserror::Error;

/// gRPC status code for a request refused for lack of a grant.
pub const GRPC_PERMISSION_DENIED: i32 = 7;
/// gRPC status code for a malformed or rejected request.
pub const GRPC_INVALID_ARGUMENT: i32 = 3;
/// gRPC status code for everything else.
pub const GRPC_INTERNAL: i32 = 13;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("permission denied")]
    PermissionDenied,
    #[error(transparent)]
    InvalidRequest(#[from] InvalidRequestError),
    /// The backend failed; the details were logged where the failure
    /// was converted.
    #[error("query failed")]
    QueryFailed,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error(transparent)]
    Rbac(#[from] jobrbac::error::Error),
    #[error("misconfiguration: {0}")]
    Misconfiguration(&'static str),
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum InvalidRequestError {
    #[error("malformed guard name: {0:?}")]
    MalformedGuardName(String),
    #[error("a role with the guard name {0:?} already exists")]
    AlreadyExists(String),
    #[error("role {0:?} is the last role of its job")]
    LastRole(String),
    #[error("unknown role: {0}")]
    UnknownRole(i64),
    #[error("unknown permission: {0}")]
    UnknownPermission(String),
    #[error("unknown attribute {key:?} for permission {permission}")]
    UnknownAttribute {
        permission: String,
        key: String,
    },
    #[error("permission {0} may not be granted or revoked")]
    IgnoredPermission(String),
    #[error("invalid value for attribute {key:?}: {source}")]
    InvalidAttribute {
        key: String,
        source: ValueError,
    },
    #[error("access entry at position {0} duplicates an earlier entry")]
    DuplicateAccessEntry(usize),
}

#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("conflicting definition for permission {0}")]
    Duplicate(String),
    #[error("permission name {0:?} is reserved")]
    Reserved(String),
    #[error("malformed permission key {0:?}")]
    Malformed(String),
    #[error("permission {permission} declares attribute {key:?} more than once")]
    DuplicateAttribute {
        permission: String,
        key: String,
    },
    #[error("permission {permission} attribute {key:?}: {reason}")]
    InvalidAttribute {
        permission: String,
        key: String,
        reason: String,
    },
}

impl From<BackendError> for Error {
    fn from(error: BackendError) -> Self {
        log::error!("backend failure: {error}");
        Self::QueryFailed
    }
}

impl Error {
    /// The gRPC status code a caller of an RPC should receive.
    pub fn grpc_status(&self) -> i32 {
        match self {
            Self::PermissionDenied => GRPC_PERMISSION_DENIED,
            Self::InvalidRequest(_) => GRPC_INVALID_ARGUMENT,
            _ => GRPC_INTERNAL,
        }
    }

    /// A message safe to expose to the caller; backend and internal
    /// details are withheld.
    pub fn grpc_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission denied",
            Self::InvalidRequest(_) => "invalid request",
            _ => "internal error",
        }
    }
}
