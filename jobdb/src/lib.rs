pub use jobcore::platform::ConnectorOption;
use jobcore::platform::PermsPlatform;
#[cfg(feature = "sqlite")]
use jobcore::platform::PlatformConnector;
#[cfg(feature = "sqlite")]
use jobdb_sqlite::SqliteBackend;

pub struct Backend;

#[derive(Clone, Debug, PartialEq)]
pub struct Error(String);

#[derive(Debug)]
enum BackendKind {
    Sqlite,
}

mod display {
    use super::{BackendKind, Error};
    use std::fmt::{Display, Formatter, Result};

    impl Display for BackendKind {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            match self {
                Self::Sqlite => "sqlite".fmt(f),
            }
        }
    }

    impl Display for Error {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            self.0.fmt(f)
        }
    }

    impl std::error::Error for Error {}
}

impl TryFrom<&str> for BackendKind {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.split(':').next() {
            Some("sqlite") => Ok(BackendKind::Sqlite),
            _ => Err(Error(format!("The connection string {s:?} is unsupported.")))
        }
    }
}

impl Backend {
    pub async fn perms(
        opts: ConnectorOption,
    ) -> Result<Box<dyn PermsPlatform>, Box<dyn std::error::Error + Send + Sync + 'static>> {
        match BackendKind::try_from(opts.url.as_str()) {
            #[cfg(feature = "sqlite")]
            Ok(BackendKind::Sqlite) => Ok(Box::new(SqliteBackend::perms(opts).await?)),
            #[cfg(not(feature = "sqlite"))]
            Ok(s) => Err(Box::new(Error(format!(
                "The feature {s:?} must be enabled for jobdb in order to connect to {:?}",
                opts.url,
            )))),
            Err(e) => Err(Box::new(e)),
        }
    }
}

#[cfg(test)]
mod testing {
    use crate::Backend;

    #[async_std::test]
    async fn smoke() {
        assert!(Backend::perms("unsupported".into()).await.is_err());
        assert!(Backend::perms("postgres://localhost/jobs".into()).await.is_err());
    }

    #[cfg(feature = "sqlite")]
    #[async_std::test]
    async fn smoke_sqlite() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        use jobcore::traits::PermissionBackend;

        let platform = Backend::perms("sqlite::memory:".into()).await?;
        let id = platform.sync_permission("Conduct", "ListEntries").await?;
        assert_eq!(platform.get_permission_by_id(id).await?.map(|p| p.id), Some(id));
        Ok(())
    }
}
