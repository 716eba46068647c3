use async_trait::async_trait;
use std::error::Error;

#[derive(Clone, Debug, Default)]
pub struct ConnectorOption {
    pub auto_create_db: bool,
    pub url: String,
}

impl ConnectorOption {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_create_db(mut self, auto_create_db: bool) -> Self {
        self.auto_create_db = auto_create_db;
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

impl<T> From<T> for ConnectorOption
where
    T: ToString
{
    fn from(v: T) -> Self {
        Self::new().url(v.to_string())
    }
}

#[async_trait]
pub trait PlatformConnector: Sized + Send {
    /// Connects to the backend and brings its schema up to date.
    async fn perms(
        opts: ConnectorOption,
    ) -> Result<Self, Box<dyn Error + Send + Sync + 'static>>;
}
