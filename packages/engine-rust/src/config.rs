//! Engine configuration types.

use hashmodel_core::DEFAULT_ID_FIELD;

/// Default number of records per page for `get_page` and `each`.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Top-level configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Connection settings for the backing store.
    pub store: StoreConfig,
    /// Prefix of every storage key.
    pub prefix: String,
    /// Hash field holding the record identifier.
    pub id_field: String,
    /// Page size used by [`Collection`](crate::Collection) helpers.
    pub page_size: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            prefix: "db".to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Connection settings for a Redis-compatible store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Optional `AUTH` password.
    pub password: Option<String>,
    /// Whether to keep the TCP connection alive between requests.
    pub keep_alive: bool,
    /// Logical database index selected after connecting.
    pub database: i64,
}

impl StoreConfig {
    /// Renders the settings as a `redis://` connection URL.
    ///
    /// The password is placed verbatim; it must not contain `@` or `/`.
    #[must_use]
    pub fn connection_url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{password}@{}:{}/{}",
                self.host, self.port, self.database
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            keep_alive: true,
            database: 0,
        }
    }
}
