use std::net::SocketAddr;
use std::time::Duration;

/// Exponential back-off settings shared by every graph API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_secs(1),
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Which storage backend receives fetched records.
#[derive(Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    Supabase {
        url: String,
        key: String,
    },
    Postgres {
        database_url: String,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_secs: u64,
    },
}

impl StoreConfig {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::Supabase { .. } => "supabase",
            StoreConfig::Postgres { .. } => "postgres",
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Memory => f.write_str("Memory"),
            StoreConfig::Supabase { url, .. } => f
                .debug_struct("Supabase")
                .field("url", url)
                .field("key", &"[redacted]")
                .finish(),
            StoreConfig::Postgres {
                max_connections,
                min_connections,
                acquire_timeout_secs,
                ..
            } => f
                .debug_struct("Postgres")
                .field("database_url", &"[redacted]")
                .field("max_connections", max_connections)
                .field("min_connections", min_connections)
                .field("acquire_timeout_secs", acquire_timeout_secs)
                .finish(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub cors_origins: Vec<String>,
    pub access_token: Option<String>,
    pub api_base_url: String,
    pub api_version: String,
    pub request_timeout_secs: u64,
    pub retry: RetrySettings,
    pub aggregate_deadline_secs: u64,
    pub table_name: String,
    pub conflict_column: String,
    pub store: StoreConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("cors_origins", &self.cors_origins)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("api_base_url", &self.api_base_url)
            .field("api_version", &self.api_version)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("retry", &self.retry)
            .field("aggregate_deadline_secs", &self.aggregate_deadline_secs)
            .field("table_name", &self.table_name)
            .field("conflict_column", &self.conflict_column)
            .field("store", &self.store)
            .finish()
    }
}
