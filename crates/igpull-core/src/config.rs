use crate::app_config::{AppConfig, RetrySettings, StoreConfig};
use crate::ConfigError;

/// Table created by `migrations/0001_instagram_data.sql`.
const POSTGRES_TABLE: &str = "instagram_data";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::time::Duration;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let require = |var: &str| -> Result<String, ConfigError> {
        optional(var).ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let bind_addr = or_default("IGPULL_BIND_ADDR", "0.0.0.0:8000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("IGPULL_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("IGPULL_LOG_LEVEL", "info");
    let cors_origins = parse_list(&or_default("IGPULL_CORS_ORIGINS", "*"));

    let access_token = optional("INSTAGRAM_ACCESS_TOKEN");
    let api_base_url = or_default("INSTAGRAM_API_BASE_URL", "https://graph.instagram.com");
    let api_version = or_default("INSTAGRAM_API_VERSION", "v22.0");

    let request_timeout_secs = parse_u64("IGPULL_REQUEST_TIMEOUT_SECS", "30")?;
    let max_attempts = parse_u32("IGPULL_RETRY_MAX_ATTEMPTS", "3")?;
    if max_attempts == 0 {
        return Err(invalid(
            "IGPULL_RETRY_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    let min_delay = parse_u64("IGPULL_RETRY_MIN_DELAY_SECS", "2")?;
    let max_delay = parse_u64("IGPULL_RETRY_MAX_DELAY_SECS", "10")?;
    if min_delay > max_delay {
        return Err(invalid(
            "IGPULL_RETRY_MIN_DELAY_SECS",
            format!("{min_delay} exceeds IGPULL_RETRY_MAX_DELAY_SECS ({max_delay})"),
        ));
    }
    let retry = RetrySettings {
        max_attempts,
        multiplier: Duration::from_secs(parse_u64("IGPULL_RETRY_MULTIPLIER_SECS", "1")?),
        min_delay: Duration::from_secs(min_delay),
        max_delay: Duration::from_secs(max_delay),
    };
    let aggregate_deadline_secs = parse_u64("IGPULL_AGGREGATE_DEADLINE_SECS", "600")?;

    let table_name = or_default("IGPULL_TABLE_NAME", "instagram_data");
    let conflict_column = or_default("IGPULL_UPSERT_CONFLICT_COLUMN", "id");

    let store = match optional("IGPULL_STORE").as_deref() {
        Some("memory") => StoreConfig::Memory,
        Some("supabase") => StoreConfig::Supabase {
            url: require("SUPABASE_URL")?,
            key: require("SUPABASE_KEY")?,
        },
        Some("postgres") => StoreConfig::Postgres {
            database_url: require("DATABASE_URL")?,
            max_connections: parse_u32("IGPULL_DB_MAX_CONNECTIONS", "10")?,
            min_connections: parse_u32("IGPULL_DB_MIN_CONNECTIONS", "1")?,
            acquire_timeout_secs: parse_u64("IGPULL_DB_ACQUIRE_TIMEOUT_SECS", "10")?,
        },
        Some(other) => {
            return Err(invalid(
                "IGPULL_STORE",
                format!("unknown backend '{other}' (expected supabase, postgres or memory)"),
            ))
        }
        None => match (
            optional("SUPABASE_URL"),
            optional("SUPABASE_KEY"),
            optional("DATABASE_URL"),
        ) {
            (Some(url), Some(key), _) => StoreConfig::Supabase { url, key },
            (_, _, Some(database_url)) => StoreConfig::Postgres {
                database_url,
                max_connections: parse_u32("IGPULL_DB_MAX_CONNECTIONS", "10")?,
                min_connections: parse_u32("IGPULL_DB_MIN_CONNECTIONS", "1")?,
                acquire_timeout_secs: parse_u64("IGPULL_DB_ACQUIRE_TIMEOUT_SECS", "10")?,
            },
            _ => StoreConfig::Memory,
        },
    };

    // The Postgres backend only has the table created by the workspace migrations.
    if matches!(store, StoreConfig::Postgres { .. }) && table_name != POSTGRES_TABLE {
        return Err(invalid(
            "IGPULL_TABLE_NAME",
            format!("the postgres backend only provides the '{POSTGRES_TABLE}' table, got '{table_name}'"),
        ));
    }

    Ok(AppConfig {
        bind_addr,
        log_level,
        cors_origins,
        access_token,
        api_base_url,
        api_version,
        request_timeout_secs,
        retry,
        aggregate_deadline_secs,
        table_name,
        conflict_column,
        store,
    })
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
