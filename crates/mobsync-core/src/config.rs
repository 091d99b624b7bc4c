use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://www.mobgran.com/app/api/link-produto";
pub const DEFAULT_UPSTREAM_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_UPSTREAM_ORIGIN: &str = "https://www.mobgran.com";
pub const DEFAULT_UPSTREAM_REFERER: &str = "https://www.mobgran.com/";
pub const DEFAULT_PROVIDER_DOMAIN: &str = "mobgran.com";

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
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("MOBSYNC_ENV", "development"));
    let bind_addr = parse_addr("MOBSYNC_BIND_ADDR", "0.0.0.0:8080")?;
    let log_level = or_default("MOBSYNC_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("MOBSYNC_DB_MAX_CONNECTIONS", "25")?;
    let db_min_connections = parse_u32("MOBSYNC_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("MOBSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let upstream_base_url = or_default("MOBSYNC_UPSTREAM_BASE_URL", DEFAULT_UPSTREAM_BASE_URL);
    let upstream_timeout_secs = parse_u64("MOBSYNC_UPSTREAM_TIMEOUT_SECS", "60")?;
    if upstream_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "MOBSYNC_UPSTREAM_TIMEOUT_SECS".to_string(),
            reason: "timeout must be greater than zero".to_string(),
        });
    }
    let upstream_user_agent = or_default("MOBSYNC_UPSTREAM_USER_AGENT", DEFAULT_UPSTREAM_USER_AGENT);
    let upstream_origin = or_default("MOBSYNC_UPSTREAM_ORIGIN", DEFAULT_UPSTREAM_ORIGIN);
    let upstream_referer = or_default("MOBSYNC_UPSTREAM_REFERER", DEFAULT_UPSTREAM_REFERER);

    let provider_domain = or_default("MOBSYNC_PROVIDER_DOMAIN", DEFAULT_PROVIDER_DOMAIN);
    if provider_domain.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "MOBSYNC_PROVIDER_DOMAIN".to_string(),
            reason: "domain marker must not be empty".to_string(),
        });
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        upstream_base_url,
        upstream_timeout_secs,
        upstream_user_agent,
        upstream_origin,
        upstream_referer,
        provider_domain,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
