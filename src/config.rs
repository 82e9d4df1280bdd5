use serde::Serialize;
use std::{env, str::FromStr, time::Duration};
use thiserror::Error;

use crate::crypto::secret::Secret;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
pub const DEFAULT_WALLETCONNECT_PROJECT_ID: &str = "demo-project-id";
pub const DEFAULT_RPC_URL: &str = "https://rpc.sepolia.org";
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;
pub const DEFAULT_JWT_AUDIENCE: &str = "arena-app";
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;
pub const MAX_NONCE_TTL_SECS: u64 = 86_400;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("JWT_SECRET is not configured")]
    MissingSecret,

    #[error("JWT_SECRET must be at least {MIN_PRODUCTION_SECRET_LEN} bytes in production")]
    WeakSecret,
}

/// Backend used by the profile gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileStoreKind {
    Postgres,
    Rpc,
    Memory,
}

impl FromStr for ProfileStoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "rpc" | "supabase" => Ok(Self::Rpc),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown profile store {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub server_url: String,

    // Chain
    pub walletconnect_project_id: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub house_address: Option<String>,

    // JWT
    pub jwt_secret: Option<Secret>,
    pub jwt_audience: String,
    pub jwt_expiry_hours: u64,
    pub nonce_ttl_secs: u64,

    // Profile store
    pub profile_store: ProfileStoreKind,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<Secret>,

    // Challenge store
    pub redis_url: Option<String>,

    pub request_timeout_ms: u64,
    pub cors_allowed_origins: String,
}

/// Subset of the configuration that is safe to hand to browsers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub server_url: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub wallet_connect_project_id: String,
    pub house_address: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Config {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&var, "PORT", 3000)?,
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            server_url: var("SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),

            walletconnect_project_id: var("WALLETCONNECT_PROJECT_ID")
                .unwrap_or_else(|| DEFAULT_WALLETCONNECT_PROJECT_ID.to_string()),
            rpc_url: var("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            chain_id: parse_or(&var, "CHAIN_ID", DEFAULT_CHAIN_ID)?,
            house_address: var("HOUSE_ADDRESS"),

            jwt_secret: var("JWT_SECRET").map(Secret::new),
            jwt_audience: var("JWT_AUDIENCE").unwrap_or_else(|| DEFAULT_JWT_AUDIENCE.to_string()),
            jwt_expiry_hours: parse_or(&var, "JWT_EXPIRY_HOURS", 24)?,
            nonce_ttl_secs: parse_or(&var, "NONCE_TTL_SECS", 300)?,

            profile_store: parse_or(&var, "PROFILE_STORE", ProfileStoreKind::Memory)?,
            database_url: var("DATABASE_URL"),
            database_max_connections: parse_or(&var, "DATABASE_MAX_CONNECTIONS", 10)?,
            supabase_url: var("SUPABASE_URL"),
            supabase_key: var("SUPABASE_KEY").map(Secret::new),

            redis_url: var("REDIS_URL"),

            request_timeout_ms: parse_or(&var, "REQUEST_TIMEOUT_MS", 5000)?,
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| "*".to_string()),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("SERVER_URL", &self.server_url)?;
        check_url("RPC_URL", &self.rpc_url)?;

        if self.chain_id == 0 {
            return Err(invalid("CHAIN_ID", "0", "chain id must be positive"));
        }
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&self.jwt_expiry_hours) {
            return Err(invalid(
                "JWT_EXPIRY_HOURS",
                &self.jwt_expiry_hours.to_string(),
                &format!("must be between 1 and {MAX_JWT_EXPIRY_HOURS}"),
            ));
        }
        if !(1..=MAX_NONCE_TTL_SECS).contains(&self.nonce_ttl_secs) {
            return Err(invalid(
                "NONCE_TTL_SECS",
                &self.nonce_ttl_secs.to_string(),
                &format!("must be between 1 and {MAX_NONCE_TTL_SECS}"),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid("REQUEST_TIMEOUT_MS", "0", "must be positive"));
        }
        if let Some(house) = &self.house_address {
            if !arena_auth_client::is_valid_address(house) {
                return Err(invalid("HOUSE_ADDRESS", house, "not an EVM address"));
            }
        }

        match self.profile_store {
            ProfileStoreKind::Postgres => {
                if self.database_url.is_none() {
                    return Err(ConfigError::Missing("DATABASE_URL"));
                }
            }
            ProfileStoreKind::Rpc => {
                let url = self
                    .supabase_url
                    .as_deref()
                    .ok_or(ConfigError::Missing("SUPABASE_URL"))?;
                check_url("SUPABASE_URL", url)?;
                if self.supabase_key.is_none() {
                    return Err(ConfigError::Missing("SUPABASE_KEY"));
                }
            }
            ProfileStoreKind::Memory => {
                tracing::warn!("Using in-memory profile store; profiles are lost on restart");
            }
        }

        match &self.jwt_secret {
            None if self.is_production() => return Err(ConfigError::MissingSecret),
            None => tracing::warn!("JWT_SECRET is not set; token issuance will fail"),
            Some(secret) if secret.len() < MIN_PRODUCTION_SECRET_LEN => {
                if self.is_production() {
                    return Err(ConfigError::WeakSecret);
                }
                tracing::warn!("JWT_SECRET is shorter than {} bytes", MIN_PRODUCTION_SECRET_LEN);
            }
            Some(_) => {}
        }

        if self.walletconnect_project_id == DEFAULT_WALLETCONNECT_PROJECT_ID {
            tracing::warn!("Using placeholder WalletConnect project id");
        }
        if self.redis_url.is_none() {
            tracing::warn!("REDIS_URL not set; login challenges are kept in process memory");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn public(&self) -> PublicConfig {
        PublicConfig {
            server_url: self.server_url.clone(),
            chain_id: self.chain_id,
            rpc_url: self.rpc_url.clone(),
            wallet_connect_project_id: self.walletconnect_project_id.clone(),
            house_address: self
                .house_address
                .as_deref()
                .map(arena_auth_client::normalize_address),
        }
    }
}

fn parse_or<T, V>(var: &V, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| invalid(key, &raw, &e.to_string())),
    }
}

fn check_url(key: &'static str, value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| invalid(key, value, &e.to_string()))
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some("test-secret-that-is-long-enough-for-hs256".to_string()),
        "NONCE_TTL_SECS" => Some("60".to_string()),
        "REQUEST_TIMEOUT_MS" => Some("1000".to_string()),
        _ => None,
    })
    .expect("test config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_falls_back_to_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.chain_id, DEFAULT_CHAIN_ID);
        assert_eq!(config.walletconnect_project_id, DEFAULT_WALLETCONNECT_PROJECT_ID);
        assert_eq!(config.profile_store, ProfileStoreKind::Memory);
        assert!(config.jwt_secret.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = config_from(&[
            ("SERVER_URL", "https://arena.example"),
            ("CHAIN_ID", "8453"),
            ("WALLETCONNECT_PROJECT_ID", "abc123"),
            ("RPC_URL", "https://mainnet.base.org"),
        ])
        .unwrap();
        assert_eq!(config.server_url, "https://arena.example");
        assert_eq!(config.chain_id, 8453);
        assert_eq!(config.walletconnect_project_id, "abc123");
        assert_eq!(config.public().rpc_url, "https://mainnet.base.org");
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[("CHAIN_ID", "   "), ("SERVER_URL", "")]).unwrap();
        assert_eq!(config.chain_id, DEFAULT_CHAIN_ID);
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn malformed_numbers_are_config_errors() {
        let err = config_from(&[("CHAIN_ID", "sepolia")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CHAIN_ID", .. }));

        let err = config_from(&[("PORT", "99999")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn validate_rejects_bad_urls_and_zero_chain() {
        let config = config_from(&[("RPC_URL", "not a url")]).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "RPC_URL", .. })
        ));

        let config = config_from(&[("CHAIN_ID", "0")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn token_lifetime_is_bounded() {
        let config = config_from(&[("JWT_EXPIRY_HOURS", "10000000000")]).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "JWT_EXPIRY_HOURS", .. })
        ));

        let config = config_from(&[("JWT_EXPIRY_HOURS", "0")]).unwrap();
        assert!(config.validate().is_err());

        let max = MAX_JWT_EXPIRY_HOURS.to_string();
        let config = config_from(&[("JWT_EXPIRY_HOURS", max.as_str())]).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn nonce_ttl_is_bounded() {
        let config = config_from(&[("NONCE_TTL_SECS", "18446744073709551615")]).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "NONCE_TTL_SECS", .. })
        ));

        let max = MAX_NONCE_TTL_SECS.to_string();
        let config = config_from(&[("NONCE_TTL_SECS", max.as_str())]).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn store_kind_requires_its_connection_settings() {
        let config = config_from(&[("PROFILE_STORE", "postgres")]).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));

        let config = config_from(&[
            ("PROFILE_STORE", "rpc"),
            ("SUPABASE_URL", "https://xyz.supabase.co"),
        ])
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("SUPABASE_KEY"))
        ));

        assert!(config_from(&[("PROFILE_STORE", "mongo")]).is_err());
    }

    #[test]
    fn production_requires_strong_secret() {
        let config = config_from(&[("ENVIRONMENT", "production")]).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingSecret)));

        let config =
            config_from(&[("ENVIRONMENT", "production"), ("JWT_SECRET", "short")]).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::WeakSecret)));

        let config = config_from(&[
            ("ENVIRONMENT", "production"),
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn debug_output_never_contains_secrets() {
        let config = config_from(&[
            ("JWT_SECRET", "hunter2-hunter2-hunter2-hunter2!"),
            ("SUPABASE_KEY", "service-role-key"),
        ])
        .unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("service-role-key"));
    }

    #[test]
    fn public_config_normalizes_house_address() {
        let config = config_from(&[(
            "HOUSE_ADDRESS",
            "0xABCDEF0123456789ABCDEF0123456789ABCDEF01",
        )])
        .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.public().house_address.as_deref(),
            Some("0xabcdef0123456789abcdef0123456789abcdef01")
        );
    }
}
