//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `RAZORPAY_KEY_ID` - Razorpay API key id
//! - `RAZORPAY_KEY_SECRET` - Razorpay API key secret, also the signature key
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 8080)
//! - `RAZORPAY_API_BASE` - API base URL (default: https://api.razorpay.com)
//! - `GATEWAY_TIMEOUT_SECS` - Per-request timeout for gateway calls (default: 10)
//! - `DB_CONNECT_TIMEOUT_SECS` - Pool checkout timeout (default: 5)
//! - `CHECKOUT_CURRENCY` - Currency for payment intents (default: INR)

use std::env;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub api_base: String,
    pub key_id: String,
    pub key_secret: SecretString,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_connect_timeout: Duration,
    pub currency: String,
    pub razorpay: RazorpayConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };
        let optional = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: optional("HOST", "0.0.0.0"),
            port: parse("PORT", &optional("PORT", "8080"))?,
            db_connect_timeout: Duration::from_secs(parse(
                "DB_CONNECT_TIMEOUT_SECS",
                &optional("DB_CONNECT_TIMEOUT_SECS", "5"),
            )?),
            currency: optional("CHECKOUT_CURRENCY", "INR"),
            razorpay: RazorpayConfig {
                api_base: optional("RAZORPAY_API_BASE", "https://api.razorpay.com"),
                key_id: required("RAZORPAY_KEY_ID")?,
                key_secret: SecretString::from(required("RAZORPAY_KEY_SECRET")?),
                timeout: Duration::from_secs(parse(
                    "GATEWAY_TIMEOUT_SECS",
                    &optional("GATEWAY_TIMEOUT_SECS", "10"),
                )?),
            },
        })
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/sarees"),
        ("RAZORPAY_KEY_ID", "rzp_test_abc"),
        ("RAZORPAY_KEY_SECRET", "s3cr3t"),
    ];

    #[test]
    fn defaults_apply_when_optional_vars_are_absent() {
        let config = AppConfig::from_lookup(lookup(REQUIRED)).expect("valid config");

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.currency, "INR");
        assert_eq!(config.razorpay.api_base, "https://api.razorpay.com");
        assert_eq!(config.razorpay.timeout, Duration::from_secs(10));
        assert_eq!(config.razorpay.key_secret.expose_secret(), "s3cr3t");
    }

    #[test]
    fn missing_secret_is_reported_by_name() {
        let vars: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "RAZORPAY_KEY_SECRET")
            .collect();

        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();

        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "RAZORPAY_KEY_SECRET"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "eighty"));

        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "PORT"));
    }
}
