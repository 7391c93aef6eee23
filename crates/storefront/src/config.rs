//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (`https` enables secure cookies)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_UPLOAD_DIR` - Directory for uploaded images (default: uploads)
//! - `STOREFRONT_MAX_UPLOAD_BYTES` - Largest accepted upload (default: 5 MiB)
//! - `STOREFRONT_FREE_SHIPPING_THRESHOLD` - Subtotal that ships free (default: 3000)
//! - `STOREFRONT_SHIPPING_FEE` - Flat fee below the threshold (default: 200)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use zahra_core::ShippingPolicy;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// Where uploaded payment proofs and product images are written
    pub upload_dir: PathBuf,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
    /// Shipping charged at checkout
    pub shipping: ShippingPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = get_database_url(&env, "STOREFRONT_DATABASE_URL")?;
        let host = parse_or_default(&env, "STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_or_default(&env, "STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env(&env, "STOREFRONT_BASE_URL")?;
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let upload_dir = PathBuf::from(get_env_or_default(&env, "STOREFRONT_UPLOAD_DIR", "uploads"));
        let max_upload_bytes = match env("STOREFRONT_MAX_UPLOAD_BYTES") {
            Some(value) => parse_value("STOREFRONT_MAX_UPLOAD_BYTES", &value)?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let defaults = ShippingPolicy::default();
        let free_threshold: Decimal = match env("STOREFRONT_FREE_SHIPPING_THRESHOLD") {
            Some(value) => parse_value("STOREFRONT_FREE_SHIPPING_THRESHOLD", &value)?,
            None => defaults.free_threshold,
        };
        let flat_fee: Decimal = match env("STOREFRONT_SHIPPING_FEE") {
            Some(value) => parse_value("STOREFRONT_SHIPPING_FEE", &value)?,
            None => defaults.flat_fee,
        };
        if free_threshold.is_sign_negative() || flat_fee.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_SHIPPING_FEE".to_string(),
                "shipping amounts cannot be negative".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            upload_dir,
            max_upload_bytes,
            shipping: ShippingPolicy::new(free_threshold, flat_fee),
            sentry_dsn: env("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_or_default(&env, "SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_or_default(&env, "SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS (cookies get the `Secure` flag).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(
    env: &impl Fn(&str) -> Option<String>,
    primary_key: &str,
) -> Result<SecretString, ConfigError> {
    env(primary_key)
        .or_else(|| env("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(env: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to a default.
fn parse_or_default<T>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(env, key, default))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("STOREFRONT_DATABASE_URL", "postgres://localhost/zahra"),
        ("STOREFRONT_BASE_URL", "http://localhost:3000"),
    ];

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.shipping, ShippingPolicy::default());
        assert!(config.sentry_dsn.is_none());
        assert!(!config.is_secure());
    }

    #[test]
    fn test_database_url_fallback() {
        let config = StorefrontConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://fallback/zahra"),
            ("STOREFRONT_BASE_URL", "https://zahrafashion.pk"),
        ]))
        .unwrap();
        assert_eq!(
            config.database_url.expose_secret(),
            "postgres://fallback/zahra"
        );
        assert!(config.is_secure());
    }

    #[test]
    fn test_missing_base_url() {
        let err = StorefrontConfig::from_lookup(lookup(&[(
            "STOREFRONT_DATABASE_URL",
            "postgres://localhost/zahra",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "STOREFRONT_BASE_URL"));
    }

    #[test]
    fn test_invalid_values() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("STOREFRONT_PORT", "not-a-port"));
        let err = StorefrontConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_PORT"));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("STOREFRONT_SHIPPING_FEE", "-5"));
        assert!(StorefrontConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_shipping_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("STOREFRONT_FREE_SHIPPING_THRESHOLD", "5000"));
        pairs.push(("STOREFRONT_SHIPPING_FEE", "250.50"));
        let config = StorefrontConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.shipping.free_threshold, Decimal::from(5000));
        assert_eq!(config.shipping.flat_fee, Decimal::new(25_050, 2));
    }
}
