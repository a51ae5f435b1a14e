//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_DB_TIMEOUT_SECS` - Deadline for one checkout (default: 10)
//! - `SMTP_HOST`, `SMTP_USER`, `SMTP_PASS` - Mail relay; order emails fail with a
//!   configuration error until all three are set
//! - `SMTP_PORT` - Relay port (default: 587, 465 switches to implicit TLS)
//! - `FROM_EMAIL` - Sender address (default: `SMTP_USER`)
//! - `ORDER_NOTIFICATION_TO` - Store inbox that receives orders (falls back to
//!   `TO_EMAIL`, then `FROM_EMAIL`)
//! - `MAIL_TIMEOUT_SECS` - Deadline for one send (default: 15)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
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
    /// Deadline for a checkout transaction
    pub db_timeout: Duration,
    /// Mail relay; `None` when credentials are not set
    pub mail: Option<MailConfig>,
    /// Deadline for a single notification send
    pub mail_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    pub log_format: LogFormat,
}

/// SMTP relay configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    /// Sender address
    pub from_address: String,
    /// Store inbox that receives order notifications
    pub notify_address: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("notify_address", &self.notify_address)
            .finish()
    }
}

impl MailConfig {
    /// Whether the relay expects TLS from the first byte (SMTPS) rather than STARTTLS.
    #[must_use]
    pub const fn implicit_tls(&self) -> bool {
        self.smtp_port == 465
    }
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

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let database_url = env
            .get("STOREFRONT_DATABASE_URL")
            .or_else(|| env.get("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("STOREFRONT_DATABASE_URL".to_string()))?;
        let host = env.parse_or("STOREFRONT_HOST", "127.0.0.1".parse::<IpAddr>().ok())?;
        let port = env.parse_or("STOREFRONT_PORT", Some(3000))?;
        let db_timeout = Duration::from_secs(env.parse_or("STOREFRONT_DB_TIMEOUT_SECS", Some(10))?);
        let mail_timeout = Duration::from_secs(env.parse_or("MAIL_TIMEOUT_SECS", Some(15))?);
        let mail = MailConfig::from_env(&env)?;

        let log_format = match env.get("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            database_url,
            host,
            port,
            db_timeout,
            mail,
            mail_timeout,
            sentry_dsn: env.get("SENTRY_DSN"),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
            log_format,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl MailConfig {
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let (Some(smtp_host), Some(smtp_username), Some(password)) =
            (env.get("SMTP_HOST"), env.get("SMTP_USER"), env.get("SMTP_PASS"))
        else {
            return Ok(None);
        };
        let smtp_port = env.parse_or("SMTP_PORT", Some(587))?;
        let from_address = env.get("FROM_EMAIL").unwrap_or_else(|| smtp_username.clone());
        let notify_address = env
            .get("ORDER_NOTIFICATION_TO")
            .or_else(|| env.get("TO_EMAIL"))
            .unwrap_or_else(|| from_address.clone());

        Ok(Some(Self {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password: SecretString::from(password),
            from_address,
            notify_address,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get a variable, treating blank values as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: Option<T>) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
            None => default.ok_or_else(|| ConfigError::MissingEnvVar(key.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("STOREFRONT_DATABASE_URL", "postgres://localhost/uniformly")]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.db_timeout, Duration::from_secs(10));
        assert_eq!(config.mail_timeout, Duration::from_secs(15));
        assert!(config.mail.is_none());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fallback/db")]).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fallback/db");
    }

    #[test]
    fn test_missing_database_url() {
        assert!(matches!(
            load(&[]),
            Err(ConfigError::MissingEnvVar(key)) if key == "STOREFRONT_DATABASE_URL"
        ));
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[
            ("STOREFRONT_DATABASE_URL", "postgres://localhost/db"),
            ("STOREFRONT_PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_mail_requires_host_user_and_password() {
        let config = load(&[
            ("STOREFRONT_DATABASE_URL", "postgres://localhost/db"),
            ("SMTP_HOST", "smtp.gmail.com"),
            ("SMTP_USER", "orders@example.com"),
        ])
        .unwrap();
        assert!(config.mail.is_none());
    }

    #[test]
    fn test_mail_defaults_and_redaction() {
        let config = load(&[
            ("STOREFRONT_DATABASE_URL", "postgres://localhost/db"),
            ("SMTP_HOST", "smtp.gmail.com"),
            ("SMTP_PORT", "465"),
            ("SMTP_USER", "orders@example.com"),
            ("SMTP_PASS", "abcd efgh ijkl mnop"),
        ])
        .unwrap();
        let mail = config.mail.unwrap();
        assert!(mail.implicit_tls());
        assert_eq!(mail.from_address, "orders@example.com");
        assert_eq!(mail.notify_address, "orders@example.com");

        let debug_output = format!("{mail:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("abcd efgh"));
    }

    #[test]
    fn test_notify_address_falls_back_to_to_email() {
        let vars = [
            ("STOREFRONT_DATABASE_URL", "postgres://localhost/db"),
            ("SMTP_HOST", "smtp.gmail.com"),
            ("SMTP_USER", "orders@example.com"),
            ("SMTP_PASS", "secret"),
            ("TO_EMAIL", "store@example.com"),
        ];
        let mail = load(&vars).unwrap().mail.unwrap();
        assert_eq!(mail.notify_address, "store@example.com");

        let mut preferred = vars.to_vec();
        preferred.push(("ORDER_NOTIFICATION_TO", "inbox@example.com"));
        let mail = load(&preferred).unwrap().mail.unwrap();
        assert_eq!(mail.notify_address, "inbox@example.com");
    }

    #[test]
    fn test_log_format_json() {
        let config = load(&[
            ("STOREFRONT_DATABASE_URL", "postgres://localhost/db"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
