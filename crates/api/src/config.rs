use karyakita_core::account::{DEFAULT_EMAIL_DOMAIN, DEFAULT_MIN_PASSWORD_LENGTH};
use karyakita_core::sessions::DEFAULT_SESSION_TTL_MINS;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Session lifetime in minutes (default: `120`).
    pub session_ttl_minutes: i64,
    /// Only emails on this domain may register (default: `kampus.ac.id`).
    pub allowed_email_domain: String,
    /// Minimum password length at registration (default: `8`).
    pub min_password_length: usize,
    /// How often expired sessions are purged, in seconds (default: `3600`).
    pub session_cleanup_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `HOST`                          | `0.0.0.0`               |
    /// | `PORT`                          | `3000`                  |
    /// | `CORS_ORIGINS`                  | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`          | `30`                    |
    /// | `SESSION_TTL_MINUTES`           | `120`                   |
    /// | `ALLOWED_EMAIL_DOMAIN`          | `kampus.ac.id`          |
    /// | `MIN_PASSWORD_LENGTH`           | `8`                     |
    /// | `SESSION_CLEANUP_INTERVAL_SECS` | `3600`                  |
    ///
    /// Panics on unparsable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let session_ttl_minutes: i64 = std::env::var("SESSION_TTL_MINUTES")
            .map(|v| v.parse().expect("SESSION_TTL_MINUTES must be a valid i64"))
            .unwrap_or(DEFAULT_SESSION_TTL_MINS);
        assert!(session_ttl_minutes > 0, "SESSION_TTL_MINUTES must be positive");

        let allowed_email_domain = std::env::var("ALLOWED_EMAIL_DOMAIN")
            .map(|d| d.trim().trim_start_matches('@').to_lowercase())
            .unwrap_or_else(|_| DEFAULT_EMAIL_DOMAIN.into());
        assert!(
            !allowed_email_domain.is_empty(),
            "ALLOWED_EMAIL_DOMAIN must not be empty"
        );

        let min_password_length: usize = std::env::var("MIN_PASSWORD_LENGTH")
            .map(|v| v.parse().expect("MIN_PASSWORD_LENGTH must be a valid usize"))
            .unwrap_or(DEFAULT_MIN_PASSWORD_LENGTH);

        let session_cleanup_interval_secs: u64 = std::env::var("SESSION_CLEANUP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("SESSION_CLEANUP_INTERVAL_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            session_ttl_minutes,
            allowed_email_domain,
            min_password_length,
            session_cleanup_interval_secs,
        }
    }
}
