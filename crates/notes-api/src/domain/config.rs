//! Service configuration with validation.
//!
//! Defaults are development-friendly except for the two secrets, which have
//! no default: a server without a token secret or encryption key refuses to
//! start.

use notes_crypto::{CryptoError, EncryptionCodec, MIN_SECRET_LEN};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Environment variable names read by [`ServiceConfig::from_env`].
pub mod env {
    pub const HTTP_HOST: &str = "NOTES_HTTP_HOST";
    pub const HTTP_PORT: &str = "NOTES_HTTP_PORT";
    pub const TOKEN_SECRET: &str = "NOTES_TOKEN_SECRET";
    pub const TOKEN_TTL_SECS: &str = "NOTES_TOKEN_TTL_SECS";
    pub const ENCRYPTION_KEY: &str = "NOTES_ENCRYPTION_KEY";
    pub const EXEMPT_PREFIXES: &str = "NOTES_EXEMPT_PREFIXES";
    pub const CORS_ORIGINS: &str = "NOTES_CORS_ORIGINS";
}

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Token signing and gate configuration
    pub auth: AuthConfig,
    /// Note content encryption configuration
    pub encryption: EncryptionConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl ServiceConfig {
    /// Defaults overlaid with `NOTES_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(env::HTTP_HOST) {
            config.http.host = host.parse().map_err(|_| ConfigError::InvalidValue {
                name: env::HTTP_HOST,
                reason: format!("not an IP address: {host}"),
            })?;
        }
        if let Some(port) = lookup(env::HTTP_PORT) {
            config.http.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                name: env::HTTP_PORT,
                reason: format!("not a port: {port}"),
            })?;
        }
        if let Some(secret) = lookup(env::TOKEN_SECRET) {
            config.auth.token_secret = secret;
        }
        if let Some(ttl) = lookup(env::TOKEN_TTL_SECS) {
            let secs: u64 = ttl.parse().map_err(|_| ConfigError::InvalidValue {
                name: env::TOKEN_TTL_SECS,
                reason: format!("not a number of seconds: {ttl}"),
            })?;
            config.auth.token_ttl = Duration::from_secs(secs);
        }
        if let Some(key) = lookup(env::ENCRYPTION_KEY) {
            config.encryption.key = key;
        }
        if let Some(prefixes) = lookup(env::EXEMPT_PREFIXES) {
            config.auth.exempt_prefixes = split_list(&prefixes);
        }
        if let Some(origins) = lookup(env::CORS_ORIGINS) {
            config.cors.allowed_origins = split_list(&origins);
        }

        Ok(config)
    }

    /// Validate configuration. Any error here must abort startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token_secret.is_empty() {
            return Err(ConfigError::MissingValue("auth.token_secret"));
        }
        if self.auth.token_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue {
                name: "auth.token_secret",
                reason: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }
        if self.auth.token_ttl.as_secs() == 0 {
            return Err(ConfigError::InvalidValue {
                name: "auth.token_ttl",
                reason: "must be at least one second".into(),
            });
        }
        if self.auth.exempt_prefixes.iter().any(|p| !p.starts_with('/')) {
            return Err(ConfigError::InvalidValue {
                name: "auth.exempt_prefixes",
                reason: "every prefix must start with '/'".into(),
            });
        }
        if self.encryption.key.is_empty() {
            return Err(ConfigError::MissingValue("encryption.key"));
        }
        EncryptionCodec::from_key_material(&self.encryption.key)?;

        if self.cors.enabled && self.cors.allow_credentials {
            let wildcard = self
                .cors
                .allowed_origins
                .iter()
                .chain(&self.cors.allowed_headers)
                .any(|v| v == "*");
            if wildcard {
                return Err(ConfigError::InvalidValue {
                    name: "cors.allow_credentials",
                    reason: "cannot be combined with wildcard origins or headers".into(),
                });
            }
        }

        Ok(())
    }

    /// HTTP bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
        }
    }
}

/// Token and authentication gate configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC signing secret (required, at least 32 bytes)
    pub token_secret: String,
    /// Lifetime of issued tokens
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,
    /// Path prefixes that bypass the authentication gate
    pub exempt_prefixes: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            token_ttl: Duration::from_secs(24 * 60 * 60),
            exempt_prefixes: vec![
                "/api/auth/".to_string(),
                "/api/health".to_string(),
                "/swagger-ui/".to_string(),
                "/v3/api-docs".to_string(),
            ],
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("exempt_prefixes", &self.exempt_prefixes)
            .finish()
    }
}

/// Note content encryption configuration
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    /// AES key: raw text, or `base64:` followed by standard base64
    pub key: String,
}

impl std::fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers ("*" for all)
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache
    pub max_age: u64,
    /// Allow credentials
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_headers: vec!["*".to_string()],
            max_age: 3600,
            allow_credentials: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// A required value was not provided
    #[error("missing required configuration: {0}")]
    MissingValue(&'static str),
    /// A value was provided but is unusable
    #[error("invalid configuration {name}: {reason}")]
    InvalidValue {
        /// Setting name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },
    /// Key material rejected by a codec
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Humantime serde module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else if let Some(hours) = s.strip_suffix('h') {
            hours
                .trim()
                .parse::<u64>()
                .map(|h| Duration::from_secs(h * 3600))
                .map_err(|_| "invalid hours")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
