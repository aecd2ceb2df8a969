//! SSO configuration.
//!
//! Two layers live here:
//!
//! - [`SsoSettings`] - named string values (realm public key, SSO base URL,
//!   realm name, federation provider id) read at call time. Nothing but the
//!   parsed public key is ever cached from these.
//! - [`SsoConfig`] - the structured configuration for the admin client and
//!   token verification options, loaded from TOML and environment through
//!   [`loader::load_config`].
//!
//! # Example (TOML)
//!
//! ```toml
//! url = "https://sso.example.org/auth"
//! realm = "sunbird"
//! federation_provider_id = "cassandrafederationid"
//!
//! [token]
//! clock_skew = "0s"
//!
//! [admin]
//! client_id = "admin-api"
//! request_timeout = "30s"
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Well-known setting names.
pub mod keys {
    /// Base64 X.509 SubjectPublicKeyInfo of the realm signing key.
    pub const PUBLIC_KEY: &str = "sunbird_sso_publickey";
    /// Base URL of the SSO server, e.g. `https://sso.example.org/auth`.
    pub const SSO_URL: &str = "sunbird_sso_url";
    /// Realm holding the federated users.
    pub const REALM: &str = "sunbird_sso_realm";
    /// User federation provider id embedded in federated user ids.
    pub const FEDERATION_PROVIDER_ID: &str = "sunbird_keycloak_user_federation_provider_id";
}

/// Source of named configuration values, consulted on every call.
///
/// Blank values are reported as absent.
pub trait SsoSettings: Send + Sync {
    /// Returns the raw value for `key`, if set.
    fn get(&self, key: &str) -> Option<String>;

    /// Base64 encoded realm public key.
    fn public_key(&self) -> Option<String> {
        self.get(keys::PUBLIC_KEY)
    }

    /// SSO base URL.
    fn sso_url(&self) -> Option<String> {
        self.get(keys::SSO_URL)
    }

    /// Realm name.
    fn realm(&self) -> Option<String> {
        self.get(keys::REALM)
    }

    /// Federation provider id.
    fn federation_provider_id(&self) -> Option<String> {
        self.get(keys::FEDERATION_PROVIDER_ID)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Settings read live from the process environment.
///
/// Looks up the key as given, then upper-cased.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSettings;

impl SsoSettings for EnvSettings {
    fn get(&self, key: &str) -> Option<String> {
        non_blank(std::env::var(key).ok())
            .or_else(|| non_blank(std::env::var(key.to_ascii_uppercase()).ok()))
    }
}

/// Mutable in-memory settings.
#[derive(Debug, Default)]
pub struct StaticSettings {
    values: RwLock<HashMap<String, String>>,
}

impl StaticSettings {
    /// Creates empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, builder style.
    #[must_use]
    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets or replaces a value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// Removes a value.
    pub fn remove(&self, key: &str) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

impl SsoSettings for StaticSettings {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        non_blank(values.get(key).cloned())
    }
}

/// Ordered stack of settings sources; the first one holding a value wins.
#[derive(Clone, Default)]
pub struct LayeredSettings {
    layers: Vec<Arc<dyn SsoSettings>>,
}

impl LayeredSettings {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a lower-priority layer.
    #[must_use]
    pub fn with_layer(mut self, layer: Arc<dyn SsoSettings>) -> Self {
        self.layers.push(layer);
        self
    }
}

impl SsoSettings for LayeredSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }
}

/// Root SSO configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SsoConfig {
    /// SSO base URL (without the `/realms/...` suffix).
    pub url: String,

    /// Realm holding the federated users.
    pub realm: String,

    /// User federation provider id.
    pub federation_provider_id: String,

    /// Base64 X.509 public key of the realm. Usually supplied through the
    /// environment instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,

    /// Access token verification options.
    pub token: TokenConfig,

    /// Admin REST API client configuration.
    pub admin: AdminConfig,
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/auth".to_string(),
            realm: "sunbird".to_string(),
            federation_provider_id: String::new(),
            public_key: None,
            token: TokenConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl SsoSettings for SsoConfig {
    fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            keys::PUBLIC_KEY => self.public_key.clone(),
            keys::SSO_URL => Some(self.url.clone()),
            keys::REALM => Some(self.realm.clone()),
            keys::FEDERATION_PROVIDER_ID => Some(self.federation_provider_id.clone()),
            _ => None,
        };
        non_blank(value)
    }
}

/// Upper bound for [`TokenConfig::clock_skew`].
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(3600);

/// Access token verification options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Leeway applied to `exp` and `nbf`.
    #[serde(with = "humantime_serde")]
    pub clock_skew: Duration,

    /// Require the `typ` claim to be `Bearer`.
    pub check_token_type: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            clock_skew: Duration::ZERO,
            check_token_type: true,
        }
    }
}

/// Admin REST API client configuration.
///
/// When `username` and `password` are both set the password grant is used,
/// otherwise client credentials.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Realm the admin client authenticates against.
    pub realm: String,

    /// Admin client id.
    pub client_id: String,

    /// Admin client secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Admin username for the password grant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Admin password for the password grant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// HTTP request timeout.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Admin tokens are refreshed this long before they expire.
    #[serde(with = "humantime_serde")]
    pub token_refresh_skew: Duration,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            realm: "master".to_string(),
            client_id: "admin-cli".to_string(),
            client_secret: None,
            username: None,
            password: None,
            request_timeout: Duration::from_secs(30),
            token_refresh_skew: Duration::from_secs(30),
        }
    }
}

impl AdminConfig {
    /// Returns `true` if the password grant should be used.
    #[must_use]
    pub fn uses_password_grant(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Checks that a usable grant is configured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if only one of `username`/`password` is set, or
    /// client credentials are selected without a client secret.
    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        if self.username.is_some() != self.password.is_some() {
            return Err(ConfigError::InvalidValue(
                "admin.username and admin.password must be set together".to_string(),
            ));
        }

        if !self.uses_password_grant() && self.client_secret.is_none() {
            return Err(ConfigError::Missing(
                "admin.client_secret (required for client_credentials)".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),

    /// The configuration sources could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl SsoConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `url`, `realm` or `admin.client_id` is empty
    /// - `url` is not an absolute URL
    /// - `admin.request_timeout` is zero
    ///
    /// Admin credentials are checked separately by
    /// [`AdminConfig::validate_credentials`], since token verification
    /// does not need them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Missing("url".to_string()));
        }

        url::Url::parse(&self.url)
            .map_err(|e| ConfigError::InvalidValue(format!("url '{}': {}", self.url, e)))?;

        if self.realm.trim().is_empty() {
            return Err(ConfigError::Missing("realm".to_string()));
        }

        if self.token.clock_skew > MAX_CLOCK_SKEW {
            return Err(ConfigError::InvalidValue(format!(
                "token.clock_skew must be at most {}s",
                MAX_CLOCK_SKEW.as_secs()
            )));
        }

        if self.admin.client_id.trim().is_empty() {
            return Err(ConfigError::Missing("admin.client_id".to_string()));
        }

        if self.admin.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "admin.request_timeout must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

pub mod loader {
    //! File and environment configuration loading.

    use std::path::PathBuf;

    use ::config::{Config, Environment, File};

    use super::{ConfigError, SsoConfig};

    /// Default configuration file, looked up in the working directory.
    pub const DEFAULT_CONFIG_PATH: &str = "sunbird-sso.toml";

    /// Environment variable prefix, e.g. `SUNBIRD_SSO__ADMIN__CLIENT_ID`.
    pub const ENV_PREFIX: &str = "SUNBIRD_SSO";

    /// Loads and validates the configuration.
    ///
    /// The file is optional; environment variables override it.
    ///
    /// # Errors
    ///
    /// Returns an error if the sources cannot be read or the merged
    /// configuration is invalid.
    pub fn load_config(path: Option<&str>) -> Result<SsoConfig, ConfigError> {
        let mut builder = Config::builder();
        let path = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let merged: SsoConfig = builder
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        merged.validate()?;
        Ok(merged)
    }
}
