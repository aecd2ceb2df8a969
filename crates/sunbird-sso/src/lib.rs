//! # sunbird-sso
//!
//! Keycloak integration for the Sunbird platform.
//!
//! This crate provides:
//! - Verification of realm-issued access tokens against the realm public key
//! - Mapping between plain user ids and federated provider ids
//! - Account lifecycle operations (enable, disable, remove, password reset,
//!   required actions) over the Keycloak admin REST API
//! - Logging translation of provider error payloads
//!
//! ## Modules
//!
//! - [`config`] - Settings lookup and file/environment configuration
//! - [`key_cache`] - Realm public key resolution and caching
//! - [`token`] - Access token verification
//! - [`federation`] - Federated user id encoding
//! - [`account`] - Account lifecycle operations
//! - [`provider`] - Admin API clients
//! - [`translate`] - Provider error logging and translation
//! - [`service`] - Wiring of all of the above

pub mod account;
pub mod config;
pub mod error;
pub mod federation;
pub mod key_cache;
pub mod provider;
pub mod service;
pub mod token;
pub mod translate;

#[cfg(test)]
mod testutil;

pub use account::AccountStateManager;
pub use config::{
    AdminConfig, ConfigError, EnvSettings, LayeredSettings, SsoConfig, SsoSettings,
    StaticSettings, TokenConfig,
};
pub use error::{ErrorCategory, SsoError};
pub use federation::FederatedUserId;
pub use key_cache::{KeyError, PublicKeyCache, PublicKeyMaterial};
pub use provider::{
    CredentialRepresentation, InMemoryUserAdmin, KeycloakAdminClient, ProviderError,
    RequiredAction, UserAdmin, UserRepresentation,
};
pub use service::SsoService;
pub use token::{AccessTokenClaims, TokenVerifier, VerificationOptions};
pub use translate::ProviderErrorBody;

/// Type alias for SSO operation results.
pub type SsoResult<T> = Result<T, SsoError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use sunbird_sso::prelude::*;
/// ```
pub mod prelude {
    pub use crate::SsoResult;
    pub use crate::account::AccountStateManager;
    pub use crate::config::{SsoConfig, SsoSettings};
    pub use crate::error::{ErrorCategory, SsoError};
    pub use crate::provider::{RequiredAction, UserAdmin};
    pub use crate::service::SsoService;
    pub use crate::token::TokenVerifier;
}
