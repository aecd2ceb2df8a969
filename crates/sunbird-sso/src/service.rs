//! Wiring of the verifier and account manager from configuration.

use std::fmt;
use std::sync::Arc;

use crate::SsoResult;
use crate::account::AccountStateManager;
use crate::config::{EnvSettings, LayeredSettings, SsoConfig, SsoSettings};
use crate::error::SsoError;
use crate::key_cache::PublicKeyCache;
use crate::provider::{KeycloakAdminClient, UserAdmin};
use crate::token::{TokenVerifier, VerificationOptions};

/// Token verification and account lifecycle over one set of settings.
pub struct SsoService {
    settings: Arc<dyn SsoSettings>,
    keys: Arc<PublicKeyCache>,
    verifier: TokenVerifier,
    accounts: AccountStateManager,
}

impl SsoService {
    /// Creates a service reading `settings` and calling `admin`.
    #[must_use]
    pub fn new(
        settings: Arc<dyn SsoSettings>,
        admin: Arc<dyn UserAdmin>,
        options: VerificationOptions,
    ) -> Self {
        let keys = Arc::new(PublicKeyCache::new(Arc::clone(&settings)));
        let verifier =
            TokenVerifier::new(Arc::clone(&settings), Arc::clone(&keys)).with_options(options);
        let accounts = AccountStateManager::new(Arc::clone(&settings), admin);

        Self {
            settings,
            keys,
            verifier,
            accounts,
        }
    }

    /// Creates a service backed by Keycloak.
    ///
    /// Legacy environment variables (`sunbird_sso_url`, `sunbird_sso_realm`,
    /// ...) take precedence over `config`.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the admin client cannot be built from the
    /// resolved SSO URL.
    pub fn from_config(config: &SsoConfig) -> SsoResult<Self> {
        let settings: Arc<dyn SsoSettings> = Arc::new(
            LayeredSettings::new()
                .with_layer(Arc::new(EnvSettings))
                .with_layer(Arc::new(config.clone())),
        );

        let url = settings
            .sso_url()
            .ok_or_else(|| SsoError::configuration("SSO URL is not configured"))?;
        let admin = KeycloakAdminClient::new(&url, config.admin.clone())
            .map_err(|e| SsoError::configuration(e.to_string()))?;

        tracing::debug!(url = %url, realm = ?settings.realm(), "SSO service configured");

        Ok(Self::new(
            settings,
            Arc::new(admin),
            VerificationOptions::from(&config.token),
        ))
    }

    /// Verifies `token` and returns the plain user id.
    ///
    /// # Errors
    ///
    /// See [`TokenVerifier::verify`].
    pub fn verify_token(&self, token: &str) -> SsoResult<String> {
        self.verifier.verify(token)
    }

    /// Effective settings.
    #[must_use]
    pub fn settings(&self) -> &Arc<dyn SsoSettings> {
        &self.settings
    }

    /// Realm public key cache.
    #[must_use]
    pub fn public_keys(&self) -> &Arc<PublicKeyCache> {
        &self.keys
    }

    /// Token verifier.
    #[must_use]
    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Account lifecycle operations.
    #[must_use]
    pub fn accounts(&self) -> &AccountStateManager {
        &self.accounts
    }
}

impl fmt::Debug for SsoService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsoService")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}
