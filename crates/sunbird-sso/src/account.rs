//! Lifecycle of federated accounts.
//!
//! Every operation takes a plain user id, validates it and maps it to the
//! federated id before any call reaches the provider. A blank id therefore
//! never costs a network round trip.

use std::fmt;
use std::sync::Arc;

use crate::SsoResult;
use crate::config::SsoSettings;
use crate::error::SsoError;
use crate::federation::{self, FederatedUserId};
use crate::provider::{
    CredentialRepresentation, ProviderError, RequiredAction, UserAdmin, UserRepresentation,
};
use crate::translate;

/// Enables, disables, removes and updates federated accounts.
pub struct AccountStateManager {
    settings: Arc<dyn SsoSettings>,
    admin: Arc<dyn UserAdmin>,
}

impl AccountStateManager {
    /// Creates a manager using `admin` for provider calls.
    #[must_use]
    pub fn new(settings: Arc<dyn SsoSettings>, admin: Arc<dyn UserAdmin>) -> Self {
        Self { settings, admin }
    }

    /// Maps a plain user id to its federated id.
    ///
    /// # Errors
    ///
    /// `InvalidUserData` for a blank or malformed id, `Configuration` when
    /// no federation provider id is configured.
    pub fn federated_user_id(&self, user_id: &str) -> SsoResult<FederatedUserId> {
        let provider_id = self.settings.federation_provider_id().unwrap_or_default();
        federation::encode(&provider_id, user_id)
    }

    /// Enables the account.
    ///
    /// # Errors
    ///
    /// See [`set_enabled`](Self::set_enabled).
    pub async fn activate_user(&self, user_id: &str) -> SsoResult<()> {
        self.set_enabled(user_id, true).await
    }

    /// Disables the account.
    ///
    /// # Errors
    ///
    /// See [`set_enabled`](Self::set_enabled).
    pub async fn deactivate_user(&self, user_id: &str) -> SsoResult<()> {
        self.set_enabled(user_id, false).await
    }

    /// Fetches the user and writes it back with `enabled` set.
    ///
    /// # Errors
    ///
    /// `InvalidUserData` for a blank id or when the provider rejects either
    /// call, `Configuration` when realm or provider id are missing.
    pub async fn set_enabled(&self, user_id: &str, enabled: bool) -> SsoResult<()> {
        let (realm, federated_id) = self.resolve(user_id)?;
        tracing::info!(user_id = %federated_id, enabled, "Updating account status");

        self.write_enabled(&realm, &federated_id, enabled)
            .await
            .map_err(|e| translate::to_invalid_user_data("set_enabled", &e))
    }

    /// Deletes the account. An account that does not exist counts as removed.
    ///
    /// # Errors
    ///
    /// `InvalidUserData` for a blank id or any other provider fault,
    /// `Configuration` when realm or provider id are missing.
    pub async fn remove_user(&self, user_id: &str) -> SsoResult<()> {
        let (realm, federated_id) = self.resolve(user_id)?;
        tracing::info!(user_id = %federated_id, "Removing account");

        match self.admin.remove_user(&realm, &federated_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::info!(user_id = %federated_id, "Account already absent");
                Ok(())
            }
            Err(e) => Err(translate::to_invalid_user_data("remove_user", &e)),
        }
    }

    /// Replaces the account's password.
    ///
    /// Returns `Ok(false)` when the provider rejects the change; the reason
    /// is logged.
    ///
    /// # Errors
    ///
    /// `InvalidUserData` for a blank id, `Configuration` when realm or
    /// provider id are missing.
    pub async fn reset_password(&self, user_id: &str, password: &str) -> SsoResult<bool> {
        let (realm, federated_id) = self.resolve(user_id)?;
        let credential = CredentialRepresentation::password(password);

        match self
            .admin
            .reset_password(&realm, &federated_id, &credential)
            .await
        {
            Ok(()) => {
                tracing::info!(user_id = %federated_id, "Password reset");
                Ok(true)
            }
            Err(e) => {
                translate::log_client_error(&e);
                tracing::error!(user_id = %federated_id, error = %e, "Password reset failed");
                Ok(false)
            }
        }
    }

    /// Replaces the account's required actions with `action`.
    ///
    /// # Errors
    ///
    /// `InvalidUserData` for a blank id, `Configuration` when realm or
    /// provider id are missing, and provider faults unchanged as
    /// [`SsoError::Provider`].
    pub async fn set_required_action(
        &self,
        user_id: &str,
        action: &RequiredAction,
    ) -> SsoResult<()> {
        let (realm, federated_id) = self.resolve(user_id)?;
        tracing::info!(user_id = %federated_id, action = %action, "Setting required action");

        let mut user = self.admin.get_user(&realm, &federated_id).await?;
        user.required_actions = Some(vec![action.to_string()]);
        self.admin.update_user(&realm, &federated_id, &user).await?;
        Ok(())
    }

    fn resolve(&self, user_id: &str) -> SsoResult<(String, FederatedUserId)> {
        let federated_id = self.federated_user_id(user_id)?;
        let realm = self
            .settings
            .realm()
            .ok_or_else(|| SsoError::configuration("realm is not configured"))?;
        Ok((realm, federated_id))
    }

    async fn write_enabled(
        &self,
        realm: &str,
        federated_id: &FederatedUserId,
        enabled: bool,
    ) -> Result<(), ProviderError> {
        let mut user: UserRepresentation = self.admin.get_user(realm, federated_id).await?;
        user.enabled = Some(enabled);
        self.admin.update_user(realm, federated_id, &user).await
    }
}

impl fmt::Debug for AccountStateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountStateManager").finish_non_exhaustive()
    }
}
