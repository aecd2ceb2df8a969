//! Identity provider admin API.
//!
//! [`UserAdmin`] is the seam between account lifecycle logic and the
//! provider's REST API:
//!
//! - [`KeycloakAdminClient`] talks to a real Keycloak server
//! - [`InMemoryUserAdmin`] keeps users in memory for tests and local runs

mod error;
mod keycloak;
mod memory;
mod types;

use async_trait::async_trait;

use crate::federation::FederatedUserId;

pub use error::ProviderError;
pub use keycloak::KeycloakAdminClient;
pub use memory::InMemoryUserAdmin;
pub use types::{CredentialRepresentation, RequiredAction, UserRepresentation};

/// User administration operations against a realm.
///
/// Implementations must be thread-safe. No method retries on failure.
#[async_trait]
pub trait UserAdmin: Send + Sync {
    /// Fetches the user record.
    async fn get_user(
        &self,
        realm: &str,
        user_id: &FederatedUserId,
    ) -> Result<UserRepresentation, ProviderError>;

    /// Replaces the user record.
    async fn update_user(
        &self,
        realm: &str,
        user_id: &FederatedUserId,
        user: &UserRepresentation,
    ) -> Result<(), ProviderError>;

    /// Deletes the user.
    async fn remove_user(&self, realm: &str, user_id: &FederatedUserId)
    -> Result<(), ProviderError>;

    /// Replaces the user's password credential.
    async fn reset_password(
        &self,
        realm: &str,
        user_id: &FederatedUserId,
        credential: &CredentialRepresentation,
    ) -> Result<(), ProviderError>;
}
