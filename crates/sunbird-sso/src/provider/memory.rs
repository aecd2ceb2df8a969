//! In-memory [`UserAdmin`] backend.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{CredentialRepresentation, ProviderError, UserAdmin, UserRepresentation};
use crate::federation::FederatedUserId;

const USER_NOT_FOUND_BODY: &str = r#"{"error":"User not found"}"#;

type UserKey = (String, String);

/// Users kept in a concurrent map, keyed by realm and federated id.
///
/// A failure can be injected with [`fail_with`](Self::fail_with); every call
/// then returns that error until [`clear_failure`](Self::clear_failure).
#[derive(Debug, Default)]
pub struct InMemoryUserAdmin {
    users: DashMap<UserKey, UserRepresentation>,
    passwords: DashMap<UserKey, String>,
    failure: Mutex<Option<ProviderError>>,
    calls: AtomicUsize,
}

impl InMemoryUserAdmin {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `user` under `user_id`, filling in its `id`.
    pub fn insert_user(&self, realm: &str, user_id: &FederatedUserId, mut user: UserRepresentation) {
        user.id = Some(user_id.to_string());
        self.users.insert(key(realm, user_id), user);
    }

    /// Returns a copy of the stored user.
    #[must_use]
    pub fn user(&self, realm: &str, user_id: &FederatedUserId) -> Option<UserRepresentation> {
        self.users.get(&key(realm, user_id)).map(|u| u.clone())
    }

    /// Returns the last password set for the user.
    #[must_use]
    pub fn password(&self, realm: &str, user_id: &FederatedUserId) -> Option<String> {
        self.passwords.get(&key(realm, user_id)).map(|p| p.clone())
    }

    /// Makes every subsequent call fail with `error`.
    pub fn fail_with(&self, error: ProviderError) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    /// Removes an injected failure.
    pub fn clear_failure(&self) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Number of admin calls received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin_call(&self) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn key(realm: &str, user_id: &FederatedUserId) -> UserKey {
    (realm.to_string(), user_id.to_string())
}

fn not_found() -> ProviderError {
    ProviderError::http(404, USER_NOT_FOUND_BODY)
}

#[async_trait]
impl UserAdmin for InMemoryUserAdmin {
    async fn get_user(
        &self,
        realm: &str,
        user_id: &FederatedUserId,
    ) -> Result<UserRepresentation, ProviderError> {
        self.begin_call()?;
        self.user(realm, user_id).ok_or_else(not_found)
    }

    async fn update_user(
        &self,
        realm: &str,
        user_id: &FederatedUserId,
        user: &UserRepresentation,
    ) -> Result<(), ProviderError> {
        self.begin_call()?;
        let mut entry = self.users.get_mut(&key(realm, user_id)).ok_or_else(not_found)?;
        let mut updated = user.clone();
        updated.id = entry.id.clone();
        *entry = updated;
        Ok(())
    }

    async fn remove_user(
        &self,
        realm: &str,
        user_id: &FederatedUserId,
    ) -> Result<(), ProviderError> {
        self.begin_call()?;
        let key = key(realm, user_id);
        self.users.remove(&key).ok_or_else(not_found)?;
        self.passwords.remove(&key);
        Ok(())
    }

    async fn reset_password(
        &self,
        realm: &str,
        user_id: &FederatedUserId,
        credential: &CredentialRepresentation,
    ) -> Result<(), ProviderError> {
        self.begin_call()?;
        let key = key(realm, user_id);
        if !self.users.contains_key(&key) {
            return Err(not_found());
        }
        if credential.value.is_empty() {
            return Err(ProviderError::http(
                400,
                r#"{"error":"Empty password"}"#,
            ));
        }
        self.passwords.insert(key, credential.value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::federation::encode;

    fn user_id() -> FederatedUserId {
        encode("fed-1", "user-1").unwrap()
    }

    #[tokio::test]
    async fn test_get_and_update_user() {
        let admin = InMemoryUserAdmin::new();
        admin.insert_user("sunbird", &user_id(), UserRepresentation::default());

        let mut user = admin.get_user("sunbird", &user_id()).await.unwrap();
        assert_eq!(user.id.as_deref(), Some("f:fed-1:user-1"));

        user.enabled = Some(true);
        admin.update_user("sunbird", &user_id(), &user).await.unwrap();
        assert!(admin.user("sunbird", &user_id()).unwrap().is_enabled());
        assert_eq!(admin.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let admin = InMemoryUserAdmin::new();
        let err = admin.get_user("sunbird", &user_id()).await.unwrap_err();
        assert!(err.is_not_found());

        let err = admin.remove_user("sunbird", &user_id()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_realms_are_isolated() {
        let admin = InMemoryUserAdmin::new();
        admin.insert_user("sunbird", &user_id(), UserRepresentation::default());
        assert!(admin.get_user("other", &user_id()).await.is_err());
    }

    #[tokio::test]
    async fn test_reset_password() {
        let admin = InMemoryUserAdmin::new();
        admin.insert_user("sunbird", &user_id(), UserRepresentation::default());

        let credential = CredentialRepresentation::password("n3w");
        admin.reset_password("sunbird", &user_id(), &credential).await.unwrap();
        assert_eq!(admin.password("sunbird", &user_id()).as_deref(), Some("n3w"));

        let empty = CredentialRepresentation::password("");
        let err = admin.reset_password("sunbird", &user_id(), &empty).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let admin = InMemoryUserAdmin::new();
        admin.insert_user("sunbird", &user_id(), UserRepresentation::default());
        admin.fail_with(ProviderError::Transport("connection refused".to_string()));

        assert!(admin.get_user("sunbird", &user_id()).await.is_err());

        admin.clear_failure();
        assert!(admin.get_user("sunbird", &user_id()).await.is_ok());
        assert_eq!(admin.calls(), 2);
    }
}
