//! Keycloak admin REST API client.
//!
//! Endpoints used, relative to the SSO base URL:
//!
//! - `POST /realms/{admin_realm}/protocol/openid-connect/token`
//! - `GET|PUT|DELETE /admin/realms/{realm}/users/{id}`
//! - `PUT /admin/realms/{realm}/users/{id}/reset-password`
//!
//! The admin access token is cached until shortly before it expires and is
//! dropped when the server answers 401. Requests are never retried.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use url::Url;

use super::{CredentialRepresentation, ProviderError, UserAdmin, UserRepresentation};
use crate::config::{AdminConfig, SsoConfig};
use crate::federation::FederatedUserId;

/// Lifetime assumed when the token response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct AdminTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// [`UserAdmin`] backed by the Keycloak admin REST API.
pub struct KeycloakAdminClient {
    http_client: reqwest::Client,
    base_url: Url,
    config: AdminConfig,
    token: RwLock<Option<CachedToken>>,
}

impl KeycloakAdminClient {
    /// Creates a client for the SSO server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute URL or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, config: AdminConfig) -> Result<Self, ProviderError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ProviderError::Transport(format!("invalid SSO URL '{base_url}': {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::Transport(format!(
                "SSO URL '{base_url}' cannot be used as a base"
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            config,
            token: RwLock::new(None),
        })
    }

    /// Creates a client from the `url` and `admin` sections of `config`.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn from_config(config: &SsoConfig) -> Result<Self, ProviderError> {
        Self::new(&config.url, config.admin.clone())
    }

    /// SSO base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Drops the cached admin token.
    pub async fn invalidate_token(&self) {
        self.token.write().await.take();
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                ProviderError::Transport(format!(
                    "SSO URL '{}' cannot be used as a base",
                    self.base_url
                ))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn user_endpoint(
        &self,
        realm: &str,
        user_id: &FederatedUserId,
        suffix: Option<&str>,
    ) -> Result<Url, ProviderError> {
        let mut segments = vec!["admin", "realms", realm, "users", user_id.as_str()];
        segments.extend(suffix);
        self.endpoint(&segments)
    }

    async fn admin_token(&self) -> Result<String, ProviderError> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref()
                && Instant::now() < token.expires_at
            {
                return Ok(token.access_token.clone());
            }
        }

        let mut cached = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.expires_at
        {
            return Ok(token.access_token.clone());
        }

        let fresh = self.request_admin_token().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn request_admin_token(&self) -> Result<CachedToken, ProviderError> {
        let url = self.endpoint(&[
            "realms",
            self.config.realm.as_str(),
            "protocol",
            "openid-connect",
            "token",
        ])?;

        let mut form = vec![("client_id", self.config.client_id.as_str())];
        match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) => {
                form.push(("grant_type", "password"));
                form.push(("username", username.as_str()));
                form.push(("password", password.as_str()));
            }
            _ => {
                if self.config.client_secret.is_none() {
                    return Err(ProviderError::Authentication(
                        "client_credentials grant requires a client secret".to_string(),
                    ));
                }
                form.push(("grant_type", "client_credentials"));
            }
        }
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        tracing::debug!(
            realm = %self.config.realm,
            client_id = %self.config.client_id,
            "Requesting admin access token"
        );

        let response = self.http_client.post(url).form(&form).send().await?;
        if !response.status().is_success() {
            let err = error_from_response(response).await;
            tracing::warn!(error = %err, "Admin token request rejected");
            return Err(err);
        }

        let body: AdminTokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let lifetime = body
            .expires_in
            .map_or(DEFAULT_TOKEN_LIFETIME, Duration::from_secs)
            .saturating_sub(self.config.token_refresh_skew);

        Ok(CachedToken {
            access_token: body.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ProviderError> {
        let token = self.admin_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
        }
        Err(error_from_response(response).await)
    }
}

async fn error_from_response(response: Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ProviderError::Http {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
        body,
    }
}

#[async_trait]
impl UserAdmin for KeycloakAdminClient {
    async fn get_user(
        &self,
        realm: &str,
        user_id: &FederatedUserId,
    ) -> Result<UserRepresentation, ProviderError> {
        let url = self.user_endpoint(realm, user_id, None)?;
        tracing::debug!(realm, user_id = %user_id, "Fetching user");

        let response = self.send(self.http_client.get(url)).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    async fn update_user(
        &self,
        realm: &str,
        user_id: &FederatedUserId,
        user: &UserRepresentation,
    ) -> Result<(), ProviderError> {
        let url = self.user_endpoint(realm, user_id, None)?;
        tracing::debug!(realm, user_id = %user_id, "Updating user");

        self.send(self.http_client.put(url).json(user)).await?;
        Ok(())
    }

    async fn remove_user(
        &self,
        realm: &str,
        user_id: &FederatedUserId,
    ) -> Result<(), ProviderError> {
        let url = self.user_endpoint(realm, user_id, None)?;
        tracing::debug!(realm, user_id = %user_id, "Removing user");

        self.send(self.http_client.delete(url)).await?;
        Ok(())
    }

    async fn reset_password(
        &self,
        realm: &str,
        user_id: &FederatedUserId,
        credential: &CredentialRepresentation,
    ) -> Result<(), ProviderError> {
        let url = self.user_endpoint(realm, user_id, Some("reset-password"))?;
        tracing::debug!(realm, user_id = %user_id, "Resetting password");

        self.send(self.http_client.put(url).json(credential)).await?;
        Ok(())
    }
}

impl std::fmt::Debug for KeycloakAdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakAdminClient")
            .field("base_url", &self.base_url.as_str())
            .field("realm", &self.config.realm)
            .field("client_id", &self.config.client_id)
            .finish_non_exhaustive()
    }
}
