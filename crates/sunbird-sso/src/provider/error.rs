//! Errors returned by identity provider clients.

use reqwest::StatusCode;

/// Errors that can occur while calling the identity provider.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status.
    #[error("Identity provider returned HTTP {status} {reason}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        reason: String,
        /// Raw response body.
        body: String,
    },

    /// The request could not be sent or the response not received.
    #[error("Identity provider request failed: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("Failed to decode identity provider response: {0}")]
    Decode(String),

    /// The admin client could not authenticate.
    #[error("Identity provider admin authentication failed: {0}")]
    Authentication(String),
}

impl ProviderError {
    /// Creates an `Http` error, filling in the canonical reason phrase.
    #[must_use]
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        let reason = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default();

        Self::Http {
            status,
            reason: reason.to_string(),
            body: body.into(),
        }
    }

    /// Returns the HTTP status, if the provider answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for 4xx responses.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` for 404 responses.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
