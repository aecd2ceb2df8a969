//! Error types for token verification and account lifecycle operations.
//!
//! Callers only ever see the kind of failure. Provider payloads, signature
//! errors and parse failures are logged where they happen and dropped.

use std::fmt;

use crate::provider::ProviderError;

/// Public message carried by every [`SsoError::Unauthorized`].
pub const UNAUTHORIZED_MESSAGE: &str = "You are not authorized.";

/// Errors surfaced by the SSO integration layer.
#[derive(Debug, thiserror::Error)]
pub enum SsoError {
    /// The access token failed verification (signature, issuer, expiry,
    /// activity or type).
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Public description, never derived from the token contents.
        message: String,
    },

    /// Required configuration (signing key, realm, base URL, federation
    /// provider id) could not be resolved.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the missing or malformed value.
        message: String,
    },

    /// The user id was blank or malformed, or the provider rejected the
    /// account operation.
    #[error("Invalid user data: {message}")]
    InvalidUserData {
        /// Description of why the user data is invalid.
        message: String,
    },

    /// A provider fault passed through untranslated.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl SsoError {
    /// Creates an `Unauthorized` error with the fixed public message.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::Unauthorized {
            message: UNAUTHORIZED_MESSAGE.to_string(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidUserData` error.
    #[must_use]
    pub fn invalid_user_data(message: impl Into<String>) -> Self {
        Self::InvalidUserData {
            message: message.into(),
        }
    }

    /// Returns `true` if the token was rejected.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` if no request can succeed until configuration changes.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns `true` if the user data was rejected.
    #[must_use]
    pub fn is_invalid_user_data(&self) -> bool {
        matches!(self, Self::InvalidUserData { .. })
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. } => ErrorCategory::Authentication,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::InvalidUserData { .. } => ErrorCategory::Validation,
            Self::Provider(_) => ErrorCategory::Provider,
        }
    }
}

/// Categories of SSO errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Token verification failures.
    Authentication,
    /// Missing or malformed configuration.
    Configuration,
    /// Rejected user data.
    Validation,
    /// Untranslated identity provider faults.
    Provider,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Configuration => write!(f, "configuration"),
            Self::Validation => write!(f, "validation"),
            Self::Provider => write!(f, "provider"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SsoError::unauthorized();
        assert_eq!(err.to_string(), "Unauthorized: You are not authorized.");

        let err = SsoError::configuration("signing key unavailable");
        assert_eq!(
            err.to_string(),
            "Configuration error: signing key unavailable"
        );

        let err = SsoError::invalid_user_data("user id is blank");
        assert_eq!(err.to_string(), "Invalid user data: user id is blank");
    }

    #[test]
    fn test_provider_error_is_transparent() {
        let err = SsoError::from(ProviderError::http(404, "{}"));
        assert_eq!(err.to_string(), ProviderError::http(404, "{}").to_string());
        assert_eq!(err.category(), ErrorCategory::Provider);
    }

    #[test]
    fn test_error_predicates() {
        assert!(SsoError::unauthorized().is_unauthorized());
        assert!(!SsoError::unauthorized().is_configuration_error());
        assert!(SsoError::configuration("x").is_configuration_error());
        assert!(SsoError::invalid_user_data("x").is_invalid_user_data());
        assert!(!SsoError::invalid_user_data("x").is_unauthorized());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            SsoError::unauthorized().category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            SsoError::configuration("x").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            SsoError::invalid_user_data("x").category(),
            ErrorCategory::Validation
        );
        assert_eq!(ErrorCategory::Provider.to_string(), "provider");
    }
}
