//! Translation of identity provider faults.
//!
//! Client errors from the admin API carry a JSON body such as
//! `{"error":"invalid_grant","error_description":"Invalid user credentials"}`
//! or `{"errorMessage":"User exists with same username"}`. Those details are
//! logged here as structured fields and never reach callers.

use serde::Deserialize;

use crate::error::SsoError;
use crate::provider::ProviderError;

/// Error payload of a rejected admin API call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderErrorBody {
    /// OAuth error code.
    #[serde(default)]
    pub error: Option<String>,

    /// Message reported by the admin API.
    #[serde(default, rename = "errorMessage")]
    pub error_message: Option<String>,

    /// Human readable description.
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Logs the details of a provider client error.
///
/// Returns the parsed body for 4xx responses whose body is JSON. Any other
/// fault yields `None`; a body that fails to parse is logged, never raised.
pub fn log_client_error(err: &ProviderError) -> Option<ProviderErrorBody> {
    let ProviderError::Http {
        status,
        reason,
        body,
    } = err
    else {
        return None;
    };
    if !err.is_client_error() {
        return None;
    }

    match serde_json::from_str::<ProviderErrorBody>(body) {
        Ok(parsed) => {
            tracing::info!(
                status = *status,
                reason = %reason,
                error = parsed.error.as_deref().unwrap_or_default(),
                error_message = parsed.error_message.as_deref().unwrap_or_default(),
                error_description = parsed.error_description.as_deref().unwrap_or_default(),
                "Identity provider rejected request"
            );
            Some(parsed)
        }
        Err(e) => {
            tracing::info!(status = *status, reason = %reason, "Identity provider rejected request");
            tracing::error!(error = %e, "Failed to parse identity provider error body");
            None
        }
    }
}

/// Maps a provider fault of an account operation to `InvalidUserData`.
pub(crate) fn to_invalid_user_data(operation: &str, err: &ProviderError) -> SsoError {
    log_client_error(err);
    tracing::error!(operation, error = %err, "Account operation failed");
    SsoError::invalid_user_data(format!("{operation} was rejected by the identity provider"))
}
