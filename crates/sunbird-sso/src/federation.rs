//! Federated user id encoding.
//!
//! Users backed by a Keycloak user storage provider are addressed inside
//! the realm as `f:<provider-id>:<user-id>`. Callers of this crate only ever
//! see the plain user id.
//!
//! # Example
//!
//! ```ignore
//! use sunbird_sso::federation::{encode, decode_subject};
//!
//! let federated = encode("cassandrafederationid", "user-42")?;
//! assert_eq!(federated.as_str(), "f:cassandrafederationid:user-42");
//! assert_eq!(decode_subject(federated.as_str()), "user-42");
//! ```

use std::fmt;

use serde::Serialize;

use crate::error::SsoError;

/// Tag opening every federated user id.
pub const FEDERATION_TAG: &str = "f";

/// Separator between the tag, provider id and user id.
pub const DELIMITER: char = ':';

/// A provider-internal user id of the form `f:<provider-id>:<user-id>`.
///
/// Only [`encode`] constructs one, so every value passed its checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FederatedUserId(String);

impl FederatedUserId {
    /// Returns the full federated id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the plain user id embedded in this id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        decode_subject(&self.0)
    }
}

impl fmt::Display for FederatedUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FederatedUserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Builds the federated id for a plain user id.
///
/// # Errors
///
/// Returns `InvalidUserData` if the user id is blank or contains the
/// delimiter (it could not be decoded back unambiguously), and
/// `Configuration` if the provider id is blank or contains the delimiter.
pub fn encode(provider_id: &str, user_id: &str) -> Result<FederatedUserId, SsoError> {
    if user_id.trim().is_empty() {
        return Err(SsoError::invalid_user_data("user id is blank"));
    }
    if user_id.contains(DELIMITER) {
        return Err(SsoError::invalid_user_data(format!(
            "user id must not contain '{DELIMITER}'"
        )));
    }
    if provider_id.trim().is_empty() {
        return Err(SsoError::configuration(
            "federation provider id is not configured",
        ));
    }
    if provider_id.contains(DELIMITER) {
        return Err(SsoError::configuration(format!(
            "federation provider id must not contain '{DELIMITER}'"
        )));
    }

    Ok(FederatedUserId(format!(
        "{FEDERATION_TAG}{DELIMITER}{provider_id}{DELIMITER}{user_id}"
    )))
}

/// Extracts the plain user id from a token subject.
///
/// Everything after the last delimiter is returned; subjects without a
/// delimiter are returned unchanged, so tokens whose subject was never
/// federated still resolve.
#[must_use]
pub fn decode_subject(subject: &str) -> &str {
    match subject.rfind(DELIMITER) {
        Some(pos) => &subject[pos + DELIMITER.len_utf8()..],
        None => subject,
    }
}
