//! Keycloak admin API representations.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A user record as returned by the admin API.
///
/// Only the fields this crate reads or writes are typed; everything else is
/// kept in `extra` so a fetched record can be written back unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    /// Provider-side id (the federated id for federated users).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Login name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Whether the account may log in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Actions the user must complete on next login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_actions: Option<Vec<String>>,

    /// All other attributes, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserRepresentation {
    /// Returns `true` if the account is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }
}

/// A credential update.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialRepresentation {
    /// Credential type, e.g. `password`.
    #[serde(rename = "type")]
    pub credential_type: String,

    /// Secret value.
    pub value: String,

    /// Whether the user has to change it on next login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary: Option<bool>,
}

impl CredentialRepresentation {
    /// Credential type of passwords.
    pub const PASSWORD: &'static str = "password";

    /// Creates a password credential.
    #[must_use]
    pub fn password(value: impl Into<String>) -> Self {
        Self {
            credential_type: Self::PASSWORD.to_string(),
            value: value.into(),
            temporary: None,
        }
    }
}

impl fmt::Debug for CredentialRepresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRepresentation")
            .field("credential_type", &self.credential_type)
            .field("value", &"[REDACTED]")
            .field("temporary", &self.temporary)
            .finish()
    }
}

/// A required action forced on the user's next login.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequiredAction {
    /// `VERIFY_EMAIL`
    VerifyEmail,
    /// `UPDATE_PASSWORD`
    UpdatePassword,
    /// `UPDATE_PROFILE`
    UpdateProfile,
    /// `CONFIGURE_TOTP`
    ConfigureTotp,
    /// `TERMS_AND_CONDITIONS`
    TermsAndConditions,
    /// Any other provider-defined action alias.
    Custom(String),
}

impl RequiredAction {
    /// Returns the provider alias.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::VerifyEmail => "VERIFY_EMAIL",
            Self::UpdatePassword => "UPDATE_PASSWORD",
            Self::UpdateProfile => "UPDATE_PROFILE",
            Self::ConfigureTotp => "CONFIGURE_TOTP",
            Self::TermsAndConditions => "TERMS_AND_CONDITIONS",
            Self::Custom(alias) => alias,
        }
    }
}

impl fmt::Display for RequiredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequiredAction {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "VERIFY_EMAIL" => Self::VerifyEmail,
            "UPDATE_PASSWORD" => Self::UpdatePassword,
            "UPDATE_PROFILE" => Self::UpdateProfile,
            "CONFIGURE_TOTP" => Self::ConfigureTotp,
            "TERMS_AND_CONDITIONS" => Self::TermsAndConditions,
            _ => Self::Custom(s.trim().to_string()),
        })
    }
}

impl From<&str> for RequiredAction {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(action) => action,
            Err(never) => match never {},
        }
    }
}
