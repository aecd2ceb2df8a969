//! Access token verification.
//!
//! Tokens issued by the realm are verified against the cached realm public
//! key on every call. Nothing about a token is remembered between calls.
//!
//! A token is accepted only when:
//!
//! - its RS256/RS384/RS512 signature matches the realm key
//! - `iss` equals `<sso-url>/realms/<realm>`
//! - it is active: `exp` has not passed and `nbf` (if present) has
//! - `typ` is `Bearer`
//!
//! On success the subject is decoded from its federated form, so callers
//! receive the plain user id.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sunbird_sso::config::EnvSettings;
//! use sunbird_sso::key_cache::PublicKeyCache;
//! use sunbird_sso::token::TokenVerifier;
//!
//! let settings = Arc::new(EnvSettings);
//! let keys = Arc::new(PublicKeyCache::new(settings.clone()));
//! let verifier = TokenVerifier::new(settings, keys);
//!
//! let user_id = verifier.verify(bearer_token)?;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::SsoResult;
use crate::config::{SsoSettings, TokenConfig};
use crate::error::SsoError;
use crate::federation::decode_subject;
use crate::key_cache::{PublicKeyCache, PublicKeyMaterial};

/// Signature algorithms accepted for realm tokens.
pub const SUPPORTED_ALGORITHMS: [Algorithm; 3] =
    [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

/// Expected value of the `typ` claim.
pub const BEARER_TOKEN_TYPE: &str = "Bearer";

/// Claims of a verified realm access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    /// Issuer (`<sso-url>/realms/<realm>`).
    pub iss: String,

    /// Subject, usually a federated user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Audience (string or array in the token).
    #[serde(default, deserialize_with = "deserialize_audience")]
    pub aud: Vec<String>,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not before (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Token id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Token type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Authorized party (client the token was issued for).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
}

impl AccessTokenClaims {
    /// Returns the subject, or `""` when absent.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.sub.as_deref().unwrap_or_default()
    }

    /// Returns `true` if `typ` is `Bearer` (case-insensitive).
    #[must_use]
    pub fn is_bearer(&self) -> bool {
        self.typ
            .as_deref()
            .is_some_and(|typ| typ.eq_ignore_ascii_case(BEARER_TOKEN_TYPE))
    }

    /// Returns `true` if the token is usable at `now` (Unix seconds).
    #[must_use]
    pub fn is_active(&self, now: i64, leeway: i64) -> bool {
        let not_expired = now <= self.exp.saturating_add(leeway);
        let started = self.nbf.is_none_or(|nbf| nbf <= now.saturating_add(leeway));
        not_expired && started
    }
}

/// Audience may be a single string or an array.
fn deserialize_audience<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) => Ok(vec![s]),
        Some(OneOrMany::Many(v)) => Ok(v),
        None => Ok(Vec::new()),
    }
}

/// Checks applied on top of the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationOptions {
    /// Leeway applied to `exp` and `nbf`.
    pub leeway: Duration,
    /// Require `typ` to be `Bearer`.
    pub check_token_type: bool,
}

impl Default for VerificationOptions {
    fn default() -> Self {
        Self::from(&TokenConfig::default())
    }
}

impl From<&TokenConfig> for VerificationOptions {
    fn from(config: &TokenConfig) -> Self {
        Self {
            leeway: config.clock_skew,
            check_token_type: config.check_token_type,
        }
    }
}

/// Why a token was rejected. Logged, never returned.
#[derive(Debug, thiserror::Error)]
enum Rejection {
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("token type is {found:?}, expected Bearer")]
    TokenType { found: Option<String> },

    #[error("token is not active")]
    Inactive,
}

/// Verifies realm access tokens.
pub struct TokenVerifier {
    settings: Arc<dyn SsoSettings>,
    keys: Arc<PublicKeyCache>,
    options: VerificationOptions,
}

impl TokenVerifier {
    /// Creates a verifier with default options.
    #[must_use]
    pub fn new(settings: Arc<dyn SsoSettings>, keys: Arc<PublicKeyCache>) -> Self {
        Self {
            settings,
            keys,
            options: VerificationOptions::default(),
        }
    }

    /// Replaces the verification options.
    #[must_use]
    pub fn with_options(mut self, options: VerificationOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the verification options.
    #[must_use]
    pub fn options(&self) -> &VerificationOptions {
        &self.options
    }

    /// Verifies a token against the configured SSO URL and returns the
    /// plain user id.
    ///
    /// # Errors
    ///
    /// See [`verify_with_issuer`](Self::verify_with_issuer).
    pub fn verify(&self, token: &str) -> SsoResult<String> {
        self.verify_with_issuer(token, None)
    }

    /// Verifies a token and returns the plain user id.
    ///
    /// `issuer_base_url` overrides the configured SSO URL when computing the
    /// expected issuer. A blank subject is returned as is.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the realm key, SSO URL or realm is unavailable
    /// - `Unauthorized` for any verification failure
    pub fn verify_with_issuer(
        &self,
        token: &str,
        issuer_base_url: Option<&str>,
    ) -> SsoResult<String> {
        let claims = self.verify_claims(token, issuer_base_url)?;
        Ok(decode_subject(claims.subject()).to_string())
    }

    /// Verifies a token and returns its claims.
    ///
    /// # Errors
    ///
    /// Same as [`verify_with_issuer`](Self::verify_with_issuer).
    pub fn verify_claims(
        &self,
        token: &str,
        issuer_base_url: Option<&str>,
    ) -> SsoResult<AccessTokenClaims> {
        let Some(key) = self.keys.get_public_key() else {
            tracing::error!("Realm public key is unavailable; access tokens cannot be verified");
            return Err(SsoError::configuration("realm public key is unavailable"));
        };

        let issuer = self.expected_issuer(issuer_base_url)?;

        match self.decode(token, &key, &issuer) {
            Ok(claims) => {
                tracing::debug!(
                    jti = claims.jti.as_deref().unwrap_or_default(),
                    azp = claims.azp.as_deref().unwrap_or_default(),
                    sub = claims.subject(),
                    exp = claims.exp,
                    "Access token verified"
                );
                Ok(claims)
            }
            Err(e) => {
                tracing::warn!(error = %e, expected_issuer = %issuer, "Access token rejected");
                Err(SsoError::unauthorized())
            }
        }
    }

    /// Computes `<base>/realms/<realm>`, using `base_override` when given.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the base URL or realm is not configured.
    pub fn expected_issuer(&self, base_override: Option<&str>) -> SsoResult<String> {
        let base = match base_override.filter(|b| !b.trim().is_empty()) {
            Some(base) => base.to_string(),
            None => self
                .settings
                .sso_url()
                .ok_or_else(|| SsoError::configuration("SSO URL is not configured"))?,
        };
        let realm = self
            .settings
            .realm()
            .ok_or_else(|| SsoError::configuration("SSO realm is not configured"))?;

        Ok(format!("{}/realms/{}", base.trim().trim_end_matches('/'), realm))
    }

    fn decode(
        &self,
        token: &str,
        key: &PublicKeyMaterial,
        issuer: &str,
    ) -> Result<AccessTokenClaims, Rejection> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        // jsonwebtoken subtracts the leeway from the current u64 timestamp.
        let leeway = self
            .options
            .leeway
            .as_secs()
            .min(u64::try_from(now).unwrap_or(0));
        let leeway_signed = i64::try_from(leeway).unwrap_or(i64::MAX);

        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = SUPPORTED_ALGORITHMS.to_vec();
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = leeway;

        let claims =
            jsonwebtoken::decode::<AccessTokenClaims>(token, key.decoding_key(), &validation)?
                .claims;

        if self.options.check_token_type && !claims.is_bearer() {
            return Err(Rejection::TokenType {
                found: claims.typ.clone(),
            });
        }

        if !claims.is_active(now, leeway_signed) {
            return Err(Rejection::Inactive);
        }

        Ok(claims)
    }
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("keys", &self.keys)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StaticSettings, keys};
    use crate::testutil::{ISSUER, REALM, SSO_URL, TestSigner, access_claims, now, signer};

    fn settings() -> Arc<StaticSettings> {
        Arc::new(
            StaticSettings::new()
                .with(keys::PUBLIC_KEY, signer().public_key_base64())
                .with(keys::SSO_URL, SSO_URL)
                .with(keys::REALM, REALM),
        )
    }

    fn verifier_for(settings: Arc<StaticSettings>) -> TokenVerifier {
        let keys = Arc::new(PublicKeyCache::new(settings.clone()));
        TokenVerifier::new(settings, keys)
    }

    fn verifier() -> TokenVerifier {
        verifier_for(settings())
    }

    #[test]
    fn test_federated_subject_is_decoded() {
        let token = signer().sign(&access_claims("f:sunbird:user-42"));
        assert_eq!(verifier().verify(&token).unwrap(), "user-42");
    }

    #[test]
    fn test_plain_subject_is_returned_unchanged() {
        let token = signer().sign(&access_claims("5b2f0c9e-user"));
        assert_eq!(verifier().verify(&token).unwrap(), "5b2f0c9e-user");
    }

    #[test]
    fn test_blank_and_missing_subject_pass_through() {
        let token = signer().sign(&access_claims(""));
        assert_eq!(verifier().verify(&token).unwrap(), "");

        let mut claims = access_claims("x");
        claims.as_object_mut().unwrap().remove("sub");
        let token = signer().sign(&claims);
        assert_eq!(verifier().verify(&token).unwrap(), "");
    }

    #[test]
    fn test_other_rsa_algorithms_accepted() {
        for alg in [Algorithm::RS384, Algorithm::RS512] {
            let token = signer().sign_with(alg, &access_claims("f:sunbird:u1"));
            assert_eq!(verifier().verify(&token).unwrap(), "u1");
        }
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let other = TestSigner::generate();
        let token = other.sign(&access_claims("f:sunbird:user-42"));
        assert!(verifier().verify(&token).unwrap_err().is_unauthorized());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let token = signer().sign(&access_claims("f:sunbird:user-42"));
        let forged = signer().sign(&access_claims("f:sunbird:admin"));

        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert!(verifier().verify(&spliced).unwrap_err().is_unauthorized());
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let mut claims = access_claims("f:sunbird:user-42");
        claims["iss"] = "https://sso.example.org/auth/realms/other".into();
        let token = signer().sign(&claims);
        assert!(verifier().verify(&token).unwrap_err().is_unauthorized());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut claims = access_claims("f:sunbird:user-42");
        claims["exp"] = (now() - 3600).into();
        let token = signer().sign(&claims);
        assert!(verifier().verify(&token).unwrap_err().is_unauthorized());
    }

    #[test]
    fn test_not_yet_active_token_rejected() {
        let mut claims = access_claims("f:sunbird:user-42");
        claims["nbf"] = (now() + 3600).into();
        let token = signer().sign(&claims);
        assert!(verifier().verify(&token).unwrap_err().is_unauthorized());
    }

    #[test]
    fn test_wrong_token_type_rejected() {
        let mut claims = access_claims("f:sunbird:user-42");
        claims["typ"] = "Refresh".into();
        let token = signer().sign(&claims);
        assert!(verifier().verify(&token).unwrap_err().is_unauthorized());

        claims.as_object_mut().unwrap().remove("typ");
        let token = signer().sign(&claims);
        assert!(verifier().verify(&token).unwrap_err().is_unauthorized());
    }

    #[test]
    fn test_token_type_check_can_be_disabled() {
        let mut claims = access_claims("f:sunbird:user-42");
        claims["typ"] = "ID".into();
        let token = signer().sign(&claims);

        let verifier = verifier().with_options(VerificationOptions {
            check_token_type: false,
            ..VerificationOptions::default()
        });
        assert_eq!(verifier.verify(&token).unwrap(), "user-42");
    }

    #[test]
    fn test_expired_token_rejected_under_any_options() {
        let mut claims = access_claims("f:sunbird:user-42");
        claims["exp"] = (now() - 86_400).into();
        let token = signer().sign(&claims);

        for check_token_type in [true, false] {
            for leeway in [0, 60, 3600] {
                let verifier = verifier().with_options(VerificationOptions {
                    leeway: Duration::from_secs(leeway),
                    check_token_type,
                });
                assert!(verifier.verify(&token).unwrap_err().is_unauthorized());
            }
        }
    }

    #[test]
    fn test_huge_leeway_does_not_wrap() {
        let token = signer().sign(&access_claims("f:sunbird:user-42"));
        let verifier = verifier().with_options(VerificationOptions {
            leeway: Duration::from_secs(u64::MAX),
            ..VerificationOptions::default()
        });
        assert_eq!(verifier.verify(&token).unwrap(), "user-42");
    }

    #[test]
    fn test_malformed_token_rejected() {
        for token in ["", "abc", "a.b.c", "eyJhbGciOiJSUzI1NiJ9.e30."] {
            assert!(verifier().verify(token).unwrap_err().is_unauthorized());
        }
    }

    #[test]
    fn test_hmac_token_rejected() {
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(Algorithm::HS256),
            &access_claims("f:sunbird:user-42"),
            &jsonwebtoken::EncodingKey::from_secret(signer().public_key_base64().as_bytes()),
        )
        .unwrap();
        assert!(verifier().verify(&token).unwrap_err().is_unauthorized());
    }

    #[test]
    fn test_missing_key_is_configuration_error_and_recovers() {
        let settings = Arc::new(
            StaticSettings::new()
                .with(keys::SSO_URL, SSO_URL)
                .with(keys::REALM, REALM),
        );
        let verifier = verifier_for(settings.clone());
        let token = signer().sign(&access_claims("f:sunbird:user-42"));

        let err = verifier.verify(&token).unwrap_err();
        assert!(err.is_configuration_error());

        settings.set(keys::PUBLIC_KEY, "definitely-not-a-key");
        assert!(verifier.verify(&token).unwrap_err().is_configuration_error());

        settings.set(keys::PUBLIC_KEY, signer().public_key_base64());
        assert_eq!(verifier.verify(&token).unwrap(), "user-42");
    }

    #[test]
    fn test_issuer_override() {
        let mut claims = access_claims("f:sunbird:user-42");
        claims["iss"] = "https://login.example.net/realms/sunbird".into();
        let token = signer().sign(&claims);

        let verifier = verifier();
        assert!(verifier.verify(&token).unwrap_err().is_unauthorized());
        assert_eq!(
            verifier
                .verify_with_issuer(&token, Some("https://login.example.net/"))
                .unwrap(),
            "user-42"
        );
    }

    #[test]
    fn test_expected_issuer() {
        let verifier = verifier();
        assert_eq!(verifier.expected_issuer(None).unwrap(), ISSUER);
        assert_eq!(
            verifier.expected_issuer(Some("https://other/auth/")).unwrap(),
            "https://other/auth/realms/sunbird"
        );
        assert_eq!(verifier.expected_issuer(Some("  ")).unwrap(), ISSUER);

        let settings = Arc::new(StaticSettings::new().with(keys::SSO_URL, SSO_URL));
        let err = verifier_for(settings).expected_issuer(None).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_verify_claims_returns_claims() {
        let token = signer().sign(&access_claims("f:sunbird:user-42"));
        let claims = verifier().verify_claims(&token, None).unwrap();
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.subject(), "f:sunbird:user-42");
        assert_eq!(claims.azp.as_deref(), Some("portal"));
        assert!(claims.is_bearer());
    }

    #[test]
    fn test_claims_activity() {
        let claims: AccessTokenClaims = serde_json::from_value(serde_json::json!({
            "iss": ISSUER,
            "exp": 1_000,
            "nbf": 500,
            "aud": "account"
        }))
        .unwrap();

        assert_eq!(claims.aud, vec!["account"]);
        assert!(claims.is_active(1_000, 0));
        assert!(!claims.is_active(1_001, 0));
        assert!(claims.is_active(1_001, 5));
        assert!(!claims.is_active(499, 0));
        assert!(!claims.is_bearer());
    }

    #[test]
    fn test_options_from_config() {
        let config = TokenConfig {
            clock_skew: Duration::from_secs(10),
            check_token_type: false,
        };
        let options = VerificationOptions::from(&config);
        assert_eq!(options.leeway, Duration::from_secs(10));
        assert!(!options.check_token_type);
    }
}
