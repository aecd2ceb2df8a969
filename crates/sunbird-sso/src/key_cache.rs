//! Realm public key resolution and caching.
//!
//! The realm signing key is configured as a base64 encoded X.509
//! SubjectPublicKeyInfo (the "Public key" shown in the Keycloak realm keys
//! tab). It is parsed on first use and kept for the lifetime of the cache.
//!
//! A failed resolution is not remembered: the next call reads the
//! configuration again, so fixing the environment is enough to recover.
//! Concurrent first calls may each parse the key; the first stored result
//! wins and every caller observes that same instance afterwards.

use std::fmt;
use std::sync::{Arc, OnceLock};

use base64::{Engine, engine::general_purpose::STANDARD};
use jsonwebtoken::DecodingKey;
use rsa::RsaPublicKey;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;

use crate::config::SsoSettings;

/// Errors that can occur while resolving the realm public key.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// No public key is configured.
    #[error("Realm public key is not configured")]
    Missing,

    /// The configured value is not valid base64.
    #[error("Realm public key is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not an RSA SubjectPublicKeyInfo.
    #[error("Realm public key is not an X.509 RSA public key: {0}")]
    InvalidSpki(String),

    /// The key could not be turned into a verification key.
    #[error("Realm public key cannot be used for verification: {0}")]
    InvalidKey(String),
}

/// A parsed RSA public key ready for signature verification.
pub struct PublicKeyMaterial {
    public_key: RsaPublicKey,
    decoding_key: DecodingKey,
}

impl PublicKeyMaterial {
    /// Parses a base64 encoded X.509 SubjectPublicKeyInfo.
    ///
    /// Whitespace anywhere in the value is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not base64, not an RSA SPKI, or
    /// cannot be converted to a decoding key.
    pub fn from_base64_spki(encoded: &str) -> Result<Self, KeyError> {
        let compact: String = encoded.split_whitespace().collect();
        if compact.is_empty() {
            return Err(KeyError::Missing);
        }

        let der = STANDARD.decode(compact.as_bytes())?;
        let public_key = RsaPublicKey::from_public_key_der(&der)
            .map_err(|e| KeyError::InvalidSpki(e.to_string()))?;

        let pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;
        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

        Ok(Self {
            public_key,
            decoding_key,
        })
    }

    /// Key used by `jsonwebtoken` to verify signatures.
    #[must_use]
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// The parsed RSA public key.
    #[must_use]
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Modulus size in bits.
    #[must_use]
    pub fn bits(&self) -> usize {
        self.public_key.size() * 8
    }
}

impl fmt::Debug for PublicKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyMaterial")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// Lazily resolved, write-once holder of the realm public key.
pub struct PublicKeyCache {
    settings: Arc<dyn SsoSettings>,
    key: OnceLock<Arc<PublicKeyMaterial>>,
}

impl PublicKeyCache {
    /// Creates an empty cache reading the key from `settings`.
    #[must_use]
    pub fn new(settings: Arc<dyn SsoSettings>) -> Self {
        Self {
            settings,
            key: OnceLock::new(),
        }
    }

    /// Returns the realm public key, resolving it on first use.
    ///
    /// Returns `None` when the key is missing or malformed; the failure is
    /// logged and the next call tries again.
    pub fn get_public_key(&self) -> Option<Arc<PublicKeyMaterial>> {
        if let Some(key) = self.key.get() {
            return Some(Arc::clone(key));
        }

        match self.resolve() {
            Ok(material) => {
                tracing::info!(bits = material.bits(), "Resolved realm public key");
                // A concurrent caller may have stored first; keep theirs.
                let _ = self.key.set(Arc::new(material));
                self.key.get().cloned()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to resolve realm public key");
                None
            }
        }
    }

    /// Returns `true` once a key has been resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.key.get().is_some()
    }

    fn resolve(&self) -> Result<PublicKeyMaterial, KeyError> {
        let encoded = self.settings.public_key().ok_or(KeyError::Missing)?;
        PublicKeyMaterial::from_base64_spki(&encoded)
    }
}

impl fmt::Debug for PublicKeyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyCache")
            .field("resolved", &self.is_resolved())
            .finish_non_exhaustive()
    }
}
