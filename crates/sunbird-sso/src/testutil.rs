//! Shared helpers for unit tests: a process-wide RSA signer and claim sets.

use std::sync::LazyLock;

use base64::{Engine, engine::general_purpose::STANDARD};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use serde_json::{Value, json};
use time::OffsetDateTime;

pub(crate) const SSO_URL: &str = "https://sso.example.org/auth";
pub(crate) const REALM: &str = "sunbird";
pub(crate) const ISSUER: &str = "https://sso.example.org/auth/realms/sunbird";

pub(crate) struct TestSigner {
    encoding_key: EncodingKey,
    public_key_base64: String,
}

impl TestSigner {
    pub(crate) fn generate() -> Self {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let der = private_key.to_public_key().to_public_key_der().unwrap();
        let pem = private_key.to_pkcs8_pem(LineEnding::LF).unwrap();

        Self {
            encoding_key: EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap(),
            public_key_base64: STANDARD.encode(der.as_bytes()),
        }
    }

    pub(crate) fn public_key_base64(&self) -> &str {
        &self.public_key_base64
    }

    pub(crate) fn sign(&self, claims: &Value) -> String {
        self.sign_with(Algorithm::RS256, claims)
    }

    pub(crate) fn sign_with(&self, algorithm: Algorithm, claims: &Value) -> String {
        encode(&Header::new(algorithm), claims, &self.encoding_key).unwrap()
    }
}

static SIGNER: LazyLock<TestSigner> = LazyLock::new(TestSigner::generate);

pub(crate) fn signer() -> &'static TestSigner {
    &SIGNER
}

pub(crate) fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Claims of a valid Keycloak access token for `subject`.
pub(crate) fn access_claims(subject: &str) -> Value {
    let now = now();
    json!({
        "jti": uuid::Uuid::new_v4().to_string(),
        "iss": ISSUER,
        "sub": subject,
        "typ": "Bearer",
        "azp": "portal",
        "iat": now,
        "exp": now + 300,
    })
}
