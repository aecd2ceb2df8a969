#![allow(dead_code)]

use std::sync::{Arc, LazyLock};

use base64::{Engine, engine::general_purpose::STANDARD};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use serde_json::{Value, json};
use sunbird_sso::config::{StaticSettings, keys};

pub const SSO_URL: &str = "https://sso.example.org/auth";
pub const REALM: &str = "sunbird";
pub const PROVIDER_ID: &str = "cassandrafederationid";

pub struct RealmKey {
    encoding_key: EncodingKey,
    pub public_key_base64: String,
}

impl RealmKey {
    pub fn generate() -> Self {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("generate RSA key");
        let der = private_key
            .to_public_key()
            .to_public_key_der()
            .expect("encode public key");
        let pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("encode private key");

        Self {
            encoding_key: EncodingKey::from_rsa_pem(pem.as_bytes()).expect("encoding key"),
            public_key_base64: STANDARD.encode(der.as_bytes()),
        }
    }

    pub fn sign(&self, claims: &Value) -> String {
        encode(&Header::new(Algorithm::RS256), claims, &self.encoding_key).expect("sign token")
    }
}

static REALM_KEY: LazyLock<RealmKey> = LazyLock::new(RealmKey::generate);

pub fn realm_key() -> &'static RealmKey {
    &REALM_KEY
}

pub fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

pub fn issuer() -> String {
    format!("{SSO_URL}/realms/{REALM}")
}

/// Settings of a fully configured deployment.
pub fn settings() -> Arc<StaticSettings> {
    Arc::new(
        StaticSettings::new()
            .with(keys::SSO_URL, SSO_URL)
            .with(keys::REALM, REALM)
            .with(keys::FEDERATION_PROVIDER_ID, PROVIDER_ID)
            .with(keys::PUBLIC_KEY, realm_key().public_key_base64.clone()),
    )
}

pub fn access_claims(subject: &str) -> Value {
    let now = now();
    json!({
        "jti": uuid::Uuid::new_v4().to_string(),
        "iss": issuer(),
        "sub": subject,
        "typ": "Bearer",
        "azp": "portal",
        "iat": now,
        "exp": now + 300,
    })
}
