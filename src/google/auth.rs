//! Service-account OAuth2 token grant (JWT bearer flow).
use anyhow::{Context, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Instant;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Google caps assertion lifetime at one hour.
const ASSERTION_TTL_SECS: i64 = 3600;

/// The fields of a service-account key file that the grant needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("read service account key {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parse service account key {}", path.display()))
    }
}

/// Bearer token for one API scope.
#[derive(Clone)]
pub struct AccessToken {
    token: String,
}

impl AccessToken {
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct GrantClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

fn grant_claims<'a>(key: &'a ServiceAccountKey, scope: &'a str, now: i64) -> GrantClaims<'a> {
    GrantClaims {
        iss: &key.client_email,
        scope,
        aud: &key.token_uri,
        iat: now,
        exp: now + ASSERTION_TTL_SECS,
    }
}

/// Sign the grant assertion with the key's RSA private key.
fn sign_assertion(key: &ServiceAccountKey, scope: &str, now: i64) -> Result<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .context("load service account private key")?;
    jsonwebtoken::encode(&header, &grant_claims(key, scope, now), &signing_key)
        .context("sign token grant assertion")
}

/// Exchange a signed assertion for an access token.
pub fn fetch_access_token(
    agent: &ureq::Agent,
    key: &ServiceAccountKey,
    scope: &str,
) -> Result<AccessToken> {
    let start = Instant::now();
    let assertion = sign_assertion(key, scope, chrono::Utc::now().timestamp())?;
    let response = agent
        .post(&key.token_uri)
        .send_form([
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
        ])
        .context("request access token")?;
    let body: TokenResponse = super::read_json(response, "token grant")?;

    tracing::info!(
        elapsed_ms = start.elapsed().as_millis(),
        client_email = %key.client_email,
        scope,
        "access token granted"
    );
    Ok(AccessToken {
        token: body.access_token,
    })
}
