//! Secret Manager access for the outbound mail login.
use super::auth::{fetch_access_token, AccessToken, ServiceAccountKey};
use anyhow::{Context, Result};
use base64::Engine;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Instant;

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const SECRET_MANAGER_BASE: &str = "https://secretmanager.googleapis.com/v1";

/// Mail login stored as the secret's JSON payload.
#[derive(Clone, Deserialize)]
pub struct MailCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Deserialize)]
struct SecretPayload {
    data: String,
}

/// Resource name of the newest version of a secret.
pub fn latest_version_name(project_id: &str, secret_id: &str) -> String {
    format!("projects/{project_id}/secrets/{secret_id}/versions/latest")
}

/// Fetch the latest version of a secret whose payload is a JSON object.
pub fn fetch_secret(
    key: &ServiceAccountKey,
    project_id: &str,
    secret_id: &str,
) -> Result<Map<String, Value>> {
    let agent = super::agent();
    let token = fetch_access_token(&agent, key, CLOUD_PLATFORM_SCOPE)?;
    access_secret(&agent, &token, &latest_version_name(project_id, secret_id))
}

fn access_secret(agent: &ureq::Agent, token: &AccessToken, name: &str) -> Result<Map<String, Value>> {
    let start = Instant::now();
    let response = agent
        .get(&format!("{SECRET_MANAGER_BASE}/{name}:access"))
        .header("Authorization", &token.authorization())
        .call()
        .with_context(|| format!("request secret {name}"))?;
    let body: AccessSecretVersionResponse = super::read_json(response, "secret access")?;
    let secret = decode_payload(&body.payload.data)?;

    tracing::info!(
        elapsed_ms = start.elapsed().as_millis(),
        secret = name,
        fields = secret.len(),
        "secret fetched"
    );
    Ok(secret)
}

/// Decode a base64 secret payload holding a UTF-8 JSON object.
pub fn decode_payload(data: &str) -> Result<Map<String, Value>> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data)
        .context("decode secret payload base64")?;
    let text = String::from_utf8(bytes).context("secret payload is not UTF-8")?;
    serde_json::from_str(&text).context("secret payload is not a JSON object")
}

/// Extract the mail login from secret fields.
pub fn mail_credentials(secret: Map<String, Value>) -> Result<MailCredentials> {
    serde_json::from_value(Value::Object(secret))
        .context("secret lacks string `email` and `password` fields")
}
