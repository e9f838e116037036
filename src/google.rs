//! Google Cloud REST clients used by the relay.
//!
//! All calls are blocking `ureq` requests authorized with a service-account
//! access token. Non-2xx responses are turned into errors carrying the
//! response body so API messages survive into the logs.
pub mod auth;
pub mod secrets;
pub mod sheets;

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use ureq::http::Response;
use ureq::Body;

/// Agent that leaves status handling to [`read_json`].
pub(crate) fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .into()
}

/// Decode a JSON response body, failing on non-2xx statuses.
pub(crate) fn read_json<T: DeserializeOwned>(mut response: Response<Body>, what: &str) -> Result<T> {
    let status = response.status();
    let text = response
        .body_mut()
        .read_to_string()
        .with_context(|| format!("read {what} response"))?;
    if !status.is_success() {
        return Err(anyhow!(
            "{what} failed with HTTP {}: {}",
            status.as_u16(),
            api_error_message(&text)
        ));
    }
    serde_json::from_str(&text).with_context(|| format!("parse {what} response JSON"))
}

/// Pull `error.message` out of a Google error envelope, else the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|message| message.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_message_prefers_google_envelope() {
        let body = r#"{"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}"#;
        assert_eq!(api_error_message(body), "Requested entity was not found.");
    }

    #[test]
    fn api_error_message_falls_back_to_body() {
        assert_eq!(api_error_message("  upstream timeout\n"), "upstream timeout");
    }
}
