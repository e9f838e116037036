//! Relay configuration.
//!
//! Deployment-specific identifiers live in a small JSON file so the binary
//! carries no project, sheet, or store literals of its own.
use crate::adf::AdfConstants;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const CONFIG_ENV: &str = "ADF_RELAY_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "adfrelay.json";
pub const DEFAULT_WORKSHEET: &str = "Leads";

/// Contents of `adfrelay.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    pub schema_version: u32,
    /// Google Cloud project that owns the mail login secret.
    pub project_id: String,
    pub secret_id: String,
    /// Only leads whose `Store` cell equals this are relayed.
    pub store_id: String,
    /// Service-account key file used for both Secret Manager and Sheets.
    pub credential_path: PathBuf,
    pub spreadsheet_key: String,
    #[serde(default = "default_worksheet")]
    pub worksheet: String,
    #[serde(default)]
    pub smtp: SmtpSettings,
    #[serde(default)]
    pub mail: MailSettings,
    #[serde(default)]
    pub adf: AdfConstants,
}

/// STARTTLS submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpSettings {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
        }
    }
}

/// Envelope of each lead email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailSettings {
    #[serde(default = "default_recipient")]
    pub recipient: String,
    #[serde(default = "default_subject")]
    pub subject: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            recipient: default_recipient(),
            subject: default_subject(),
        }
    }
}

fn default_worksheet() -> String {
    DEFAULT_WORKSHEET.to_string()
}

fn default_smtp_host() -> String {
    "smtp.example.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_recipient() -> String {
    "receiver@example.com".to_string()
}

fn default_subject() -> String {
    "New Lead Submission".to_string()
}

/// Config written by `adfrelay init`; identifiers are placeholders to edit.
pub fn default_config() -> RelayConfig {
    RelayConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        project_id: "your-google-cloud-project-id".to_string(),
        secret_id: "your-secret-id".to_string(),
        store_id: "your-store-id".to_string(),
        credential_path: PathBuf::from("/path/to/your/service-account-file.json"),
        spreadsheet_key: "your-spreadsheet-key".to_string(),
        worksheet: default_worksheet(),
        smtp: SmtpSettings::default(),
        mail: MailSettings::default(),
        adf: AdfConstants::default(),
    }
}

pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&default_config()).context("serialize config stub")
}

/// Pick the config path: explicit flag, then `ADF_RELAY_CONFIG`, then `./adfrelay.json`.
pub fn resolve_config_path(flag: Option<&Path>, env_value: Option<String>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    match env_value {
        Some(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

pub fn load_config(path: &Path) -> Result<RelayConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: RelayConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Write the stub config, refusing to clobber an existing file unless forced.
pub fn write_config_stub(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, config_stub()?.as_bytes())
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Swap in a store id from the command line and re-run validation on it.
pub fn override_store(config: &mut RelayConfig, store_id: String) -> Result<()> {
    config.store_id = store_id;
    validate_config(config).context("invalid --store override")
}

pub fn validate_config(config: &RelayConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    let required = [
        ("project_id", config.project_id.as_str()),
        ("secret_id", config.secret_id.as_str()),
        ("store_id", config.store_id.as_str()),
        ("spreadsheet_key", config.spreadsheet_key.as_str()),
        ("worksheet", config.worksheet.as_str()),
        ("smtp.host", config.smtp.host.as_str()),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(anyhow!("config field `{field}` must not be empty"));
        }
    }
    if config.credential_path.as_os_str().is_empty() {
        return Err(anyhow!("config field `credential_path` must not be empty"));
    }
    if config.smtp.port == 0 {
        return Err(anyhow!("config field `smtp.port` must be non-zero"));
    }
    let recipient = config.mail.recipient.trim();
    if recipient.contains(char::is_whitespace) || !recipient.contains('@') {
        return Err(anyhow!(
            "config field `mail.recipient` is not an email address: {recipient:?}"
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
