//! Sheets API v4 worksheet backed by the values endpoints.
use super::auth::{fetch_access_token, AccessToken, ServiceAccountKey};
use crate::lead::LeadRecord;
use crate::sheet::{a1_cell, LeadSheet};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use url::Url;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// One worksheet (tab) of a spreadsheet.
pub struct Worksheet {
    agent: ureq::Agent,
    token: AccessToken,
    spreadsheet_key: String,
    name: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueUpdate<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: [[&'a str; 1]; 1],
}

impl Worksheet {
    /// Authorize with the key and bind to `spreadsheet_key` / `name`.
    ///
    /// The worksheet is not touched until the first read.
    pub fn open(key: &ServiceAccountKey, spreadsheet_key: &str, name: &str) -> Result<Self> {
        let agent = super::agent();
        let token = fetch_access_token(&agent, key, SPREADSHEETS_SCOPE)
            .context("authorize spreadsheet access")?;
        Ok(Self {
            agent,
            token,
            spreadsheet_key: spreadsheet_key.to_string(),
            name: name.to_string(),
        })
    }

    fn quoted_name(&self) -> String {
        format!("'{}'", self.name.replace('\'', "''"))
    }

    fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let start = Instant::now();
        let url = values_url(&self.spreadsheet_key, range)?;
        let response = self
            .agent
            .get(url.as_str())
            .header("Authorization", &self.token.authorization())
            .call()
            .with_context(|| format!("request sheet range {range}"))?;
        let body: ValueRange = super::read_json(response, "sheet read")?;
        let rows: Vec<Vec<String>> = body
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            range,
            rows = rows.len(),
            "sheet range read"
        );
        Ok(rows)
    }
}

impl LeadSheet for Worksheet {
    fn records(&self) -> Result<Vec<LeadRecord>> {
        let rows = self
            .get_values(&self.quoted_name())
            .with_context(|| format!("read worksheet {:?}", self.name))?;
        Ok(rows_to_records(rows))
    }

    fn header(&self) -> Result<Vec<String>> {
        let rows = self.get_values(&format!("{}!1:1", self.quoted_name()))?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    fn update_cell(&self, row: u32, column: u32, value: &str) -> Result<()> {
        let start = Instant::now();
        let range = a1_cell(&self.name, row, column);
        let mut url = values_url(&self.spreadsheet_key, &range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let update = ValueUpdate {
            range: &range,
            major_dimension: "ROWS",
            values: [[value]],
        };
        let response = self
            .agent
            .put(url.as_str())
            .header("Authorization", &self.token.authorization())
            .send_json(&update)
            .with_context(|| format!("request cell update {range}"))?;
        let _: Value = super::read_json(response, "cell update")?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            range = %range,
            "cell updated"
        );
        Ok(())
    }
}

/// `…/spreadsheets/{key}/values/{range}` with each segment percent-encoded.
fn values_url(spreadsheet_key: &str, range: &str) -> Result<Url> {
    let mut url = Url::parse(SHEETS_BASE).context("parse Sheets API base URL")?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("Sheets API base URL cannot take path segments"))?
        .push(spreadsheet_key)
        .push("values")
        .push(range);
    Ok(url)
}

/// Formatted cells arrive as strings; anything else is rendered as text.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}

/// Split off the header row and key every remaining row by it.
pub fn rows_to_records(rows: Vec<Vec<String>>) -> Vec<LeadRecord> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    rows.map(|row| LeadRecord::from_row(&header, &row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::{ENTRY_ID, SENT_STATUS, STORE};
    use serde_json::json;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn values_url_encodes_range_segment() {
        let url = values_url("1AbC", "'Lead Intake'!J5").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/1AbC/values/'Lead%20Intake'!J5"
        );
    }

    #[test]
    fn rows_to_records_uses_first_row_as_header() {
        let rows = vec![
            strings(&[ENTRY_ID, STORE, SENT_STATUS]),
            strings(&["0", "S1"]),
            strings(&["1", "S2", "2024-01-15 09:00:00"]),
        ];
        let records = rows_to_records(rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].entry_id(), "0");
        assert_eq!(records[0].get(SENT_STATUS), Some(""));
        assert!(records[1].is_sent());
    }

    #[test]
    fn rows_to_records_handles_empty_sheets() {
        assert!(rows_to_records(Vec::new()).is_empty());
        assert!(rows_to_records(vec![strings(&[ENTRY_ID])]).is_empty());
    }

    #[test]
    fn cell_text_renders_unformatted_values() {
        assert_eq!(cell_text(&json!("S1")), "S1");
        assert_eq!(cell_text(&json!(3)), "3");
        assert_eq!(cell_text(&json!(2.5)), "2.5");
        assert_eq!(cell_text(&json!(true)), "TRUE");
        assert_eq!(cell_text(&Value::Null), "");
    }

    #[test]
    fn cell_update_body_matches_values_api() {
        let update = ValueUpdate {
            range: "'Leads'!J5",
            major_dimension: "ROWS",
            values: [["2024-01-15 09:00:00"]],
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({
                "range": "'Leads'!J5",
                "majorDimension": "ROWS",
                "values": [["2024-01-15 09:00:00"]],
            })
        );
    }
}
