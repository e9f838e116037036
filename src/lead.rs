//! Lead records as read from the lead spreadsheet.
//!
//! A record is the header-keyed view of one sheet row, with columns kept in
//! header order.
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;

pub const ENTRY_ID: &str = "Entry ID";
pub const ENTRY_DATE: &str = "Entry Date";
pub const STORE: &str = "Store";
pub const OPTIONS: &str = "Options";
pub const FIRST_NAME: &str = "First Name";
pub const LAST_NAME: &str = "Last Name";
pub const EMAIL: &str = "Email";
pub const PHONE: &str = "Phone";
pub const ZIP_CODE: &str = "Zip Code";
pub const SENT_STATUS: &str = "Sent Status";

/// Format of the `Sent Status` marker written after a successful send.
pub const SENT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rows below the header start at sheet row 2, and Entry IDs count from 0.
const ENTRY_ROW_OFFSET: u32 = 2;

/// One spreadsheet row keyed by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadRecord {
    fields: Vec<(String, String)>,
}

impl LeadRecord {
    /// Zip a header row with a data row.
    ///
    /// Header names are trimmed so stray spaces in the sheet still match
    /// the column constants. Short rows are padded with empty strings; cells
    /// past the header are dropped since they have no column name.
    pub fn from_row(header: &[String], row: &[String]) -> Self {
        let fields = header
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let value = row.get(idx).cloned().unwrap_or_default();
                (name.trim().to_string(), value)
            })
            .collect();
        Self { fields }
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Look up a column that every lead must carry.
    pub fn require(&self, column: &str) -> Result<&str> {
        self.get(column)
            .ok_or_else(|| anyhow!("lead is missing column {column:?}"))
    }

    pub fn entry_id(&self) -> &str {
        self.get(ENTRY_ID).unwrap_or_default().trim()
    }

    pub fn store(&self) -> &str {
        self.get(STORE).unwrap_or_default()
    }

    /// True when the `Sent Status` cell holds a well-formed send timestamp.
    pub fn is_sent(&self) -> bool {
        self.get(SENT_STATUS)
            .map(|status| is_valid_timestamp(status.trim()))
            .unwrap_or(false)
    }

    /// Sheet row that holds this lead, derived from its Entry ID.
    pub fn status_row(&self) -> Result<u32> {
        let raw = self.entry_id();
        let entry: u32 = raw
            .parse()
            .with_context(|| format!("Entry ID {raw:?} is not a row offset"))?;
        entry
            .checked_add(ENTRY_ROW_OFFSET)
            .ok_or_else(|| anyhow!("Entry ID {raw} overflows the sheet row range"))
    }
}

pub fn is_valid_timestamp(value: &str) -> bool {
    NaiveDateTime::parse_from_str(value, SENT_TIMESTAMP_FORMAT).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn from_row_pads_short_rows_and_drops_extra_cells() {
        let header = header(&[ENTRY_ID, STORE, SENT_STATUS]);
        let short = LeadRecord::from_row(&header, &["4".to_string()]);
        assert_eq!(short.get(STORE), Some(""));
        assert_eq!(short.get(SENT_STATUS), Some(""));

        let long = LeadRecord::from_row(
            &header,
            &["4", "S1", "", "stray"].map(str::to_string),
        );
        let exact = LeadRecord::from_row(&header, &["4", "S1", ""].map(str::to_string));
        assert_eq!(long, exact);
    }

    #[test]
    fn header_names_are_trimmed_like_column_lookup() {
        let header = header(&[" Entry ID", STORE, "Sent Status "]);
        let row = ["4", "S1", "2024-01-15 09:00:00"].map(str::to_string);
        let lead = LeadRecord::from_row(&header, &row);
        assert_eq!(lead.entry_id(), "4");
        assert!(lead.is_sent());
    }

    #[test]
    fn timestamp_validation_requires_full_format() {
        assert!(is_valid_timestamp("2024-01-15 09:00:00"));
        assert!(!is_valid_timestamp(""));
        assert!(!is_valid_timestamp("2024-01-15"));
        assert!(!is_valid_timestamp("01/15/2024 09:00:00"));
        assert!(!is_valid_timestamp("sent"));
    }

    #[test]
    fn sent_status_is_trimmed_before_validation() {
        let lead = LeadRecord::from_pairs([(SENT_STATUS, " 2024-01-15 09:00:00 ")]);
        assert!(lead.is_sent());
        let lead = LeadRecord::from_pairs([(SENT_STATUS, "pending")]);
        assert!(!lead.is_sent());
        assert!(!LeadRecord::default().is_sent());
    }

    #[test]
    fn status_row_offsets_entry_id_past_header() {
        let lead = LeadRecord::from_pairs([(ENTRY_ID, "3")]);
        assert_eq!(lead.status_row().unwrap(), 5);
        let lead = LeadRecord::from_pairs([(ENTRY_ID, "0")]);
        assert_eq!(lead.status_row().unwrap(), 2);
    }

    #[test]
    fn status_row_rejects_non_numeric_entry_ids() {
        let lead = LeadRecord::from_pairs([(ENTRY_ID, "A-17")]);
        let err = lead.status_row().unwrap_err();
        assert!(err.to_string().contains("A-17"));
        let lead = LeadRecord::from_pairs([(ENTRY_ID, "-1")]);
        assert!(lead.status_row().is_err());
    }
}
