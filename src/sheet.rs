//! Worksheet access seam shared by the lead source and the status writer.
use crate::lead::{LeadRecord, SENT_STATUS};
use anyhow::{anyhow, Result};

/// A worksheet whose first row is a header.
pub trait LeadSheet {
    /// Every data row below the header, in sheet order.
    fn records(&self) -> Result<Vec<LeadRecord>>;

    /// The header row as currently stored in the sheet.
    fn header(&self) -> Result<Vec<String>>;

    /// Overwrite one cell. `row` and `column` are 1-based.
    fn update_cell(&self, row: u32, column: u32, value: &str) -> Result<()>;
}

/// 1-based column index of `name`, looked up in a fresh header read.
pub fn find_column(sheet: &dyn LeadSheet, name: &str) -> Result<u32> {
    let header = sheet.header()?;
    let idx = header
        .iter()
        .position(|cell| cell.trim() == name)
        .ok_or_else(|| anyhow!("header has no {name:?} column"))?;
    u32::try_from(idx + 1).map_err(|_| anyhow!("column {name:?} index out of range"))
}

/// Stamp the lead's `Sent Status` cell. Returns the row that was written.
pub fn mark_sent(sheet: &dyn LeadSheet, lead: &LeadRecord, timestamp: &str) -> Result<u32> {
    let row = lead.status_row()?;
    let column = find_column(sheet, SENT_STATUS)?;
    sheet.update_cell(row, column, timestamp)?;
    Ok(row)
}

/// Column letters for a 1-based index (`1` → `A`, `27` → `AA`).
pub fn column_letters(mut column: u32) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A1 reference to one cell of `worksheet`, quoting the sheet name.
pub fn a1_cell(worksheet: &str, row: u32, column: u32) -> String {
    format!(
        "'{}'!{}{}",
        worksheet.replace('\'', "''"),
        column_letters(column),
        row
    )
}
