//! ADF (Auto-lead Data Format) rendering.
//!
//! Each lead becomes one `<adf><prospect>` document. The node shape is fixed;
//! make and provider name come from deployment config, never from the lead.
use crate::lead::{
    LeadRecord, EMAIL, ENTRY_DATE, FIRST_NAME, LAST_NAME, OPTIONS, PHONE, ZIP_CODE,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};

pub const XML_PROLOG: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<?adf version=\"1.0\"?>\n";

pub const DEFAULT_VEHICLE_MAKE: &str = "Your Vehicle Make";
pub const DEFAULT_PROVIDER_NAME: &str = "Your Provider Name";

const ENTRY_DATE_FORMAT: &str = "%m/%d/%Y";
// No offset: entry dates are naive, so requestdate carries local wall time.
const REQUEST_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Literal values stamped into every document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdfConstants {
    #[serde(default = "default_vehicle_make")]
    pub vehicle_make: String,
    #[serde(default = "default_provider_name")]
    pub provider_name: String,
}

impl Default for AdfConstants {
    fn default() -> Self {
        Self {
            vehicle_make: default_vehicle_make(),
            provider_name: default_provider_name(),
        }
    }
}

fn default_vehicle_make() -> String {
    DEFAULT_VEHICLE_MAKE.to_string()
}

fn default_provider_name() -> String {
    DEFAULT_PROVIDER_NAME.to_string()
}

/// Render one lead as a complete ADF document, prolog included.
///
/// A malformed `Entry Date` does not fail the lead; it leaves
/// `<requestdate/>` empty.
pub fn render_lead(lead: &LeadRecord, constants: &AdfConstants) -> Result<String> {
    let request_date = format_request_date(lead.require(ENTRY_DATE)?);
    let model = vehicle_model(lead.require(OPTIONS)?);

    let mut writer = Writer::new(Vec::new());
    open(&mut writer, "adf")?;
    open(&mut writer, "prospect")?;
    text_element(
        &mut writer,
        BytesStart::new("requestdate"),
        request_date.as_deref().unwrap_or_default(),
    )?;

    writer.write_event(Event::Start(
        BytesStart::new("vehicle").with_attributes([("interest", "buy")]),
    ))?;
    text_element(&mut writer, BytesStart::new("make"), &constants.vehicle_make)?;
    text_element(&mut writer, BytesStart::new("model"), model)?;
    close(&mut writer, "vehicle")?;

    open(&mut writer, "customer")?;
    open(&mut writer, "contact")?;
    text_element(
        &mut writer,
        BytesStart::new("name").with_attributes([("part", "first")]),
        lead.get(FIRST_NAME).unwrap_or_default(),
    )?;
    text_element(
        &mut writer,
        BytesStart::new("name").with_attributes([("part", "last")]),
        lead.get(LAST_NAME).unwrap_or_default(),
    )?;
    text_element(&mut writer, BytesStart::new("email"), lead.require(EMAIL)?)?;
    text_element(&mut writer, BytesStart::new("phone"), lead.require(PHONE)?)?;
    open(&mut writer, "address")?;
    text_element(
        &mut writer,
        BytesStart::new("postalcode"),
        lead.require(ZIP_CODE)?,
    )?;
    close(&mut writer, "address")?;
    close(&mut writer, "contact")?;
    close(&mut writer, "customer")?;

    open(&mut writer, "provider")?;
    text_element(&mut writer, BytesStart::new("name"), &constants.provider_name)?;
    close(&mut writer, "provider")?;
    close(&mut writer, "prospect")?;
    close(&mut writer, "adf")?;

    let body = String::from_utf8(writer.into_inner()).context("ADF body is not UTF-8")?;
    Ok(format!("{XML_PROLOG}{body}"))
}

/// Convert a sheet `MM/DD/YYYY` date into the ADF request date.
pub fn format_request_date(raw: &str) -> Option<String> {
    match NaiveDate::parse_from_str(raw, ENTRY_DATE_FORMAT) {
        Ok(date) => Some(
            date.and_hms_opt(0, 0, 0)?
                .format(REQUEST_DATE_FORMAT)
                .to_string(),
        ),
        Err(err) => {
            tracing::warn!(entry_date = raw, error = %err, "unparseable entry date");
            None
        }
    }
}

/// First comma-separated option, which the lead form fills with the model.
pub fn vehicle_model(options: &str) -> &str {
    options.split(',').next().unwrap_or_default().trim()
}

fn open(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn close(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Write `<tag>text</tag>`, or `<tag/>` when `text` is empty.
fn text_element(writer: &mut Writer<Vec<u8>>, start: BytesStart<'_>, text: &str) -> Result<()> {
    if text.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

#[cfg(test)]
#[path = "adf_tests.rs"]
mod tests;
