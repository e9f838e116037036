use super::*;
use crate::lead::{ENTRY_ID, SENT_STATUS, STORE};

const JANE_DOE_ADF: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<?adf version=\"1.0\"?>\n",
    "<adf><prospect><requestdate>2024-01-15T00:00:00</requestdate>",
    "<vehicle interest=\"buy\"><make>Your Vehicle Make</make><model>SedanX</model></vehicle>",
    "<customer><contact><name part=\"first\">Jane</name><name part=\"last\">Doe</name>",
    "<email>jane@example.com</email><phone>555-1234</phone>",
    "<address><postalcode>90210</postalcode></address></contact></customer>",
    "<provider><name>Your Provider Name</name></provider></prospect></adf>",
);

fn jane_doe(entry_date: &str) -> LeadRecord {
    LeadRecord::from_pairs([
        (ENTRY_ID, "3"),
        (ENTRY_DATE, entry_date),
        (STORE, "S1"),
        (OPTIONS, "SedanX,Red"),
        (FIRST_NAME, "Jane"),
        (LAST_NAME, "Doe"),
        (EMAIL, "jane@example.com"),
        (PHONE, "555-1234"),
        (ZIP_CODE, "90210"),
        (SENT_STATUS, ""),
    ])
}

#[test]
fn renders_reference_document() {
    let xml = render_lead(&jane_doe("01/15/2024"), &AdfConstants::default()).unwrap();
    assert_eq!(xml, JANE_DOE_ADF);
}

#[test]
fn rendering_is_deterministic() {
    let lead = jane_doe("01/15/2024");
    let constants = AdfConstants::default();
    let first = render_lead(&lead, &constants).unwrap();
    let second = render_lead(&lead, &constants).unwrap();
    assert_eq!(first, second);
}

#[test]
fn bad_entry_date_yields_empty_requestdate() {
    let xml = render_lead(&jane_doe("2024-01-15"), &AdfConstants::default()).unwrap();
    assert!(xml.contains("<prospect><requestdate/><vehicle"));
    assert!(xml.ends_with("</prospect></adf>"));
    assert!(xml.contains("<postalcode>90210</postalcode>"));
}

#[test]
fn request_date_has_no_offset() {
    assert_eq!(
        format_request_date("12/31/2023").as_deref(),
        Some("2023-12-31T00:00:00")
    );
    assert_eq!(format_request_date("13/01/2024"), None);
    assert_eq!(format_request_date(""), None);
}

#[test]
fn model_is_first_trimmed_option() {
    assert_eq!(vehicle_model(" SedanX , Red"), "SedanX");
    assert_eq!(vehicle_model("Coupe"), "Coupe");
    assert_eq!(vehicle_model(""), "");
}

#[test]
fn configured_constants_replace_placeholders() {
    let constants = AdfConstants {
        vehicle_make: "Acme Motors".to_string(),
        provider_name: "Lead Form".to_string(),
    };
    let xml = render_lead(&jane_doe("01/15/2024"), &constants).unwrap();
    assert!(xml.contains("<make>Acme Motors</make>"));
    assert!(xml.contains("<provider><name>Lead Form</name></provider>"));
}

#[test]
fn markup_in_lead_fields_is_escaped() {
    let lead = LeadRecord::from_pairs([
        (ENTRY_DATE, "01/15/2024"),
        (OPTIONS, "SedanX"),
        (FIRST_NAME, "Jane"),
        (LAST_NAME, "O'Brien & <Sons>"),
        (EMAIL, "jane@example.com"),
        (PHONE, "555-1234"),
        (ZIP_CODE, "90210"),
    ]);
    let xml = render_lead(&lead, &AdfConstants::default()).unwrap();
    assert!(xml.contains("<name part=\"last\">O'Brien &amp; &lt;Sons&gt;</name>"));
}

#[test]
fn missing_optional_names_render_empty() {
    let lead = LeadRecord::from_pairs([
        (ENTRY_DATE, "01/15/2024"),
        (OPTIONS, "SedanX"),
        (EMAIL, "jane@example.com"),
        (PHONE, "555-1234"),
        (ZIP_CODE, "90210"),
    ]);
    let xml = render_lead(&lead, &AdfConstants::default()).unwrap();
    assert!(xml.contains("<name part=\"first\"/><name part=\"last\"/>"));
}

#[test]
fn empty_values_use_the_same_form_as_a_missing_date() {
    let lead = LeadRecord::from_pairs([
        (ENTRY_DATE, "not a date"),
        (OPTIONS, ""),
        (FIRST_NAME, "Jane"),
        (LAST_NAME, ""),
        (EMAIL, "jane@example.com"),
        (PHONE, "555-1234"),
        (ZIP_CODE, "90210"),
    ]);
    let xml = render_lead(&lead, &AdfConstants::default()).unwrap();
    assert!(xml.contains("<requestdate/>"));
    assert!(xml.contains("<model/>"));
    assert!(xml.contains("<name part=\"last\"/>"));
    assert!(!xml.contains("></"), "{xml}");
}

#[test]
fn missing_required_column_fails_the_lead() {
    let lead = LeadRecord::from_pairs([(ENTRY_DATE, "01/15/2024"), (OPTIONS, "SedanX")]);
    let err = render_lead(&lead, &AdfConstants::default()).unwrap_err();
    assert!(err.to_string().contains("Email"));
}
