//! Lead selection for a single store.
//!
//! The seen-set is owned by the caller so one run can thread it through
//! every row without hidden state.
use crate::lead::LeadRecord;
use std::collections::HashSet;

/// Why a row was or was not picked for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    OtherStore,
    AlreadySent,
    Duplicate,
    Selected,
}

/// Classify one row, recording selected Entry IDs in `seen`.
pub fn classify(lead: &LeadRecord, store_id: &str, seen: &mut HashSet<String>) -> Selection {
    if lead.store() != store_id {
        return Selection::OtherStore;
    }
    if lead.is_sent() {
        return Selection::AlreadySent;
    }
    if !seen.insert(lead.entry_id().to_string()) {
        return Selection::Duplicate;
    }
    Selection::Selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::{ENTRY_ID, SENT_STATUS, STORE};

    /// Entry IDs a single run would process for `store_id`, in sheet order.
    fn select_leads<'a>(leads: &'a [LeadRecord], store_id: &str) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        leads
            .iter()
            .filter(|lead| classify(lead, store_id, &mut seen) == Selection::Selected)
            .map(LeadRecord::entry_id)
            .collect()
    }

    fn lead(entry: &str, store: &str, status: &str) -> LeadRecord {
        LeadRecord::from_pairs([(ENTRY_ID, entry), (STORE, store), (SENT_STATUS, status)])
    }

    #[test]
    fn other_stores_are_never_selected() {
        let leads = vec![
            lead("0", "S2", ""),
            lead("1", "S2", "garbage"),
            lead("2", "s1", ""),
            lead("3", "S1", ""),
        ];
        let picked = select_leads(&leads, "S1");
        assert_eq!(picked, vec!["3"]);
    }

    #[test]
    fn sent_rows_are_skipped_but_malformed_markers_are_not() {
        let leads = vec![
            lead("0", "S1", "2024-01-15 09:00:00"),
            lead("1", "S1", "2024-01-15"),
            lead("2", "S1", "  "),
        ];
        let picked = select_leads(&leads, "S1");
        assert_eq!(picked, vec!["1", "2"]);
    }

    #[test]
    fn duplicate_entry_ids_are_selected_once() {
        let leads = vec![
            lead("7", "S1", ""),
            lead("8", "S1", ""),
            lead("7", "S1", ""),
        ];
        let picked = select_leads(&leads, "S1");
        assert_eq!(picked, vec!["7", "8"]);
    }

    #[test]
    fn classify_only_marks_selected_rows_as_seen() {
        let mut seen = HashSet::new();
        assert_eq!(
            classify(&lead("1", "S1", "2024-01-15 09:00:00"), "S1", &mut seen),
            Selection::AlreadySent
        );
        assert_eq!(
            classify(&lead("1", "S2", ""), "S1", &mut seen),
            Selection::OtherStore
        );
        assert!(seen.is_empty());
        assert_eq!(
            classify(&lead("1", "S1", ""), "S1", &mut seen),
            Selection::Selected
        );
        assert_eq!(
            classify(&lead("1", "S1", ""), "S1", &mut seen),
            Selection::Duplicate
        );
    }
}
