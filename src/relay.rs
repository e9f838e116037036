//! Per-lead relay loop.
//!
//! Each selected lead walks `formatted → mailed → status-updated`. A failure
//! at any step ends that lead as [`LeadOutcome::Failed`] and leaves its
//! status cell untouched, so the next run picks it up again. Sibling leads
//! are unaffected.
use crate::adf::{render_lead, AdfConstants};
use crate::filter::{classify, Selection};
use crate::lead::{LeadRecord, SENT_TIMESTAMP_FORMAT};
use crate::mail::MailDispatcher;
use crate::sheet::{mark_sent, LeadSheet};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;

/// How selected leads leave the process.
pub enum Delivery<'a> {
    /// Mail each lead and stamp its status cell.
    Send(&'a dyn MailDispatcher),
    /// Render only; no mail and no sheet writes.
    DryRun,
}

/// Everything one relay run reads from or writes to.
pub struct RelayContext<'a> {
    pub sheet: &'a dyn LeadSheet,
    pub delivery: Delivery<'a>,
    pub constants: &'a AdfConstants,
    pub store_id: &'a str,
    /// Produces the `Sent Status` marker at the moment it is written.
    pub clock: &'a dyn Fn() -> String,
}

/// Final state of one lead row for this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LeadOutcome {
    Sent { entry_id: String, row: u32 },
    SkippedAlreadySent { entry_id: String },
    SkippedDuplicate { entry_id: String },
    Previewed { entry_id: String },
    Failed { entry_id: String, reason: String },
}

impl LeadOutcome {
    pub fn entry_id(&self) -> &str {
        match self {
            LeadOutcome::Sent { entry_id, .. }
            | LeadOutcome::SkippedAlreadySent { entry_id }
            | LeadOutcome::SkippedDuplicate { entry_id }
            | LeadOutcome::Previewed { entry_id }
            | LeadOutcome::Failed { entry_id, .. } => entry_id,
        }
    }
}

/// Per-run tally printed by `adfrelay run`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub store_id: String,
    pub rows_read: usize,
    /// Rows belonging to other stores; not listed individually.
    pub other_store: usize,
    pub outcomes: Vec<LeadOutcome>,
}

impl RunSummary {
    pub fn sent(&self) -> usize {
        self.count(|outcome| matches!(outcome, LeadOutcome::Sent { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, LeadOutcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| {
            matches!(
                outcome,
                LeadOutcome::SkippedAlreadySent { .. } | LeadOutcome::SkippedDuplicate { .. }
            )
        })
    }

    pub fn previewed(&self) -> usize {
        self.count(|outcome| matches!(outcome, LeadOutcome::Previewed { .. }))
    }

    fn count(&self, pred: impl Fn(&LeadOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|outcome| pred(outcome)).count()
    }
}

/// Local wall-clock `Sent Status` marker.
pub fn sent_timestamp() -> String {
    chrono::Local::now()
        .format(SENT_TIMESTAMP_FORMAT)
        .to_string()
}

/// Read the sheet and relay every eligible lead for the context's store.
///
/// Only the sheet read can fail the run; per-lead errors are folded into
/// the summary.
pub fn relay_leads(ctx: &RelayContext<'_>) -> Result<RunSummary> {
    let records = ctx.sheet.records().context("load leads")?;
    let mut summary = RunSummary {
        store_id: ctx.store_id.to_string(),
        rows_read: records.len(),
        ..RunSummary::default()
    };
    let mut seen = HashSet::new();

    for lead in &records {
        let entry_id = lead.entry_id().to_string();
        let outcome = match classify(lead, ctx.store_id, &mut seen) {
            Selection::OtherStore => {
                summary.other_store += 1;
                continue;
            }
            Selection::AlreadySent => {
                tracing::debug!(entry_id = %entry_id, "lead already sent");
                LeadOutcome::SkippedAlreadySent { entry_id }
            }
            Selection::Duplicate => {
                tracing::warn!(entry_id = %entry_id, "duplicate entry id in sheet; skipped");
                LeadOutcome::SkippedDuplicate { entry_id }
            }
            Selection::Selected => process_lead(ctx, lead),
        };
        summary.outcomes.push(outcome);
    }

    tracing::info!(
        store_id = ctx.store_id,
        rows = summary.rows_read,
        sent = summary.sent(),
        failed = summary.failed(),
        skipped = summary.skipped(),
        "relay run complete"
    );
    Ok(summary)
}

/// Drive one selected lead to its terminal outcome.
pub fn process_lead(ctx: &RelayContext<'_>, lead: &LeadRecord) -> LeadOutcome {
    let entry_id = lead.entry_id().to_string();
    match deliver(ctx, lead) {
        Ok(Some(row)) => LeadOutcome::Sent { entry_id, row },
        Ok(None) => LeadOutcome::Previewed { entry_id },
        Err(err) => {
            let reason = format!("{err:#}");
            tracing::error!(entry_id = %entry_id, error = %reason, "lead not relayed");
            LeadOutcome::Failed { entry_id, reason }
        }
    }
}

/// Returns the written row, or `None` for a dry run.
fn deliver(ctx: &RelayContext<'_>, lead: &LeadRecord) -> Result<Option<u32>> {
    let xml = render_lead(lead, ctx.constants).context("render ADF")?;
    // Leads whose status row cannot be addressed are never mailed.
    lead.status_row().context("locate status row")?;
    let mailer = match &ctx.delivery {
        Delivery::Send(mailer) => *mailer,
        Delivery::DryRun => {
            tracing::info!(entry_id = lead.entry_id(), xml = %xml, "dry run; lead not sent");
            return Ok(None);
        }
    };
    mailer.send(&xml).context("dispatch ADF email")?;
    let timestamp = (ctx.clock)();
    let row = mark_sent(ctx.sheet, lead, &timestamp).context("record sent status")?;
    tracing::info!(entry_id = lead.entry_id(), row, "lead relayed");
    Ok(Some(row))
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
