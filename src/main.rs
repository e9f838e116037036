use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod adf;
mod cli;
mod config;
mod filter;
mod google;
mod lead;
mod mail;
mod relay;
mod sheet;

use adf::{render_lead, AdfConstants};
use cli::{Command, InitArgs, RenderArgs, RootArgs, RunArgs};
use config::{load_config, override_store, resolve_config_path, write_config_stub, CONFIG_ENV};
use google::auth::ServiceAccountKey;
use google::secrets::{fetch_secret, mail_credentials};
use google::sheets::Worksheet;
use lead::LeadRecord;
use mail::SmtpDispatcher;
use relay::{relay_leads, sent_timestamp, Delivery, LeadOutcome, RelayContext, RunSummary};

const LOG_ENV: &str = "ADF_RELAY_LOG";

fn main() -> Result<()> {
    init_logging();
    let args = RootArgs::parse();
    match args.command {
        Command::Init(args) => cmd_init(args),
        Command::Run(args) => cmd_run(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn config_path(flag: Option<&Path>) -> std::path::PathBuf {
    resolve_config_path(flag, std::env::var(CONFIG_ENV).ok())
}

fn cmd_init(args: InitArgs) -> Result<()> {
    let path = config_path(args.config.as_deref());
    write_config_stub(&path, args.force)?;
    println!("Wrote config stub to {}", path.display());
    println!("Next: fill in project, secret, store, key file, and spreadsheet identifiers.");
    Ok(())
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let mut config = load_config(&config_path(args.config.as_deref()))?;
    if let Some(store) = args.store {
        override_store(&mut config, store)?;
    }

    let key = ServiceAccountKey::load(&config.credential_path)?;
    let secret = fetch_secret(&key, &config.project_id, &config.secret_id)
        .context("retrieve mail login secret")?;
    let creds = mail_credentials(secret)?;

    let sheet = Worksheet::open(&key, &config.spreadsheet_key, &config.worksheet)?;
    let dispatcher;
    let delivery = if args.dry_run {
        Delivery::DryRun
    } else {
        dispatcher = SmtpDispatcher::new(&config.smtp, &config.mail, &creds)?;
        Delivery::Send(&dispatcher)
    };
    let ctx = RelayContext {
        sheet: &sheet,
        delivery,
        constants: &config.adf,
        store_id: &config.store_id,
        clock: &sent_timestamp,
    };
    let summary = relay_leads(&ctx)?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("serialize run summary")?
        );
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Store {}: {} rows read, {} sent, {} skipped, {} failed",
        summary.store_id,
        summary.rows_read,
        summary.sent(),
        summary.skipped(),
        summary.failed()
    );
    if summary.previewed() > 0 {
        println!("Dry run: {} leads rendered, none sent", summary.previewed());
    }
    for outcome in &summary.outcomes {
        let label = match outcome {
            LeadOutcome::Sent { row, .. } => format!("sent (row {row})"),
            LeadOutcome::Failed { reason, .. } => format!("failed: {reason}"),
            LeadOutcome::SkippedDuplicate { .. } => "duplicate".to_string(),
            LeadOutcome::Previewed { .. } => "preview".to_string(),
            LeadOutcome::SkippedAlreadySent { .. } => continue,
        };
        println!("  {:<8} {label}", outcome.entry_id());
    }
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let constants = match args.config.as_deref() {
        Some(path) => load_config(path)?.adf,
        None => AdfConstants::default(),
    };
    let lead = read_lead_file(&args.lead)?;
    let xml = render_lead(&lead, &constants)?;
    println!("{xml}");
    Ok(())
}

/// Lead files are flat JSON objects; numeric cells are accepted as-is.
fn read_lead_file(path: &Path) -> Result<LeadRecord> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read lead {}", path.display()))?;
    let object: Map<String, Value> = serde_json::from_str(&content)
        .with_context(|| format!("parse lead {}", path.display()))?;
    let mut pairs = Vec::with_capacity(object.len());
    for (column, value) in object {
        let text = match value {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Null => String::new(),
            other => return Err(anyhow!("lead column {column:?} has non-scalar value {other}")),
        };
        pairs.push((column, text));
    }
    Ok(LeadRecord::from_pairs(pairs))
}
