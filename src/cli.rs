//! CLI argument parsing for the lead relay.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "adfrelay",
    version,
    about = "Relay spreadsheet leads to a dealer inbox as ADF XML",
    after_help = "Commands:\n  init                 Write an adfrelay.json stub to edit\n  run                  Send unsent leads for the configured store\n  render --lead <file> Print the ADF document for one lead\n\nExamples:\n  adfrelay init --config /etc/adfrelay.json\n  adfrelay run --config /etc/adfrelay.json --dry-run\n  ADF_RELAY_LOG=debug adfrelay run --store S1 --json\n  adfrelay render --lead lead.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level relay commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Run(RunArgs),
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
#[command(about = "Write a config stub with placeholder identifiers")]
pub struct InitArgs {
    /// Config path (defaults to $ADF_RELAY_CONFIG, then ./adfrelay.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Relay unsent leads for one store")]
pub struct RunArgs {
    /// Config path (defaults to $ADF_RELAY_CONFIG, then ./adfrelay.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Store id to relay instead of the configured one
    #[arg(long, value_name = "ID")]
    pub store: Option<String>,

    /// Render selected leads without sending mail or writing the sheet
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Render one lead record as an ADF document")]
pub struct RenderArgs {
    /// JSON object mapping column names to cell values
    #[arg(long, value_name = "FILE")]
    pub lead: PathBuf,

    /// Config supplying make and provider name (defaults used when absent)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
