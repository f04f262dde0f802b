use clap::{Parser, Subcommand};
use consent_core::ConsentStatus;
use std::path::PathBuf;

pub mod common;
pub use common::*;

#[derive(Parser)]
#[command(
    name = "consent",
    version,
    about = "Record and query per-user consent decisions"
)]
pub struct Cli {
    /// Config file (default: ./consent.yaml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path; overrides `storage.path`
    #[arg(long, global = true, env = "CONSENT_DB")]
    pub db: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record a decision for a pair that has none yet
    Add(StatusArgs),
    /// Change the decision of an existing record
    Update(StatusArgs),
    /// Delete the record of a pair
    Remove(PairArgs),
    /// Print the record id of a pair, if any
    Exists(PairArgs),
    /// Exit 0 iff the pair has an accepted record
    Check(PairArgs),
    /// Print the full record of a pair
    Show(PairArgs),
    /// List records, newest first
    List(ListArgs),
    /// Delete every record of one user
    PurgeUser(PurgeUserArgs),
    Version,
}

#[derive(clap::Args, Clone, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub pair: PairArgs,

    /// accepted|declined (or 1|0)
    #[arg(long)]
    pub status: ConsentStatus,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct ListArgs {
    #[arg(long = "user")]
    pub user_id: Option<String>,

    #[arg(long = "consent")]
    pub consent_id: Option<String>,

    /// accepted|declined (or 1|0)
    #[arg(long)]
    pub status: Option<ConsentStatus>,

    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

#[derive(clap::Args, Clone, Debug)]
pub struct PurgeUserArgs {
    #[arg(long = "user")]
    pub user_id: String,

    /// Confirm the bulk delete
    #[arg(long)]
    pub yes: bool,
}
