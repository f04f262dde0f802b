//! Text and JSON rendering of command results. Results go to stdout.

use crate::cli::args::OutputFormat;
use chrono::SecondsFormat;
use consent_core::ConsentRecord;
use serde::Serialize;

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn created(record: &ConsentRecord) -> String {
    record.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn record_line(record: &ConsentRecord) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        record.id,
        record.user_id,
        record.consent_id,
        record.status,
        created(record)
    )
}

pub(crate) fn print_record(record: &ConsentRecord, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(record)?,
        OutputFormat::Text => {
            println!("id:         {}", record.id);
            println!("user:       {}", record.user_id);
            println!("consent:    {}", record.consent_id);
            println!("status:     {}", record.status);
            println!("created_at: {}", created(record));
        }
    }
    Ok(())
}

/// Outcome of a single-record mutation.
#[derive(Debug, Serialize)]
pub(crate) struct Outcome<'a> {
    pub action: &'a str,
    pub success: bool,
    pub user_id: &'a str,
    pub consent_id: &'a str,
}

impl Outcome<'_> {
    pub(crate) fn print(
        &self,
        format: OutputFormat,
        done: &str,
        refused: &str,
    ) -> anyhow::Result<()> {
        match format {
            OutputFormat::Json => print_json(self),
            OutputFormat::Text => {
                let msg = if self.success { done } else { refused };
                println!("{}: user={} consent={}", msg, self.user_id, self.consent_id);
                Ok(())
            }
        }
    }
}
