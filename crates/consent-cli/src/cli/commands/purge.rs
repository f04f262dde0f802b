//! purge-user: delete every record of one user.

use super::output::print_json;
use crate::cli::args::{OutputFormat, PurgeUserArgs};
use crate::exit_codes::{EXIT_NEGATIVE, EXIT_SUCCESS};
use consent_core::ConsentStore;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PurgeOutput {
    success: bool,
    removed: usize,
}

pub(crate) fn run(
    store: &ConsentStore,
    args: &PurgeUserArgs,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    if !args.yes {
        tracing::warn!(user_id = %args.user_id, "purge refused without --yes");
        match format {
            OutputFormat::Json => print_json(&PurgeOutput {
                success: false,
                removed: 0,
            })?,
            OutputFormat::Text => {
                eprintln!("refusing to delete all records of {} without --yes", args.user_id);
            }
        }
        return Ok(EXIT_NEGATIVE);
    }

    let removed = store.remove_all_for_user(&args.user_id)?;
    match format {
        OutputFormat::Json => print_json(&PurgeOutput {
            success: true,
            removed,
        })?,
        OutputFormat::Text => println!("removed {} record(s) for {}", removed, args.user_id),
    }
    Ok(EXIT_SUCCESS)
}
