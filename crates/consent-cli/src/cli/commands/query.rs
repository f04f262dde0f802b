//! exists / check / show / list: read-only commands.

use super::output::{print_json, print_record, record_line};
use crate::cli::args::{ListArgs, OutputFormat, PairArgs};
use crate::exit_codes::{from_outcome, EXIT_NEGATIVE, EXIT_SUCCESS};
use consent_core::{ConsentRecord, ConsentStore, ListQuery, RecordId};
use serde::Serialize;

#[derive(Serialize)]
struct ExistsOutput {
    exists: bool,
    id: Option<RecordId>,
}

#[derive(Serialize)]
struct CheckOutput {
    accepted: bool,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    total: usize,
    records: &'a [ConsentRecord],
}

pub(crate) fn exists(
    store: &ConsentStore,
    pair: &PairArgs,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    let id = store.exists(&pair.user_id, &pair.consent_id)?;
    match format {
        OutputFormat::Json => print_json(&ExistsOutput {
            exists: id.is_some(),
            id,
        })?,
        OutputFormat::Text => match id {
            Some(id) => println!("{id}"),
            None => println!("not found"),
        },
    }
    Ok(from_outcome(id.is_some()))
}

pub(crate) fn check(
    store: &ConsentStore,
    pair: &PairArgs,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    let accepted = store.has_consent(&pair.user_id, &pair.consent_id)?;
    match format {
        OutputFormat::Json => print_json(&CheckOutput { accepted })?,
        OutputFormat::Text => println!("{}", if accepted { "accepted" } else { "not accepted" }),
    }
    Ok(from_outcome(accepted))
}

pub(crate) fn show(
    store: &ConsentStore,
    pair: &PairArgs,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    match store.get(&pair.user_id, &pair.consent_id)? {
        Some(record) => {
            print_record(&record, format)?;
            Ok(EXIT_SUCCESS)
        }
        None => {
            match format {
                OutputFormat::Json => println!("null"),
                OutputFormat::Text => println!("not found"),
            }
            Ok(EXIT_NEGATIVE)
        }
    }
}

pub(crate) fn list(
    store: &ConsentStore,
    args: &ListArgs,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    let query = ListQuery {
        user_id: args.user_id.clone(),
        consent_id: args.consent_id.clone(),
        status: args.status,
        limit: args.limit,
        offset: args.offset,
    };
    let total = store.count(&query)?;
    let records = store.list(&query)?;

    match format {
        OutputFormat::Json => print_json(&ListOutput {
            total,
            records: &records,
        })?,
        OutputFormat::Text => {
            for record in &records {
                println!("{}", record_line(record));
            }
            eprintln!("{} of {} record(s)", records.len(), total);
        }
    }
    Ok(EXIT_SUCCESS)
}
