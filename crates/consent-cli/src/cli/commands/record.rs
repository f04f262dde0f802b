//! add / update / remove: single-record mutations.

use super::output::Outcome;
use crate::cli::args::{OutputFormat, PairArgs, StatusArgs};
use crate::exit_codes::from_outcome;
use consent_core::sanitize::sanitize_key;
use consent_core::ConsentStore;

/// Print the outcome with the keys as stored, not as typed.
fn report(
    action: &str,
    success: bool,
    pair: &PairArgs,
    format: OutputFormat,
    messages: (&str, &str),
) -> anyhow::Result<i32> {
    let user_id = sanitize_key(&pair.user_id);
    let consent_id = sanitize_key(&pair.consent_id);
    Outcome {
        action,
        success,
        user_id: &user_id,
        consent_id: &consent_id,
    }
    .print(format, messages.0, messages.1)?;
    Ok(from_outcome(success))
}

pub(crate) fn add(
    store: &ConsentStore,
    args: &StatusArgs,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    let pair = &args.pair;
    let success = store.add(&pair.user_id, &pair.consent_id, args.status)?;
    report("add", success, pair, format, ("consent added", "consent already recorded"))
}

pub(crate) fn update(
    store: &ConsentStore,
    args: &StatusArgs,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    let pair = &args.pair;
    let success = store.update(&pair.user_id, &pair.consent_id, args.status)?;
    report("update", success, pair, format, ("consent updated", "no consent recorded"))
}

pub(crate) fn remove(
    store: &ConsentStore,
    pair: &PairArgs,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    let success = store.remove(&pair.user_id, &pair.consent_id)?;
    report("remove", success, pair, format, ("consent removed", "no consent recorded"))
}
