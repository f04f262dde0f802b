//! SQLite schema and migrations for the consent log.
//!
//! `PRAGMA user_version` carries the schema version:
//! - 1: bare `consent_log` table, no pair uniqueness, unchecked status
//! - 2: unique `(user_id, consent_id)` index, `status IN (0, 1)`

use super::{StoreError, StoreResult};
use crate::model::ConsentStatus;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::HashMap;

pub const SCHEMA_VERSION: i64 = 2;

/// DDL for the current schema. Idempotent.
pub const CONSENT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS consent_log (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      TEXT NOT NULL,
    consent_id   TEXT NOT NULL,
    status       INTEGER NOT NULL CHECK (status IN (0, 1)),
    created_at   TEXT NOT NULL
);

-- One record per pair; also serves user_id-only lookups (leftmost prefix)
CREATE UNIQUE INDEX IF NOT EXISTS idx_consent_log_pair
    ON consent_log(user_id, consent_id);
CREATE INDEX IF NOT EXISTS idx_consent_log_created
    ON consent_log(created_at);
"#;

/// Version-1 layout, kept so legacy databases can be reproduced in tests.
pub const LEGACY_SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS consent_log (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      TEXT NOT NULL,
    consent_id   TEXT NOT NULL,
    status,
    created_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_consent_log_user ON consent_log(user_id);
PRAGMA user_version = 1;
"#;

/// What a legacy migration changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: i64,
    pub rows_kept: usize,
    pub duplicates_dropped: usize,
    pub statuses_rewritten: usize,
    /// Rows whose `created_at` was zero or unreadable and now carry [`LEGACY_FALLBACK_DATE`].
    pub dates_defaulted: usize,
}

/// `created_at` given to legacy rows without a usable date (e.g. `0000-00-00 00:00:00`).
pub const LEGACY_FALLBACK_DATE: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339, the host's `YYYY-MM-DD HH:MM:SS` and a bare
/// `YYYY-MM-DD` (midnight), all read as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub(crate) fn schema_version(conn: &Connection) -> StoreResult<i64> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Bring the database to [`SCHEMA_VERSION`]. Returns a report when legacy
/// rows were rewritten.
pub(crate) fn migrate(conn: &mut Connection) -> StoreResult<Option<MigrationReport>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let version = schema_version(&tx)?;
    if version > SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchema {
            found: version,
            supported: SCHEMA_VERSION,
        });
    }

    let report = if version == SCHEMA_VERSION || !table_exists(&tx, "consent_log")? {
        tx.execute_batch(CONSENT_SCHEMA)?;
        None
    } else {
        // user_version 0 with an existing table is an unversioned legacy import
        Some(migrate_legacy(&tx, version)?)
    };

    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;

    if let Some(r) = &report {
        tracing::warn!(
            from_version = r.from_version,
            rows_kept = r.rows_kept,
            duplicates_dropped = r.duplicates_dropped,
            statuses_rewritten = r.statuses_rewritten,
            dates_defaulted = r.dates_defaulted,
            "migrated legacy consent_log"
        );
    }
    Ok(report)
}

struct LegacyRow {
    id: i64,
    user_id: String,
    consent_id: String,
    status: Value,
    created_at: Option<DateTime<Utc>>,
}

impl LegacyRow {
    fn sort_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at.unwrap_or(LEGACY_FALLBACK_DATE), self.id)
    }
}

/// Legacy flags may be stored as text ("1") or reals; anything that is not
/// a number reads as 0, as a plain integer cast would.
fn legacy_flag(value: &Value) -> i64 {
    match value {
        Value::Integer(i) => *i,
        Value::Real(f) => *f as i64,
        Value::Text(s) => s.trim().parse().unwrap_or(0),
        Value::Null | Value::Blob(_) => 0,
    }
}

fn legacy_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Text(s) => parse_timestamp(s.trim()),
        _ => None,
    }
}

fn migrate_legacy(tx: &Transaction<'_>, from_version: i64) -> StoreResult<MigrationReport> {
    let rows = {
        let mut stmt = tx.prepare(
            "SELECT id, user_id, consent_id, status, created_at FROM consent_log ORDER BY id ASC",
        )?;
        let mapped = stmt.query_map([], |row| {
            Ok(LegacyRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                consent_id: row.get(2)?,
                status: row.get(3)?,
                created_at: legacy_date(&row.get::<_, Value>(4)?),
            })
        })?;
        mapped.collect::<Result<Vec<_>, _>>()?
    };
    let total = rows.len();

    // Lookups on the old schema returned the newest row of a pair
    // (created_at, then id), so that is the one kept.
    let mut newest: HashMap<(String, String), LegacyRow> = HashMap::new();
    for row in rows {
        let key = (row.user_id.clone(), row.consent_id.clone());
        match newest.get(&key) {
            Some(current) if current.sort_key() >= row.sort_key() => {}
            _ => {
                newest.insert(key, row);
            }
        }
    }
    let mut kept: Vec<LegacyRow> = newest.into_values().collect();
    kept.sort_by_key(|r| r.id);

    let legacy_indexes: Vec<String> = {
        let mut stmt = tx.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'index' AND tbl_name = 'consent_log' AND sql IS NOT NULL",
        )?;
        let names = stmt.query_map([], |row| row.get(0))?;
        names.collect::<Result<Vec<_>, _>>()?
    };
    for name in legacy_indexes {
        tx.execute_batch(&format!("DROP INDEX IF EXISTS \"{}\"", name))?;
    }

    tx.execute_batch("ALTER TABLE consent_log RENAME TO consent_log_legacy")?;
    tx.execute_batch(CONSENT_SCHEMA)?;

    let mut statuses_rewritten = 0;
    let mut dates_defaulted = 0;
    {
        let mut insert = tx.prepare(
            "INSERT INTO consent_log (id, user_id, consent_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for row in &kept {
            let flag = legacy_flag(&row.status);
            let status = ConsentStatus::from_flag_lossy(flag);
            if status.as_flag() != flag || !matches!(row.status, Value::Integer(_)) {
                statuses_rewritten += 1;
            }
            let created_at = row.created_at.unwrap_or_else(|| {
                dates_defaulted += 1;
                LEGACY_FALLBACK_DATE
            });
            insert.execute(params![
                row.id,
                row.user_id,
                row.consent_id,
                status.as_flag(),
                format_timestamp(&created_at),
            ])?;
        }
    }

    tx.execute_batch("DROP TABLE consent_log_legacy")?;

    Ok(MigrationReport {
        from_version,
        rows_kept: kept.len(),
        duplicates_dropped: total - kept.len(),
        statuses_rewritten,
        dates_defaulted,
    })
}
