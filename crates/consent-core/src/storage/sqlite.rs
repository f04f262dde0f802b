//! SqliteCollection: SQLite-backed consent records.
//!
//! Pair uniqueness is a unique index, and inserts use
//! `ON CONFLICT(user_id, consent_id) DO NOTHING`, so two writers racing on the
//! same pair (even through separate connections) produce exactly one row.

use super::schema::{self, format_timestamp, parse_timestamp, MigrationReport};
use super::{Filter, Page, Predicate, RecordCollection, StoreError, StoreResult};
use crate::model::{ConsentRecord, ConsentStatus, NewRecord, RecordId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed record collection.
#[derive(Clone)]
pub struct SqliteCollection {
    pub(crate) conn: Arc<Mutex<Connection>>,
    migration: Option<MigrationReport>,
}

impl SqliteCollection {
    /// Open a file-backed collection, creating or migrating the schema.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Create an in-memory collection (for testing).
    pub fn memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection (for multi-connection tests).
    pub fn from_connection(mut conn: Connection) -> StoreResult<Self> {
        let migration = Self::init_connection(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            migration,
        })
    }

    fn init_connection(conn: &mut Connection) -> StoreResult<Option<MigrationReport>> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // WAL mode for file-backed DBs (no-op for in-memory)
        let _ = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0));
        schema::migrate(conn)
    }

    /// Legacy rewrite performed while opening, if any.
    pub fn migration_report(&self) -> Option<&MigrationReport> {
        self.migration.as_ref()
    }

    pub fn schema_version(&self) -> StoreResult<i64> {
        let conn = self.lock()?;
        schema::schema_version(&conn)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// `WHERE` clause and bound values for a filter.
fn where_clause(filter: &Filter) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();
    for predicate in filter.predicates() {
        match predicate {
            Predicate::UserId(u) => {
                clauses.push("user_id = ?");
                values.push(Value::Text(u.clone()));
            }
            Predicate::ConsentId(c) => {
                clauses.push("consent_id = ?");
                values.push(Value::Text(c.clone()));
            }
            Predicate::Status(s) => {
                clauses.push("status = ?");
                values.push(Value::Integer(s.as_flag()));
            }
        }
    }
    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

type RawRow = (i64, String, String, i64, String);

fn record_from_row(raw: RawRow) -> StoreResult<ConsentRecord> {
    let (id, user_id, consent_id, flag, created_at) = raw;
    let status = ConsentStatus::try_from(flag).map_err(|e| StoreError::Corrupt {
        id,
        reason: e.to_string(),
    })?;
    let created_at = parse_timestamp(&created_at).ok_or_else(|| StoreError::Corrupt {
        id,
        reason: format!("unparseable created_at '{}'", created_at),
    })?;
    Ok(ConsentRecord {
        id: RecordId::new(id),
        user_id,
        consent_id,
        status,
        created_at,
    })
}

impl RecordCollection for SqliteCollection {
    fn insert_if_absent(&self, record: NewRecord) -> StoreResult<Option<RecordId>> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            r#"
            INSERT INTO consent_log (user_id, consent_id, status, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, consent_id) DO NOTHING
            "#,
            params![
                record.user_id,
                record.consent_id,
                record.status.as_flag(),
                format_timestamp(&record.created_at),
            ],
        )?;
        if inserted == 0 {
            return Ok(None);
        }
        Ok(Some(RecordId::new(conn.last_insert_rowid())))
    }

    fn find(&self, filter: &Filter, page: Page) -> StoreResult<Vec<ConsentRecord>> {
        let (clause, mut values) = where_clause(filter);
        // Negative LIMIT means unbounded; saturate so huge offsets never wrap negative.
        let limit = page
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        let offset = i64::try_from(page.offset).unwrap_or(i64::MAX);
        values.push(Value::Integer(limit));
        values.push(Value::Integer(offset));

        let sql = format!(
            "SELECT id, user_id, consent_id, status, created_at FROM consent_log{}
             ORDER BY created_at DESC, id DESC
             LIMIT ? OFFSET ?",
            clause
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })?
            .collect::<Result<Vec<RawRow>, _>>()?;

        rows.into_iter().map(record_from_row).collect()
    }

    fn count(&self, filter: &Filter) -> StoreResult<usize> {
        let (clause, values) = where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM consent_log{}", clause);
        let conn = self.lock()?;
        let n: i64 = conn.query_row(&sql, params_from_iter(values), |row| row.get(0))?;
        Ok(n as usize)
    }

    fn set_status(&self, id: RecordId, status: ConsentStatus) -> StoreResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE consent_log SET status = ?1 WHERE id = ?2",
            params![status.as_flag(), id.get()],
        )?;
        Ok(changed > 0)
    }

    fn delete(&self, id: RecordId) -> StoreResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM consent_log WHERE id = ?1", [id.get()])?;
        Ok(changed > 0)
    }

    fn delete_matching(&self, filter: &Filter) -> StoreResult<usize> {
        let (clause, values) = where_clause(filter);
        let sql = format!("DELETE FROM consent_log{}", clause);
        let conn = self.lock()?;
        Ok(conn.execute(&sql, params_from_iter(values))?)
    }
}
