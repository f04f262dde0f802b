//! Record collection abstraction and its SQLite / in-memory implementations.
//!
//! The consent service never talks to a database directly. It consumes a
//! [`RecordCollection`]: insert-if-absent, AND-filtered queries, status update
//! by id, and delete by id or filter. Both implementations enforce the
//! one-record-per-pair invariant inside the collection, so a racing `add`
//! cannot create a duplicate.

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;

use crate::config::{StorageBackend, StorageConfig};
use crate::model::{ConsentRecord, ConsentStatus, NewRecord, RecordId};
use std::sync::Arc;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryCollection;
pub use sqlite::SqliteCollection;

/// Equality predicate on one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    UserId(String),
    ConsentId(String),
    Status(ConsentStatus),
}

impl Predicate {
    pub fn matches(&self, record: &ConsentRecord) -> bool {
        match self {
            Predicate::UserId(u) => record.user_id == *u,
            Predicate::ConsentId(c) => record.consent_id == *c,
            Predicate::Status(s) => record.status == *s,
        }
    }
}

/// Flat AND-combination of predicates. An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn pair(user_id: &str, consent_id: &str) -> Self {
        Self::all()
            .and(Predicate::UserId(user_id.to_string()))
            .and(Predicate::ConsentId(consent_id.to_string()))
    }

    pub fn user(user_id: &str) -> Self {
        Self::all().and(Predicate::UserId(user_id.to_string()))
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, record: &ConsentRecord) -> bool {
        self.predicates.iter().all(|p| p.matches(record))
    }
}

/// Window over an ordered result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    /// `None` means no limit.
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Page {
    pub fn first() -> Self {
        Self {
            limit: Some(1),
            offset: 0,
        }
    }
}

/// Listing request as accepted by [`crate::ConsentStore::list`]. Keys are
/// sanitized by the service before they become predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub user_id: Option<String>,
    pub consent_id: Option<String>,
    pub status: Option<ConsentStatus>,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Durable record collection consumed by the consent service.
///
/// Results of [`RecordCollection::find`] are ordered newest first
/// (`created_at` descending, then id descending).
pub trait RecordCollection: Send + Sync {
    /// Insert `record` unless one with the same `(user_id, consent_id)`
    /// already exists. Returns `None` when the pair is taken.
    fn insert_if_absent(&self, record: NewRecord) -> StoreResult<Option<RecordId>>;

    fn find(&self, filter: &Filter, page: Page) -> StoreResult<Vec<ConsentRecord>>;

    fn count(&self, filter: &Filter) -> StoreResult<usize>;

    /// Overwrite the status of record `id`. Returns false if it does not exist.
    fn set_status(&self, id: RecordId, status: ConsentStatus) -> StoreResult<bool>;

    /// Delete record `id`. Returns false if it does not exist.
    fn delete(&self, id: RecordId) -> StoreResult<bool>;

    /// Delete every record matching `filter`, returning how many were removed.
    fn delete_matching(&self, filter: &Filter) -> StoreResult<usize>;

    fn find_one(&self, filter: &Filter) -> StoreResult<Option<ConsentRecord>> {
        Ok(self.find(filter, Page::first())?.into_iter().next())
    }
}

pub type SharedCollection = Arc<dyn RecordCollection>;

/// Build the collection selected by `config`.
pub fn open_collection(config: &StorageConfig) -> StoreResult<SharedCollection> {
    match config.backend {
        StorageBackend::Sqlite => {
            if let Some(parent) = config.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                        path: parent.to_path_buf(),
                        message: e.to_string(),
                    })?;
                }
            }
            Ok(Arc::new(SqliteCollection::open(&config.path)?))
        }
        StorageBackend::Memory => Ok(Arc::new(MemoryCollection::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(user: &str, consent: &str, status: ConsentStatus) -> ConsentRecord {
        ConsentRecord {
            id: RecordId::new(1),
            user_id: user.to_string(),
            consent_id: consent.to_string(),
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn pair_filter_requires_both_fields() {
        let filter = Filter::pair("a@b.com", "form_1");
        assert_eq!(filter.predicates().len(), 2);
        assert!(filter.matches(&record("a@b.com", "form_1", ConsentStatus::Accepted)));
        assert!(!filter.matches(&record("a@b.com", "form_2", ConsentStatus::Accepted)));
        assert!(!filter.matches(&record("x@b.com", "form_1", ConsentStatus::Accepted)));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::all().matches(&record("u", "c", ConsentStatus::Declined)));
    }

    #[test]
    fn status_predicate_combines_with_user() {
        let filter = Filter::user("u").and(Predicate::Status(ConsentStatus::Accepted));
        assert!(filter.matches(&record("u", "c", ConsentStatus::Accepted)));
        assert!(!filter.matches(&record("u", "c", ConsentStatus::Declined)));
    }

    #[test]
    fn open_collection_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StorageConfig {
            backend: StorageBackend::Sqlite,
            path: dir.path().join("nested/deeper/consent.db"),
        };
        let collection = open_collection(&cfg).unwrap();
        assert_eq!(collection.count(&Filter::all()).unwrap(), 0);
        assert!(cfg.path.exists());
    }
}
