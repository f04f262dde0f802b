//! In-memory record collection.

use super::{Filter, Page, RecordCollection, StoreError, StoreResult};
use crate::model::{ConsentRecord, ConsentStatus, NewRecord, RecordId};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    records: BTreeMap<RecordId, ConsentRecord>,
}

/// Process-local collection. The pair check and the insert happen under one
/// lock, so it upholds the same uniqueness guarantee as the SQLite index.
#[derive(Debug, Default)]
pub struct MemoryCollection {
    state: Mutex<MemoryState>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl RecordCollection for MemoryCollection {
    fn insert_if_absent(&self, record: NewRecord) -> StoreResult<Option<RecordId>> {
        let mut state = self.lock()?;
        let taken = state
            .records
            .values()
            .any(|r| r.user_id == record.user_id && r.consent_id == record.consent_id);
        if taken {
            return Ok(None);
        }

        state.next_id += 1;
        let id = RecordId::new(state.next_id);
        state.records.insert(id, record.into_record(id));
        Ok(Some(id))
    }

    fn find(&self, filter: &Filter, page: Page) -> StoreResult<Vec<ConsentRecord>> {
        let state = self.lock()?;
        let mut matched: Vec<ConsentRecord> = state
            .records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let windowed = matched.into_iter().skip(page.offset);
        Ok(match page.limit {
            Some(limit) => windowed.take(limit).collect(),
            None => windowed.collect(),
        })
    }

    fn count(&self, filter: &Filter) -> StoreResult<usize> {
        let state = self.lock()?;
        Ok(state.records.values().filter(|r| filter.matches(r)).count())
    }

    fn set_status(&self, id: RecordId, status: ConsentStatus) -> StoreResult<bool> {
        let mut state = self.lock()?;
        match state.records.get_mut(&id) {
            Some(record) => {
                record.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, id: RecordId) -> StoreResult<bool> {
        let mut state = self.lock()?;
        Ok(state.records.remove(&id).is_some())
    }

    fn delete_matching(&self, filter: &Filter) -> StoreResult<usize> {
        let mut state = self.lock()?;
        let before = state.records.len();
        state.records.retain(|_, r| !filter.matches(r));
        Ok(before - state.records.len())
    }
}
