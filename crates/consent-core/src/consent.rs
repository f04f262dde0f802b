//! ConsentStore: key-based consent operations over a record collection.
//!
//! Every operation sanitizes its keys, then performs a single lookup and at
//! most one mutation against the injected collection. Preconditions that are
//! not met (pair already present on `add`, pair missing on `update` or
//! `remove`) return `Ok(false)`; storage failures are `Err`.

use crate::config::{ConsentConfig, DEFAULT_MAX_KEY_LEN};
use crate::errors::{ConsentError, ConsentResult};
use crate::model::{ConsentRecord, ConsentStatus, NewRecord, RecordId};
use crate::sanitize::sanitize_key;
use crate::storage::{open_collection, Filter, ListQuery, Page, Predicate, SharedCollection};
use chrono::{SubsecRound, Utc};

pub struct ConsentStore {
    collection: SharedCollection,
    max_key_len: usize,
}

impl ConsentStore {
    pub fn new(collection: SharedCollection) -> Self {
        Self {
            collection,
            max_key_len: DEFAULT_MAX_KEY_LEN,
        }
    }

    pub fn with_max_key_len(mut self, max_key_len: usize) -> Self {
        self.max_key_len = max_key_len;
        self
    }

    /// Open the configured collection and apply the configured key limits.
    pub fn from_config(config: &ConsentConfig) -> ConsentResult<Self> {
        let collection = open_collection(&config.storage)?;
        Ok(Self::new(collection).with_max_key_len(config.keys.max_len))
    }

    fn key(&self, field: &'static str, raw: &str) -> ConsentResult<String> {
        let key = sanitize_key(raw);
        if key.is_empty() {
            return Err(ConsentError::EmptyKey { field });
        }
        let len = key.chars().count();
        if len > self.max_key_len {
            return Err(ConsentError::KeyTooLong {
                field,
                len,
                max: self.max_key_len,
            });
        }
        Ok(key)
    }

    fn pair_filter(&self, user_id: &str, consent_id: &str) -> ConsentResult<Filter> {
        let user_id = self.key("user_id", user_id)?;
        let consent_id = self.key("consent_id", consent_id)?;
        Ok(Filter::pair(&user_id, &consent_id))
    }

    /// Id of the record for the pair, if one exists.
    pub fn exists(&self, user_id: &str, consent_id: &str) -> ConsentResult<Option<RecordId>> {
        Ok(self.get(user_id, consent_id)?.map(|r| r.id))
    }

    /// Full record for the pair, if one exists.
    pub fn get(&self, user_id: &str, consent_id: &str) -> ConsentResult<Option<ConsentRecord>> {
        let user_id = self.key("user_id", user_id)?;
        let consent_id = self.key("consent_id", consent_id)?;
        let found = self
            .collection
            .find_one(&Filter::pair(&user_id, &consent_id))?;
        tracing::debug!(
            user_id = %user_id,
            consent_id = %consent_id,
            found = found.is_some(),
            "consent lookup"
        );
        Ok(found)
    }

    /// True iff a record exists for the pair and it is accepted.
    pub fn has_consent(&self, user_id: &str, consent_id: &str) -> ConsentResult<bool> {
        Ok(self
            .get(user_id, consent_id)?
            .is_some_and(|r| r.status.is_accepted()))
    }

    /// Create a record unless the pair already has one.
    pub fn add(
        &self,
        user_id: &str,
        consent_id: &str,
        status: ConsentStatus,
    ) -> ConsentResult<bool> {
        let user_id = self.key("user_id", user_id)?;
        let consent_id = self.key("consent_id", consent_id)?;

        let inserted = self.collection.insert_if_absent(NewRecord {
            user_id: user_id.clone(),
            consent_id: consent_id.clone(),
            status,
            created_at: Utc::now().trunc_subsecs(6),
        })?;

        match inserted {
            Some(id) => {
                tracing::info!(
                    record_id = %id,
                    user_id = %user_id,
                    consent_id = %consent_id,
                    status = %status,
                    "consent added"
                );
                Ok(true)
            }
            None => {
                tracing::debug!(
                    user_id = %user_id,
                    consent_id = %consent_id,
                    "consent already recorded"
                );
                Ok(false)
            }
        }
    }

    /// Overwrite the status of an existing record. `created_at` is kept.
    pub fn update(
        &self,
        user_id: &str,
        consent_id: &str,
        status: ConsentStatus,
    ) -> ConsentResult<bool> {
        let filter = self.pair_filter(user_id, consent_id)?;
        let Some(record) = self.collection.find_one(&filter)? else {
            return Ok(false);
        };

        let updated = self.collection.set_status(record.id, status)?;
        if updated {
            tracing::info!(
                record_id = %record.id,
                user_id = %record.user_id,
                consent_id = %record.consent_id,
                from = %record.status,
                to = %status,
                "consent updated"
            );
        }
        Ok(updated)
    }

    /// Delete the record for the pair.
    pub fn remove(&self, user_id: &str, consent_id: &str) -> ConsentResult<bool> {
        let filter = self.pair_filter(user_id, consent_id)?;
        let Some(record) = self.collection.find_one(&filter)? else {
            return Ok(false);
        };

        let deleted = self.collection.delete(record.id)?;
        if deleted {
            tracing::info!(
                record_id = %record.id,
                user_id = %record.user_id,
                consent_id = %record.consent_id,
                "consent removed"
            );
        }
        Ok(deleted)
    }

    /// Delete every record of `user_id`, whatever the consent id.
    pub fn remove_all_for_user(&self, user_id: &str) -> ConsentResult<usize> {
        let user_id = self.key("user_id", user_id)?;
        let removed = self.collection.delete_matching(&Filter::user(&user_id))?;
        tracing::info!(user_id = %user_id, removed, "consents removed for user");
        Ok(removed)
    }

    fn list_filter(&self, query: &ListQuery) -> ConsentResult<Filter> {
        let mut filter = Filter::all();
        if let Some(u) = &query.user_id {
            filter = filter.and(Predicate::UserId(self.key("user_id", u)?));
        }
        if let Some(c) = &query.consent_id {
            filter = filter.and(Predicate::ConsentId(self.key("consent_id", c)?));
        }
        if let Some(s) = query.status {
            filter = filter.and(Predicate::Status(s));
        }
        Ok(filter)
    }

    /// Listing view, newest first.
    pub fn list(&self, query: &ListQuery) -> ConsentResult<Vec<ConsentRecord>> {
        let filter = self.list_filter(query)?;
        let page = Page {
            limit: query.limit,
            offset: query.offset,
        };
        Ok(self.collection.find(&filter, page)?)
    }

    /// Number of records matching the listing filters (paging ignored).
    pub fn count(&self, query: &ListQuery) -> ConsentResult<usize> {
        let filter = self.list_filter(query)?;
        Ok(self.collection.count(&filter)?)
    }
}
