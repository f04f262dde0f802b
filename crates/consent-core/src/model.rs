//! Consent record data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opaque record identifier assigned by the collection on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accept/decline flag of a consent record. Persisted as 1/0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentStatus {
    Declined,
    Accepted,
}

/// A status value outside the two-state domain.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid consent status '{value}' (expected accepted, declined, 1 or 0)")]
pub struct InvalidStatus {
    pub value: String,
}

impl ConsentStatus {
    pub fn as_flag(self) -> i64 {
        match self {
            ConsentStatus::Accepted => 1,
            ConsentStatus::Declined => 0,
        }
    }

    /// Legacy coercion: exactly 1 is accepted, any other flag is declined.
    ///
    /// Only used when rewriting rows from schemas that did not constrain the
    /// column. New input goes through [`TryFrom<i64>`] or [`FromStr`].
    pub fn from_flag_lossy(flag: i64) -> Self {
        if flag == 1 {
            ConsentStatus::Accepted
        } else {
            ConsentStatus::Declined
        }
    }

    pub fn is_accepted(self) -> bool {
        self == ConsentStatus::Accepted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConsentStatus::Accepted => "accepted",
            ConsentStatus::Declined => "declined",
        }
    }
}

impl TryFrom<i64> for ConsentStatus {
    type Error = InvalidStatus;

    fn try_from(flag: i64) -> Result<Self, Self::Error> {
        match flag {
            1 => Ok(ConsentStatus::Accepted),
            0 => Ok(ConsentStatus::Declined),
            other => Err(InvalidStatus {
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for ConsentStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "accepted" | "accept" => Ok(ConsentStatus::Accepted),
            "0" | "declined" | "decline" => Ok(ConsentStatus::Declined),
            _ => Err(InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored consent decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub id: RecordId,
    pub user_id: String,
    pub consent_id: String,
    pub status: ConsentStatus,
    /// Set on insert, never rewritten.
    pub created_at: DateTime<Utc>,
}

/// Fields for a record that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub user_id: String,
    pub consent_id: String,
    pub status: ConsentStatus,
    pub created_at: DateTime<Utc>,
}

impl NewRecord {
    pub(crate) fn into_record(self, id: RecordId) -> ConsentRecord {
        ConsentRecord {
            id,
            user_id: self.user_id,
            consent_id: self.consent_id,
            status: self.status,
            created_at: self.created_at,
        }
    }
}
