//! Consent log core.
//!
//! Records per-user consent decisions ("user X accepted/declined form Y")
//! keyed by `(user_id, consent_id)`. The [`ConsentStore`] is a thin service
//! over an injected [`RecordCollection`]; two collections ship with the crate:
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌─────────────────────┐
//! │ Admin / app  │────▶│   ConsentStore   │────▶│  RecordCollection   │
//! │   callers    │     │ sanitize + rules │     │ SqliteCollection    │
//! └──────────────┘     └──────────────────┘     │ MemoryCollection    │
//!                                               └─────────────────────┘
//! ```

pub mod config;
pub mod consent;
pub mod errors;
pub mod model;
pub mod sanitize;
pub mod storage;

pub use config::ConsentConfig;
pub use consent::ConsentStore;
pub use errors::{ConsentError, ConsentResult};
pub use model::{ConsentRecord, ConsentStatus, InvalidStatus, NewRecord, RecordId};
pub use storage::{
    ListQuery, MemoryCollection, RecordCollection, SqliteCollection, StoreError, StoreResult,
};
