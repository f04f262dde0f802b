use crate::model::InvalidStatus;
use crate::storage::StoreError;
use thiserror::Error;

pub type ConsentResult<T> = Result<T, ConsentError>;

/// Errors surfaced by [`crate::ConsentStore`].
///
/// Unmet preconditions (pair already present on add, pair missing on
/// update/remove) are not errors; those operations return `Ok(false)`.
#[derive(Debug, Error)]
pub enum ConsentError {
    #[error("{field} is empty after sanitization")]
    EmptyKey { field: &'static str },

    #[error("{field} is {len} characters long (max {max})")]
    KeyTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl ConsentError {
    /// True for errors caused by caller input rather than storage.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_distinguished_from_storage() {
        assert!(ConsentError::EmptyKey { field: "user_id" }.is_invalid_input());
        assert!(ConsentError::from(InvalidStatus {
            value: "3".to_string()
        })
        .is_invalid_input());
        assert!(!ConsentError::from(StoreError::Poisoned).is_invalid_input());
    }

    #[test]
    fn messages_name_the_field() {
        let err = ConsentError::KeyTooLong {
            field: "consent_id",
            len: 300,
            max: 191,
        };
        assert_eq!(err.to_string(), "consent_id is 300 characters long (max 191)");
    }
}
