use thiserror::Error;

use crate::models::application::ApplicationStatus;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error("birth date {birth_date} is after reference date {on}")]
    InvalidBirthDate {
        birth_date: jiff::civil::Date,
        on: jiff::civil::Date,
    },
}
