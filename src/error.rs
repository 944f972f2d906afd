//! Error taxonomy shared by the store, the notifier, and the calendar export.
//! The UI and the binary wrap these in `anyhow` once they only need a message.

use thiserror::Error;

use crate::models::{BirthdayField, BirthdayId};

/// Errors raised by the birthday domain and its collaborators.
#[derive(Error, Debug)]
pub enum Error {
    /// Form input rejected before anything touched the database.
    #[error("{message}")]
    Validation {
        field: BirthdayField,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Birthday {0} not found")]
    NotFound(BirthdayId),

    #[error("Notifications are not permitted")]
    PermissionDenied,

    /// A stored row carries a date of birth we cannot order.
    #[error("Birthday {id} has no valid date of birth")]
    InvalidBirthDate { id: BirthdayId },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn validation(field: BirthdayField, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Result alias for birthday operations.
pub type Result<T> = std::result::Result<T, Error>;
