//! Error types for the remindav crates.

use thiserror::Error;

/// Errors that can occur in remindav operations.
#[derive(Error, Debug)]
pub enum RemindError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not logged in to the calendar server")]
    NotLoggedIn,

    #[error("Calendar gateway error: {0}")]
    Gateway(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for remindav operations.
pub type RemindResult<T> = Result<T, RemindError>;
