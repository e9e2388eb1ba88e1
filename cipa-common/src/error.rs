//! Errors raised by the CIPA domain layer

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// SQLite failure, including constraint violations on terms and candidacies
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Reading the settings file or writing under the root folder
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed `config.toml` or an unusable root folder
    #[error("Configuration error: {0}")]
    Config(String),

    /// Branch, term, collaborator or candidacy missing from the store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unknown milestone or document kind, bad vote count, unparseable enum text
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored data that should never exist, such as a malformed UUID column
    #[error("Internal error: {0}")]
    Internal(String),
}
