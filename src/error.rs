//! Error types for the Libris catalog engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error kinds carried on failure envelopes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 3,
    MemberNotFound = 4,
    BookNotFound = 5,
    AlreadyIssued = 7,
    DuplicateKey = 8,
    NotIssued = 12,
    BookOnLoan = 13,
    InvalidInput = 18,
    MemberHasLoans = 21,
    UnknownMethod = 22,
    ChannelNotReady = 23,
    Timeout = 24,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Book {0} not found")]
    BookNotFound(i64),

    #[error("Member {0} not found")]
    MemberNotFound(i64),

    #[error("Book {book_id} is already issued to member {member_id}")]
    AlreadyIssued { book_id: i64, member_id: i64 },

    #[error("Book {0} is not issued")]
    NotIssued(i64),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Book {book_id} is on loan to member {member_id}")]
    BookOnLoan { book_id: i64, member_id: i64 },

    #[error("Member {member_id} still holds {count} book(s)")]
    MemberHasLoans { member_id: i64, count: usize },

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("Backend not ready")]
    ChannelNotReady,

    #[error("Backend channel closed before a response arrived")]
    ChannelClosed,

    #[error("Backend call timeout: {method}")]
    Timeout { method: String },

    /// Failure reported by the remote engine, as seen by the client adapter
    #[error("{message}")]
    Remote { code: Option<ErrorCode>, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable kind of this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::BookNotFound(_) => ErrorCode::BookNotFound,
            AppError::MemberNotFound(_) => ErrorCode::MemberNotFound,
            AppError::AlreadyIssued { .. } => ErrorCode::AlreadyIssued,
            AppError::NotIssued(_) => ErrorCode::NotIssued,
            AppError::DuplicateKey(_) => ErrorCode::DuplicateKey,
            AppError::BookOnLoan { .. } => ErrorCode::BookOnLoan,
            AppError::MemberHasLoans { .. } => ErrorCode::MemberHasLoans,
            AppError::UnknownMethod(_) => ErrorCode::UnknownMethod,
            AppError::ChannelNotReady | AppError::ChannelClosed => ErrorCode::ChannelNotReady,
            AppError::Timeout { .. } => ErrorCode::Timeout,
            AppError::Remote { code, .. } => code.unwrap_or(ErrorCode::Failure),
            AppError::Database(_) | AppError::Migration(_) => ErrorCode::DbFailure,
            AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::Config(_)
            | AppError::Internal(_) => ErrorCode::Failure,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(errors.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
