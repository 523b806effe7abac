//! Error types for lostfound-core

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::item::FinderType;

/// Result type alias for lost & found operations
pub type Result<T> = std::result::Result<T, LostFoundError>;

/// Main error type for lost & found operations
#[derive(Error, Debug)]
pub enum LostFoundError {
    /// Missing or invalid input, reported per field
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Illegal lifecycle move
    #[error("Invalid transition: {0}")]
    InvalidTransition(#[from] InvalidTransitionError),

    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    /// Receipt number collision that survived the allocator retries
    #[error("Duplicate identifier: {0}")]
    DuplicateIdentifier(#[from] DuplicateIdentifierError),

    /// Receipt numbering errors other than collisions
    #[error("Allocator error: {0}")]
    Allocator(#[from] AllocatorError),

    /// Persistence-related errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// A single offending field and what is wrong with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Per-field validation failures
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shortcut for a single-field failure
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.push(field, message);
        err
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turn the collected failures into a `Result`
    pub fn into_result(self) -> std::result::Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Lifecycle transition attempted from a state that does not allow it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{transition} is not allowed from {from}")]
pub struct InvalidTransitionError {
    /// Name of the attempted transition
    pub transition: String,
    /// The state the record was in
    pub from: String,
}

/// Missing records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("found item {0}")]
    FoundItem(i64),

    #[error("loss report {0}")]
    LossReport(i64),
}

/// Receipt number already taken in its scope
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{main_id} already issued for {finder_type} in {year}")]
pub struct DuplicateIdentifierError {
    pub finder_type: FinderType,
    pub year: i32,
    pub main_id: String,
}

/// Receipt numbering errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocatorError {
    /// The five-digit sequence space for the scope is used up
    #[error("sequence exhausted for {finder_type} in {year}")]
    SequenceExhausted { finder_type: FinderType, year: i32 },

    /// Year outside what the two-digit display can represent
    #[error("invalid year {0}")]
    InvalidYear(i32),
}

/// Persistence-specific errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored data that no longer satisfies a domain invariant
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    SchemaVersionMismatch { expected: u32, actual: u32 },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    Parse(String),

    #[error("Invalid value: {0}")]
    Invalid(String),
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        PersistenceError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for LostFoundError {
    fn from(err: rusqlite::Error) -> Self {
        LostFoundError::Persistence(PersistenceError::Database(err.to_string()))
    }
}

impl From<serde_json::Error> for LostFoundError {
    fn from(err: serde_json::Error) -> Self {
        LostFoundError::Persistence(PersistenceError::Serialization(err.to_string()))
    }
}
