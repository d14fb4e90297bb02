//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when a plugin, suggestion or user does not exist.
//! - [`InvalidScore`] thrown when a rating is outside `0.5..=5.0`.
//! - [`Forbidden`] thrown when the acting user may not touch a resource.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InvalidScore`]: EngineError::InvalidScore
//!  [`Forbidden`]: EngineError::Forbidden
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid score: {0}")]
    InvalidScore(String),
    #[error("Invalid plugin type: {0}")]
    InvalidKind(String),
    #[error("Invalid field: {0}")]
    InvalidField(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidScore(a), Self::InvalidScore(b)) => a == b,
            (Self::InvalidKind(a), Self::InvalidKind(b)) => a == b,
            (Self::InvalidField(a), Self::InvalidField(b)) => a == b,
            (Self::InvalidState(a), Self::InvalidState(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value.to_string())
    }
}
