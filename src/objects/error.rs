//! Errors surfaced by class operations

use thiserror::Error;

/// Errors that can occur while extending, constructing or running hooks
#[derive(Debug, Error)]
pub enum ClassError {
    #[error("member '{0}' is not callable")]
    NotCallable(String),

    #[error("member '{0}' is not a table")]
    NotATable(String),

    #[error("class has no options to merge into")]
    NoOptions,

    #[error("expected a JSON object, got {0}")]
    InvalidJson(String),

    #[error("{0}")]
    Custom(String),
}

impl ClassError {
    /// Raise a custom error from inside a method or hook
    pub fn custom(msg: impl Into<String>) -> Self {
        ClassError::Custom(msg.into())
    }
}
