use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid argument for {what}: {reason}")]
    InvalidArgument { what: &'static str, reason: String },

    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),

    #[error("String encoding error: {0}")]
    StringEncoding(#[from] std::fmt::Error),

    #[error("Token stream exhausted: all {total} fields already consumed")]
    TokensExhausted { total: usize },

    #[error("Field '{field}' is not a valid integer: {value:?}")]
    InvalidInteger { field: &'static str, value: String },

    #[error("Record width mismatch: {fields} fields is not a multiple of {width}")]
    RecordWidth { width: usize, fields: usize },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl CacheError {
    /// True for failures that must stop a multi-record decode loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CacheError::OutOfMemory(_))
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
