//! Error types for ArenaKV.

use thiserror::Error;

/// Result type alias using KvError.
pub type Result<T> = std::result::Result<T, KvError>;

/// Errors that can occur in ArenaKV operations.
#[derive(Debug, Error)]
pub enum KvError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Storage errors
    #[error("Slot capacity exhausted")]
    SlotsExhausted,

    #[error("Record heap full, unable to store {needed} bytes")]
    HeapFull { needed: usize },

    #[error("Empty key not allowed")]
    EmptyKey,

    #[error("Arena corrupted: {0}")]
    CorruptArena(String),

    // Request errors
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter { name: String, value: String },
}
