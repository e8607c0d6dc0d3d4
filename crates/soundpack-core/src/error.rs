//! Error types for soundpack-core

use thiserror::Error;

/// Result type alias for soundpack-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving rules or compiling schemas
#[derive(Debug, Error)]
pub enum Error {
    /// Rule document is malformed
    #[error("Rule syntax error: {0}")]
    RuleSyntax(String),

    /// Sourcemap document is malformed or empty
    #[error("Sourcemap error: {0}")]
    Sourcemap(String),

    /// Unknown schema selector value
    #[error("Invalid schema value '{0}'. Use v1|v2|dx or all.")]
    UnknownSchema(String),

    /// A multi-file group was assigned in a schema that cannot express it
    #[error("{version} cannot play random groups: key '{key}' uses '{sound}' ({files} files)")]
    RandomGroup {
        version: &'static str,
        key: String,
        sound: String,
        files: usize,
    },

    /// A key-up slot reached the v1 compiler
    #[error("v1 has no key-up channel: key '{key}' has key-up sound '{sound}'")]
    KeyUpNotSupported { key: String, sound: String },

    /// DX needs both down and up timing for every assigned key
    #[error("dx requires key-up timing for key '{key}': key-down sound '{sound}' was never split into halves")]
    MissingKeyUp { key: String, sound: String },

    /// A sound referenced by a timing-based schema carries no timing range
    #[error("Sound '{sound}' for key '{key}' has no timing range")]
    MissingTiming { key: String, sound: String },

    /// An assignment references a sound that was never registered
    #[error("Key '{key}' references unknown sound '{sound}'")]
    UnknownSound { key: String, sound: String },

    /// Timing range with end before start
    #[error("Invalid timing range for '{sound}': start={start} end={end}")]
    InvalidTiming { sound: String, start: f64, end: f64 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
