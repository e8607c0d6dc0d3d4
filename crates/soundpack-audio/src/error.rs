//! Error types for soundpack-audio

use thiserror::Error;

/// Result type alias for audio operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("No decodable audio track in '{file}'")]
    NoAudio { file: String },

    #[error("Failed to read clip '{file}': {source}")]
    Clip {
        file: String,
        #[source]
        source: Box<Error>,
    },

    /// Buffers being joined must share channel count, rate and sample format
    #[error("Audio format mismatch in '{file}': expected {expected}, found {found}")]
    FormatMismatch {
        file: String,
        expected: String,
        found: String,
    },

    #[error("No audio clips to concatenate")]
    Empty,

    #[error("Range [{start_ms}, {end_ms}] ms is outside the audio ({duration_ms} ms)")]
    OutOfRange {
        start_ms: f64,
        end_ms: f64,
        duration_ms: f64,
    },
}
