//! Soundpack Audio - audio blob assembly for keyboard soundpacks.
//!
//! - [`load`] reads a source clip: WAV through `hound`, mp3/ogg/flac/m4a/aiff
//!   through `symphonia`
//! - [`concat_files`] joins source clips into one WAV blob, converting each to
//!   the first clip's format, and reports where each clip landed in
//!   milliseconds
//! - [`AudioBuffer::slice_ms`] cuts a timing range back out, for formats that
//!   need one file per sound

pub mod buffer;
pub mod concat;
pub mod convert;
pub mod decode;
pub mod error;

pub use buffer::{describe_spec, AudioBuffer, Samples};
pub use concat::{concat_files, Clip};
pub use convert::conform;
pub use decode::{is_audio, is_wav, load, AUDIO_EXTENSIONS};
pub use error::{Error, Result};
pub use hound::{SampleFormat, WavSpec};

use std::path::Path;

/// Cut `[start_ms, end_ms]` out of `blob` and write it to `out`
pub fn extract_clip(blob: &AudioBuffer, start_ms: f64, end_ms: f64, out: &Path) -> Result<()> {
    blob.slice_ms(start_ms, end_ms)?.write(out)
}
