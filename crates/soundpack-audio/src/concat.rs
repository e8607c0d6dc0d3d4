//! Joining source clips into one audio blob.

use crate::buffer::{describe_spec, AudioBuffer};
use crate::convert::conform;
use crate::decode::load;
use crate::error::{Error, Result};
use std::path::Path;

/// Where one source file landed inside the blob
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    /// Source file name (no directory)
    pub file: String,
    pub start_ms: f64,
    pub end_ms: f64,
}

/// Concatenate audio files in the given order.
///
/// The first clip fixes the blob format; later clips with another channel
/// count, rate or sample format are converted to it. Clip timings are
/// computed from sample counts, so they are exact for the blob that is
/// returned.
pub fn concat_files<P: AsRef<Path>>(paths: &[P]) -> Result<(AudioBuffer, Vec<Clip>)> {
    let mut blob: Option<AudioBuffer> = None;
    let mut clips = Vec::with_capacity(paths.len());

    for path in paths {
        let path = path.as_ref();
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mut clip = load(path).map_err(|e| Error::Clip {
            file: file.clone(),
            source: Box::new(e),
        })?;

        let blob = blob.get_or_insert_with(|| AudioBuffer::empty(clip.spec()));
        if clip.spec() != blob.spec() {
            log::info!(
                "{}: converting {} to {}",
                file,
                describe_spec(&clip.spec()),
                describe_spec(&blob.spec())
            );
            clip = conform(&clip, blob.spec());
        }
        let start_frames = blob.frames();
        blob.append(&clip, &file)?;
        let start_ms = blob.frames_to_ms(start_frames);
        let end_ms = blob.frames_to_ms(blob.frames());
        log::debug!("{}: [{:.3}, {:.3}] ms", file, start_ms, end_ms);

        clips.push(Clip { file, start_ms, end_ms });
    }

    let blob = blob.ok_or(Error::Empty)?;
    Ok((blob, clips))
}
