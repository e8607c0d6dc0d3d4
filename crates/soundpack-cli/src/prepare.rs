//! `prepare`: concatenate source clips into `sound.wav` and write the
//! sourcemap.
//!
//! Clips may be any format the audio crate decodes; the blob takes the
//! format of the first clip in name order.

use crate::paths::list_audio_files;
use anyhow::{Context, Result};
use soundpack_audio::concat_files;
use soundpack_core::sourcemap::{DEFAULT_AUDIO_FILE, SOURCEMAP_FILE};
use soundpack_core::{Sourcemap, TimeRange};
use std::fs;
use std::path::{Path, PathBuf};

/// Build the audio blob and sourcemap for `source_dir` inside `target_dir`.
///
/// Returns the sourcemap path.
pub fn run_prepare(source_dir: &Path, target_dir: &Path) -> Result<PathBuf> {
    if !source_dir.is_dir() {
        anyhow::bail!("Source directory not found: {}", source_dir.display());
    }

    let clips = list_audio_files(source_dir)?;
    if clips.is_empty() {
        anyhow::bail!("No audio files found in {}", source_dir.display());
    }

    fs::create_dir_all(target_dir)
        .with_context(|| format!("Failed to create pack directory: {}", target_dir.display()))?;

    log::info!("Concatenating {} clip(s) from {}", clips.len(), source_dir.display());
    let (blob, clips) = concat_files(clips.as_slice()).context("Failed to concatenate audio")?;
    let audio_path = target_dir.join(DEFAULT_AUDIO_FILE);
    blob.write(&audio_path)
        .with_context(|| format!("Failed to write {}", audio_path.display()))?;

    let sourcemap = Sourcemap::from_clips(
        DEFAULT_AUDIO_FILE,
        Some(source_dir.display().to_string()),
        clips
            .into_iter()
            .map(|clip| (clip.file, TimeRange::new(clip.start_ms, clip.end_ms))),
    );
    let sourcemap_path = target_dir.join(SOURCEMAP_FILE);
    sourcemap
        .save(&sourcemap_path)
        .with_context(|| format!("Failed to write {}", sourcemap_path.display()))?;

    log::info!(
        "Wrote {} ({:.0} ms) and {}",
        audio_path.display(),
        blob.duration_ms(),
        sourcemap_path.display()
    );
    Ok(sourcemap_path)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use soundpack_audio::{AudioBuffer, SampleFormat, WavSpec};

    /// Write a mono 1 kHz WAV with `frames` samples (1 ms per frame)
    pub(crate) fn write_wav(path: &Path, frames: usize, value: i32) {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 1000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        AudioBuffer::from_int(spec, vec![value; frames]).write(path).unwrap();
    }

    #[test]
    fn test_prepare_writes_blob_and_sourcemap() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        fs::create_dir(&source).unwrap();
        write_wav(&source.join("b.wav"), 50, 2);
        write_wav(&source.join("a.wav"), 100, 1);
        fs::write(source.join("notes.txt"), b"not audio").unwrap();

        let target = dir.path().join("out");
        let sourcemap_path = run_prepare(&source, &target).unwrap();

        let map = Sourcemap::load(&sourcemap_path).unwrap();
        assert_eq!(map.audio_file, "sound.wav");
        assert_eq!(map.filenames(), vec!["a.wav", "b.wav"]);
        assert_eq!(map.timings_of("b.wav"), vec![TimeRange::new(100.0, 150.0)]);

        let blob = AudioBuffer::read(target.join("sound.wav")).unwrap();
        assert_eq!(blob.frames(), 150);
    }

    #[test]
    fn test_prepare_mixes_formats() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        fs::create_dir(&source).unwrap();
        write_wav(&source.join("a.wav"), 100, 1);
        let stereo_float = WavSpec {
            channels: 2,
            sample_rate: 2000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        AudioBuffer::from_float(stereo_float, vec![0.25; 800])
            .write(source.join("b.wav"))
            .unwrap();
        // WAV data under a .flac name goes through the decoder path
        AudioBuffer::from_int(
            WavSpec {
                channels: 1,
                sample_rate: 500,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
            vec![7; 25],
        )
        .write(source.join("c.flac"))
        .unwrap();

        let target = dir.path().join("out");
        let map = Sourcemap::load(run_prepare(&source, &target).unwrap()).unwrap();
        assert_eq!(map.filenames(), vec!["a.wav", "b.wav", "c.flac"]);
        assert_eq!(map.timings_of("b.wav"), vec![TimeRange::new(100.0, 300.0)]);
        assert_eq!(map.timings_of("c.flac"), vec![TimeRange::new(300.0, 350.0)]);

        let blob = AudioBuffer::read(target.join("sound.wav")).unwrap();
        assert_eq!(blob.spec().channels, 1);
        assert_eq!(blob.spec().sample_rate, 1000);
        assert_eq!(blob.frames(), 350);
    }

    #[test]
    fn test_prepare_without_audio_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"x").unwrap();
        assert!(run_prepare(dir.path(), &dir.path().join("out")).is_err());
    }

    #[test]
    fn test_prepare_names_undecodable_clip() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("a.wav"), 10, 1);
        fs::write(dir.path().join("b.ogg"), b"not audio at all").unwrap();
        let err = run_prepare(dir.path(), &dir.path().join("out")).unwrap_err();
        assert!(format!("{:#}", err).contains("b.ogg"));
    }
}
