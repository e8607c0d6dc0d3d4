//! Reading source clips of any supported container.
//!
//! WAV goes through `hound` so integer PCM stays bit exact. Everything else
//! (and WAV encodings `hound` cannot read) is decoded by `symphonia` into
//! 32-bit float PCM.

use crate::buffer::AudioBuffer;
use crate::error::{Error, Result};
use hound::{SampleFormat, WavSpec};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Extensions accepted as source clips
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "flac", "m4a", "aac", "aiff", "aif"];

/// True if the path has a `.wav` extension (any case)
pub fn is_wav(path: &Path) -> bool {
    has_extension(path, &["wav"])
}

/// True if the path has one of [`AUDIO_EXTENSIONS`] (any case)
pub fn is_audio(path: &Path) -> bool {
    has_extension(path, AUDIO_EXTENSIONS)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Load a clip, whatever its container
pub fn load<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    let path = path.as_ref();
    if is_wav(path) {
        match AudioBuffer::read(path) {
            Ok(buffer) => return Ok(buffer),
            Err(Error::Wav(e)) => {
                log::debug!("{}: hound cannot read it ({}), decoding instead", path.display(), e);
            }
            Err(e) => return Err(e),
        }
    }
    decode_file(path)
}

/// Decode the first audio track of a file into float PCM
pub fn decode_file(path: &Path) -> Result<AudioBuffer> {
    let no_audio = || Error::NoAudio {
        file: path.display().to_string(),
    };

    let stream = MediaSourceStream::new(Box::new(File::open(path)?), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }
    let probed = symphonia::default::get_probe().format(
        &hint,
        stream,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(no_audio)?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());
    let mut decoder = symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }
        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("{}: skipping undecodable packet ({})", path.display(), msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        sample_rate = Some(spec.rate);
        channels = Some(spec.channels.count());
        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    let (Some(sample_rate), Some(channels)) = (sample_rate, channels) else {
        return Err(no_audio());
    };
    let channels = u16::try_from(channels).map_err(|_| no_audio())?;
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    log::debug!("{}: decoded {} sample(s)", path.display(), samples.len());
    Ok(AudioBuffer::from_float(spec, samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Samples;

    fn int_spec(channels: u16) -> WavSpec {
        WavSpec {
            channels,
            sample_rate: 1000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }

    #[test]
    fn test_extensions() {
        assert!(is_wav(Path::new("a/B.WAV")));
        assert!(!is_wav(Path::new("a.ogg")));
        assert!(!is_wav(Path::new("wav")));
        assert!(is_audio(Path::new("a.Flac")));
        assert!(is_audio(Path::new("a.mp3")));
        assert!(!is_audio(Path::new("cover.png")));
    }

    #[test]
    fn test_decode_pcm_to_float() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("half.wav");
        AudioBuffer::from_int(int_spec(2), vec![16384; 200]).write(&path).unwrap();

        let decoded = decode_file(&path).unwrap();
        assert_eq!(decoded.spec().sample_format, SampleFormat::Float);
        assert_eq!(decoded.spec().channels, 2);
        assert_eq!(decoded.spec().sample_rate, 1000);
        assert_eq!(decoded.frames(), 100);
        let Samples::Float(samples) = decoded.samples() else {
            panic!("expected float samples");
        };
        assert!(samples.iter().all(|s| (s - 0.5).abs() < 1e-3));
    }

    #[test]
    fn test_load_keeps_wav_integer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        let buffer = AudioBuffer::from_int(int_spec(1), vec![1, 2, 3]);
        buffer.write(&path).unwrap();
        assert_eq!(load(&path).unwrap(), buffer);
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ogg");
        std::fs::write(&path, b"not audio at all").unwrap();
        assert!(load(&path).is_err());
    }
}
