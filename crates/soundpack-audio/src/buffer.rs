//! In-memory interleaved PCM.

use crate::error::{Error, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{Cursor, Seek, Write};
use std::path::Path;

/// Interleaved samples, kept in the source sample type
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Int(Vec<i32>),
    Float(Vec<f32>),
}

impl Samples {
    fn len(&self) -> usize {
        match self {
            Samples::Int(s) => s.len(),
            Samples::Float(s) => s.len(),
        }
    }

    fn slice(&self, start: usize, end: usize) -> Samples {
        match self {
            Samples::Int(s) => Samples::Int(s[start..end].to_vec()),
            Samples::Float(s) => Samples::Float(s[start..end].to_vec()),
        }
    }
}

/// A decoded WAV file
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    spec: WavSpec,
    samples: Samples,
}

/// Short human-readable description of a WAV format
pub fn describe_spec(spec: &WavSpec) -> String {
    let format = match spec.sample_format {
        SampleFormat::Int => "int",
        SampleFormat::Float => "float",
    };
    format!(
        "{} ch, {} Hz, {}-bit {}",
        spec.channels, spec.sample_rate, spec.bits_per_sample, format
    )
}

impl AudioBuffer {
    /// An empty buffer with the given format
    pub fn empty(spec: WavSpec) -> Self {
        let samples = match spec.sample_format {
            SampleFormat::Int => Samples::Int(Vec::new()),
            SampleFormat::Float => Samples::Float(Vec::new()),
        };
        Self { spec, samples }
    }

    /// Build a buffer from integer samples
    pub fn from_int(spec: WavSpec, samples: Vec<i32>) -> Self {
        Self {
            spec,
            samples: Samples::Int(samples),
        }
    }

    /// Build a buffer from float samples
    pub fn from_float(spec: WavSpec, samples: Vec<f32>) -> Self {
        Self {
            spec,
            samples: Samples::Float(samples),
        }
    }

    /// Decode a WAV file
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();
        let samples = match spec.sample_format {
            SampleFormat::Int => Samples::Int(
                reader
                    .samples::<i32>()
                    .collect::<std::result::Result<Vec<i32>, hound::Error>>()?,
            ),
            SampleFormat::Float => Samples::Float(
                reader
                    .samples::<f32>()
                    .collect::<std::result::Result<Vec<f32>, hound::Error>>()?,
            ),
        };
        Ok(Self { spec, samples })
    }

    /// Encode as a WAV file
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = WavWriter::create(path.as_ref(), self.spec)?;
        self.write_samples(&mut writer)?;
        writer.finalize()?;
        Ok(())
    }

    /// Encode as WAV bytes
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut cursor, self.spec)?;
        self.write_samples(&mut writer)?;
        writer.finalize()?;
        Ok(cursor.into_inner())
    }

    fn write_samples<W: Write + Seek>(&self, writer: &mut WavWriter<W>) -> Result<()> {
        match &self.samples {
            Samples::Int(samples) => {
                for &s in samples {
                    writer.write_sample(s)?;
                }
            }
            Samples::Float(samples) => {
                for &s in samples {
                    writer.write_sample(s)?;
                }
            }
        }
        Ok(())
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Number of sample frames (one sample per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.spec.channels.max(1))
    }

    /// Duration in milliseconds
    pub fn duration_ms(&self) -> f64 {
        self.frames_to_ms(self.frames())
    }

    pub fn frames_to_ms(&self, frames: usize) -> f64 {
        frames as f64 * 1000.0 / f64::from(self.spec.sample_rate)
    }

    pub fn ms_to_frames(&self, ms: f64) -> usize {
        (ms * f64::from(self.spec.sample_rate) / 1000.0).round().max(0.0) as usize
    }

    /// Append another buffer of the same format.
    ///
    /// `source` names the other buffer in the error message.
    pub fn append(&mut self, other: &AudioBuffer, source: &str) -> Result<()> {
        let mismatch = || Error::FormatMismatch {
            file: source.to_string(),
            expected: describe_spec(&self.spec),
            found: describe_spec(&other.spec),
        };
        if self.spec != other.spec {
            return Err(mismatch());
        }
        match (&mut self.samples, &other.samples) {
            (Samples::Int(dst), Samples::Int(src)) => dst.extend_from_slice(src),
            (Samples::Float(dst), Samples::Float(src)) => dst.extend_from_slice(src),
            _ => return Err(mismatch()),
        }
        Ok(())
    }

    /// Copy out `[start_ms, end_ms]`.
    ///
    /// Bounds are rounded to the nearest frame; an end past the last frame
    /// is clamped when it is within one frame of the end.
    pub fn slice_ms(&self, start_ms: f64, end_ms: f64) -> Result<AudioBuffer> {
        let frames = self.frames();
        let out_of_range = || Error::OutOfRange {
            start_ms,
            end_ms,
            duration_ms: self.duration_ms(),
        };
        if start_ms < 0.0 || end_ms < start_ms {
            return Err(out_of_range());
        }
        let start = self.ms_to_frames(start_ms);
        let end = self.ms_to_frames(end_ms);
        if start > frames || end > frames + 1 {
            return Err(out_of_range());
        }
        let end = end.min(frames);

        let channels = usize::from(self.spec.channels.max(1));
        Ok(AudioBuffer {
            spec: self.spec,
            samples: self.samples.slice(start * channels, end * channels),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(channels: u16, sample_rate: u32) -> WavSpec {
        WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }

    #[test]
    fn test_duration_and_frames() {
        let buffer = AudioBuffer::from_int(spec(2, 1000), vec![0; 500]);
        assert_eq!(buffer.frames(), 250);
        assert_eq!(buffer.duration_ms(), 250.0);
    }

    #[test]
    fn test_slice_ms() {
        let samples: Vec<i32> = (0..200).collect();
        let buffer = AudioBuffer::from_int(spec(2, 1000), samples);
        let slice = buffer.slice_ms(10.0, 20.0).unwrap();
        assert_eq!(slice.frames(), 10);
        assert_eq!(slice.samples(), &Samples::Int((20..40).collect()));

        assert!(buffer.slice_ms(50.0, 200.0).is_err());
        assert!(buffer.slice_ms(20.0, 10.0).is_err());
        assert_eq!(buffer.slice_ms(90.0, 100.0).unwrap().frames(), 10);
    }

    #[test]
    fn test_append_rejects_format_mismatch() {
        let mut a = AudioBuffer::from_int(spec(1, 1000), vec![1, 2]);
        let b = AudioBuffer::from_int(spec(2, 1000), vec![3, 4]);
        let err = a.append(&b, "b.wav").unwrap_err();
        assert!(matches!(err, Error::FormatMismatch { ref file, .. } if file == "b.wav"));

        let c = AudioBuffer::from_int(spec(1, 1000), vec![3]);
        a.append(&c, "c.wav").unwrap();
        assert_eq!(a.frames(), 3);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.wav");
        let buffer = AudioBuffer::from_int(spec(1, 8000), vec![0, 100, -100, 32767]);
        buffer.write(&path).unwrap();
        assert_eq!(AudioBuffer::read(&path).unwrap(), buffer);

        let bytes = buffer.to_wav_bytes().unwrap();
        assert_eq!(bytes, std::fs::read(&path).unwrap());
    }
}
