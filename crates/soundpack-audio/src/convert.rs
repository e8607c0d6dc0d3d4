//! Bringing clips of different formats onto one blob format.
//!
//! Conversion goes through normalized `f32`: channels are remixed, the rate
//! is changed by linear interpolation, and samples are re-quantized for the
//! target. Integer targets are clamped to the target bit depth.

use crate::buffer::{AudioBuffer, Samples};
use hound::{SampleFormat, WavSpec};

fn int_scale(bits: u16) -> f32 {
    (1u64 << (bits.clamp(1, 32) - 1)) as f32
}

/// Interleaved samples normalized to `[-1.0, 1.0]`
pub fn to_f32(buffer: &AudioBuffer) -> Vec<f32> {
    match buffer.samples() {
        Samples::Float(samples) => samples.clone(),
        Samples::Int(samples) => {
            let scale = int_scale(buffer.spec().bits_per_sample);
            samples.iter().map(|&s| s as f32 / scale).collect()
        }
    }
}

/// Build a buffer of format `spec` from normalized samples
pub fn from_f32(spec: WavSpec, samples: Vec<f32>) -> AudioBuffer {
    match spec.sample_format {
        SampleFormat::Float => AudioBuffer::from_float(spec, samples),
        SampleFormat::Int => {
            let scale = int_scale(spec.bits_per_sample);
            let (lo, hi) = (-scale, scale - 1.0);
            let ints = samples
                .into_iter()
                .map(|s| (s * scale).round().clamp(lo, hi) as i32)
                .collect();
            AudioBuffer::from_int(spec, ints)
        }
    }
}

/// Map interleaved frames from `from` channels to `to` channels.
///
/// Fewer output channels average the inputs that fold onto them (stereo to
/// mono is the plain mean); more output channels repeat the inputs.
pub fn remix(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    let (from, to) = (usize::from(from.max(1)), usize::from(to.max(1)));
    if from == to {
        return samples.to_vec();
    }
    let mut out = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        for c in 0..to {
            if from > to {
                let folded: Vec<f32> = frame.iter().skip(c).step_by(to).copied().collect();
                out.push(folded.iter().sum::<f32>() / folded.len() as f32);
            } else {
                out.push(frame[c % from]);
            }
        }
    }
    out
}

/// Change the sample rate of interleaved frames by linear interpolation
pub fn resample(samples: &[f32], channels: u16, from_rate: u32, to_rate: u32) -> Vec<f32> {
    let channels = usize::from(channels.max(1));
    let frames = samples.len() / channels;
    if from_rate == to_rate || frames == 0 || from_rate == 0 {
        return samples.to_vec();
    }

    let ratio = f64::from(from_rate) / f64::from(to_rate);
    let out_frames = (frames as f64 / ratio).round() as usize;
    let mut out = Vec::with_capacity(out_frames * channels);
    for i in 0..out_frames {
        let pos = i as f64 * ratio;
        let i0 = (pos.floor() as usize).min(frames - 1);
        let i1 = (i0 + 1).min(frames - 1);
        let frac = (pos - i0 as f64) as f32;
        for c in 0..channels {
            let a = samples[i0 * channels + c];
            let b = samples[i1 * channels + c];
            out.push(a + (b - a) * frac);
        }
    }
    out
}

/// Convert `buffer` to the `target` format; a no-op when it already matches
pub fn conform(buffer: &AudioBuffer, target: WavSpec) -> AudioBuffer {
    let spec = buffer.spec();
    if spec == target {
        return buffer.clone();
    }
    let samples = to_f32(buffer);
    let samples = remix(&samples, spec.channels, target.channels);
    let samples = resample(&samples, target.channels, spec.sample_rate, target.sample_rate);
    from_f32(target, samples)
}
