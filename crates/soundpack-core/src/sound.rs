//! Source clips and the virtual sounds built from them.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A `[start, end]` range in milliseconds inside the single audio blob
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length of the range in milliseconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// `[start, length]` rounded to whole milliseconds, as v1 expects
    pub fn to_clip(&self) -> [i64; 2] {
        [self.start.round() as i64, (self.end - self.start).round() as i64]
    }
}

impl From<[f64; 2]> for TimeRange {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<TimeRange> for [f64; 2] {
    fn from(range: TimeRange) -> Self {
        [range.start, range.end]
    }
}

/// A candidate audio clip discovered in the source directory
#[derive(Debug, Clone, PartialEq)]
pub struct SoundFile {
    /// Filename relative to the source directory (e.g. `enter.wav`)
    pub file: String,
    /// Virtual name, normally the file stem (e.g. `enter`)
    pub name: String,
    /// Position inside the single audio blob, if known
    pub timing: Option<TimeRange>,
}

impl SoundFile {
    /// A clip whose virtual name is its file stem
    pub fn new(file: impl Into<String>) -> Self {
        let file = file.into();
        let name = file_stem(&file).to_string();
        Self {
            file,
            name,
            timing: None,
        }
    }

    /// Attach a timing range
    pub fn with_timing(mut self, timing: TimeRange) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Override the virtual name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The entry this file contributes to a virtual sound
    pub fn entry(&self) -> SoundEntry {
        SoundEntry {
            file: self.file.clone(),
            timing: self.timing,
        }
    }
}

/// One backing clip of a virtual sound
#[derive(Debug, Clone, PartialEq)]
pub struct SoundEntry {
    pub file: String,
    pub timing: Option<TimeRange>,
}

/// A named logical sound.
///
/// More than one entry makes it a random-play group, which only v2 can
/// express.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualSound {
    pub name: String,
    pub entries: Vec<SoundEntry>,
}

impl VirtualSound {
    /// A sound backed by a single file, named after the file
    pub fn single(file: &SoundFile) -> Self {
        Self {
            name: file.file.clone(),
            entries: vec![file.entry()],
        }
    }

    /// True for multi-file random groups
    pub fn is_random_group(&self) -> bool {
        self.entries.len() > 1
    }

    /// The timing range of a single-entry sound
    pub fn single_timing(&self) -> Option<TimeRange> {
        match self.entries.as_slice() {
            [entry] => entry.timing,
            _ => None,
        }
    }
}

/// File stem without extension (`1.wav` -> `1`)
pub fn file_stem(file: &str) -> &str {
    Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file)
}

/// Insert `suffix` before the extension (`1.wav` + `-up` -> `1-up.wav`)
pub fn with_suffix(file: &str, suffix: &str) -> String {
    match file.rfind('.') {
        Some(dot) if dot > 0 => format!("{}{}{}", &file[..dot], suffix, &file[dot..]),
        _ => format!("{}{}", file, suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_suffix() {
        assert_eq!(with_suffix("1.wav", "-up"), "1-up.wav");
        assert_eq!(with_suffix("1-up.wav", "-up"), "1-up-up.wav");
        assert_eq!(with_suffix("noext", "-down"), "noext-down");
        assert_eq!(with_suffix("{0-3}.wav", "-up"), "{0-3}-up.wav");
    }

    #[test]
    fn test_sound_file_name_is_stem() {
        let file = SoundFile::new("Enter.wav");
        assert_eq!(file.name, "Enter");
        assert_eq!(file_stem("a.b.wav"), "a.b");
    }

    #[test]
    fn test_clip_rounding() {
        let range = TimeRange::new(100.4, 200.4);
        assert_eq!(range.to_clip(), [100, 100]);
    }

    #[test]
    fn test_time_range_serializes_as_pair() {
        let json = serde_json::to_string(&TimeRange::new(0.0, 12.5)).unwrap();
        assert_eq!(json, "[0.0,12.5]");
        let back: TimeRange = serde_json::from_str("[3,4]").unwrap();
        assert_eq!(back, TimeRange::new(3.0, 4.0));
    }
}
