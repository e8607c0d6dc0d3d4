//! The intermediate sourcemap document.
//!
//! Written by the prepare stage, read by build and pack:
//!
//! ```json
//! {
//!   "audio_file": "sound.wav",
//!   "source_dir": "sounds/bubble",
//!   "sounds": [
//!     { "name": "enter", "files": [ { "enter.wav": [0.0, 112.5] } ] }
//!   ]
//! }
//! ```
//!
//! The older flat form `{"files": [{"name", "file", "timing": [[s, e]]}]}` is
//! still accepted on read and converted. Split-derived sounds never appear
//! here.

use crate::error::{Error, Result};
use crate::relaxed_json;
use crate::sound::{file_stem, SoundFile, TimeRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Default name of the single audio blob
pub const DEFAULT_AUDIO_FILE: &str = "sound.wav";

/// File name of the sourcemap inside a pack directory
pub const SOURCEMAP_FILE: &str = "sourcemap.json";

/// Sourcemap document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourcemap {
    pub audio_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,
    pub sounds: Vec<SourceSound>,
}

/// A named sound and the file ranges backing it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSound {
    pub name: String,
    pub files: Vec<BTreeMap<String, TimeRange>>,
}

#[derive(Deserialize)]
struct RawSourcemap {
    #[serde(default)]
    audio_file: Option<String>,
    #[serde(default)]
    source_dir: Option<String>,
    #[serde(default)]
    sounds: Option<Vec<SourceSound>>,
    #[serde(default)]
    files: Option<Vec<LegacyEntry>>,
}

#[derive(Deserialize)]
struct LegacyEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    timing: Vec<TimeRange>,
}

impl From<RawSourcemap> for Sourcemap {
    fn from(raw: RawSourcemap) -> Self {
        let sounds = match (raw.sounds, raw.files) {
            (Some(sounds), _) => sounds,
            (None, Some(files)) => files
                .into_iter()
                .map(|entry| {
                    let file = entry.file.unwrap_or_else(|| entry.name.clone());
                    SourceSound {
                        name: entry.name,
                        files: entry
                            .timing
                            .into_iter()
                            .map(|t| BTreeMap::from([(file.clone(), t)]))
                            .collect(),
                    }
                })
                .collect(),
            (None, None) => Vec::new(),
        };
        Self {
            audio_file: raw.audio_file.unwrap_or_else(|| DEFAULT_AUDIO_FILE.to_string()),
            source_dir: raw.source_dir,
            sounds,
        }
    }
}

impl Sourcemap {
    /// Build a sourcemap with one sound per clip, named after the file stem
    pub fn from_clips<I>(audio_file: impl Into<String>, source_dir: Option<String>, clips: I) -> Self
    where
        I: IntoIterator<Item = (String, TimeRange)>,
    {
        let sounds = clips
            .into_iter()
            .map(|(file, range)| SourceSound {
                name: file_stem(&file).to_string(),
                files: vec![BTreeMap::from([(file, range)])],
            })
            .collect();
        Self {
            audio_file: audio_file.into(),
            source_dir,
            sounds,
        }
    }

    /// Parse either document form
    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: RawSourcemap = relaxed_json::from_str(text)?;
        Ok(raw.into())
    }

    /// Read a sourcemap from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Write the sourcemap as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Flatten into the engine's file pool, in document order
    pub fn entries(&self) -> Vec<SoundFile> {
        self.sounds
            .iter()
            .flat_map(|sound| {
                sound.files.iter().flat_map(move |map| {
                    map.iter()
                        .filter(|(file, _)| !file.is_empty())
                        .map(move |(file, range)| {
                            let name = if sound.name.is_empty() {
                                file_stem(file).to_string()
                            } else {
                                sound.name.clone()
                            };
                            SoundFile::new(file.clone()).with_name(name).with_timing(*range)
                        })
                })
            })
            .collect()
    }

    /// Flattened pool, or an error if the sourcemap lists no files
    pub fn pool(&self) -> Result<Vec<SoundFile>> {
        let entries = self.entries();
        if entries.is_empty() {
            return Err(Error::Sourcemap("no entries found in sourcemap".to_string()));
        }
        Ok(entries)
    }

    /// Every referenced filename, deduplicated, in document order
    pub fn filenames(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for entry in self.entries() {
            if !seen.contains(&entry.file) {
                seen.push(entry.file);
            }
        }
        seen
    }

    /// All timing ranges recorded for one file
    pub fn timings_of(&self, file: &str) -> Vec<TimeRange> {
        self.entries()
            .into_iter()
            .filter(|e| e.file == file)
            .filter_map(|e| e.timing)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sounds_form() {
        let text = r#"{
            "audio_file": "sound.wav",
            "source_dir": "sounds/x",
            "sounds": [
                {"name": "Enter", "files": [{"1.wav": [0, 100]}]},
                {"name": "misc", "files": [{"0.wav": [100, 200]}, {"3.wav": [200, 300]}]}
            ]
        }"#;
        let map = Sourcemap::from_json_str(text).unwrap();
        let entries = map.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "Enter");
        assert_eq!(entries[2].file, "3.wav");
        assert_eq!(entries[2].timing, Some(TimeRange::new(200.0, 300.0)));
        assert_eq!(map.source_dir.as_deref(), Some("sounds/x"));
    }

    #[test]
    fn test_legacy_files_form() {
        let text = r#"{
            "audio_file": "sound.ogg",
            "files": [
                {"name": "Enter", "file": "1.wav", "timing": [[0.0, 100.0]]},
                {"name": "Tab", "file": "2.wav", "timing": [[100.0, 200.0]]}
            ]
        }"#;
        let map = Sourcemap::from_json_str(text).unwrap();
        assert_eq!(map.audio_file, "sound.ogg");
        assert_eq!(map.filenames(), vec!["1.wav", "2.wav"]);
        assert_eq!(map.timings_of("2.wav"), vec![TimeRange::new(100.0, 200.0)]);
    }

    #[test]
    fn test_from_clips_roundtrip_through_json() {
        let map = Sourcemap::from_clips(
            "sound.wav",
            Some("in".to_string()),
            vec![("a.wav".to_string(), TimeRange::new(0.0, 5.0))],
        );
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains(r#""sounds":[{"name":"a","files":[{"a.wav":[0.0,5.0]}]}]"#));
        assert_eq!(Sourcemap::from_json_str(&json).unwrap(), map);
    }

    #[test]
    fn test_empty_pool_is_an_error() {
        let map = Sourcemap::from_json_str(r#"{"audio_file": "sound.wav", "sounds": []}"#).unwrap();
        assert!(matches!(map.pool().unwrap_err(), Error::Sourcemap(_)));
    }
}
