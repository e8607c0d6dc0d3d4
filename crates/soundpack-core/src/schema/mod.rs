//! Playback config documents.
//!
//! Three target formats are supported:
//!
//! - **v1**: one audio blob, `defines` maps key codes to `[start, length]`
//! - **v2**: one file per sound, `defines` maps key codes (and `code-up`) to
//!   sound names, random groups allowed
//! - **dx**: one audio blob, `definitions` maps key names to a down and an up
//!   `[start, end]` range
//!
//! Each compiler walks the key registry in order, so the emitted documents are
//! stable for a given assignment.

pub mod dx;
pub mod v1;
pub mod v2;

use crate::assignment::{Assignment, Direction};
use crate::error::{Error, Result};
use crate::sound::{TimeRange, VirtualSound};
use crate::sourcemap::DEFAULT_AUDIO_FILE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub use dx::{DxConfig, DxDefinition, DxOptions};
pub use v1::V1Config;
pub use v2::V2Config;

/// Target config format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    V1,
    V2,
    Dx,
}

impl SchemaVersion {
    /// All versions in emission order
    pub const ALL: [SchemaVersion; 3] = [SchemaVersion::V1, SchemaVersion::V2, SchemaVersion::Dx];

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaVersion::V1 => "v1",
            SchemaVersion::V2 => "v2",
            SchemaVersion::Dx => "dx",
        }
    }

    /// File name of the compiled document inside a pack directory
    pub fn config_file_name(self) -> String {
        format!("config.{}.json", self.as_str())
    }

    /// True for formats that honour key-up rule selectors
    pub fn supports_keyup(self) -> bool {
        self == SchemaVersion::V2
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(SchemaVersion::V1),
            "v2" | "2" => Ok(SchemaVersion::V2),
            "dx" | "mvdx" => Ok(SchemaVersion::Dx),
            _ => Err(Error::UnknownSchema(s.to_string())),
        }
    }
}

/// Parse a schema selector such as `v1|dx`, `v2,dx` or `all`.
///
/// The result is deduplicated and in [`SchemaVersion::ALL`] order.
pub fn parse_schema_selection(selector: &str) -> Result<Vec<SchemaVersion>> {
    let trimmed = selector.trim();
    if trimmed.eq_ignore_ascii_case("all") {
        return Ok(SchemaVersion::ALL.to_vec());
    }

    let mut versions = Vec::new();
    for part in trimmed.split(['|', ',']).map(str::trim).filter(|p| !p.is_empty()) {
        let version: SchemaVersion = part
            .parse()
            .map_err(|_| Error::UnknownSchema(selector.to_string()))?;
        if !versions.contains(&version) {
            versions.push(version);
        }
    }
    if versions.is_empty() {
        return Err(Error::UnknownSchema(selector.to_string()));
    }
    versions.sort();
    Ok(versions)
}

/// `version` field of v1/v2 documents: a number, or a string when the pack
/// must load in DX-compatible players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionField {
    Number(u8),
    Text(String),
}

impl VersionField {
    pub fn new(version: u8, dx_compatible: bool) -> Self {
        if dx_compatible {
            VersionField::Text(version.to_string())
        } else {
            VersionField::Number(version)
        }
    }
}

/// Pack-level metadata shared by every format
#[derive(Debug, Clone, PartialEq)]
pub struct PackMeta {
    pub id: String,
    pub name: String,
    pub author: Option<String>,
    pub icon: Option<String>,
    pub tags: Vec<String>,
    pub includes_numpad: bool,
    pub dx_compatible: bool,
    /// Name of the single audio blob
    pub audio_file: String,
    /// RFC 3339 creation time written into dx documents
    pub created_at: String,
    pub options: DxOptions,
}

impl PackMeta {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            author: None,
            icon: None,
            tags: Vec::new(),
            includes_numpad: true,
            dx_compatible: false,
            audio_file: DEFAULT_AUDIO_FILE.to_string(),
            created_at: String::new(),
            options: DxOptions::default(),
        }
    }
}

/// The sound behind a slot, or `None` if the slot is empty.
///
/// A slot pointing at an unregistered sound is an error.
pub(crate) fn slot_sound<'a>(
    assignment: &'a Assignment,
    key: &str,
    direction: Direction,
) -> Result<Option<&'a VirtualSound>> {
    let Some(slot) = assignment.get(key, direction) else {
        return Ok(None);
    };
    assignment
        .sound(&slot.sound)
        .map(Some)
        .ok_or_else(|| Error::UnknownSound {
            key: key.to_string(),
            sound: slot.sound.clone(),
        })
}

/// Timing of a single-entry sound for a timing-based format
pub(crate) fn single_range(
    version: &'static str,
    key: &str,
    sound: &VirtualSound,
) -> Result<TimeRange> {
    if sound.is_random_group() {
        return Err(Error::RandomGroup {
            version,
            key: key.to_string(),
            sound: sound.name.clone(),
            files: sound.entries.len(),
        });
    }
    let range = sound.single_timing().ok_or_else(|| Error::MissingTiming {
        key: key.to_string(),
        sound: sound.name.clone(),
    })?;
    if range.end < range.start {
        return Err(Error::InvalidTiming {
            sound: sound.name.clone(),
            start: range.start,
            end: range.end,
        });
    }
    Ok(range)
}

/// Recursively merge `overrides` into `base`.
///
/// Objects merge key by key; any other value replaces the base value.
pub fn deep_merge(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overrides) => *base = overrides.clone(),
    }
}
