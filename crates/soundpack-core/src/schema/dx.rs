//! Single-blob config keyed by key name, with a down and an up range per key.

use super::{deep_merge, single_range, slot_sound, PackMeta};
use crate::assignment::{Assignment, Direction};
use crate::error::{Error, Result};
use crate::keys::KeyRegistry;
use crate::sound::TimeRange;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Player options embedded in the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DxOptions {
    #[serde(default)]
    pub random_pitch: bool,
    #[serde(default = "default_volume")]
    pub recommended_volume: f64,
}

fn default_volume() -> f64 {
    1.0
}

impl Default for DxOptions {
    fn default() -> Self {
        Self {
            random_pitch: false,
            recommended_volume: default_volume(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DxDefinition {
    /// `[down, up]`
    pub timing: Vec<TimeRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DxConfig {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub audio_file: String,
    pub config_version: String,
    pub created_at: String,
    pub definition_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub options: DxOptions,
    #[serde(default)]
    pub tags: Vec<String>,
    pub definitions: Map<String, Value>,
}

impl DxConfig {
    /// Serialize, then deep-merge an optional overrides document on top
    pub fn to_value_with_overrides(&self, overrides: Option<&Value>) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Some(overrides) = overrides {
            deep_merge(&mut value, overrides);
        }
        Ok(value)
    }
}

/// Compile an assignment into a dx document.
///
/// Every key with a key-down sound needs a timed, single-entry key-up sound
/// as well; run the timing splitter first to derive them.
pub fn compile(assignment: &Assignment, registry: &KeyRegistry, meta: &PackMeta) -> Result<DxConfig> {
    let mut definitions = Map::new();
    for key in registry.names() {
        let Some(down) = slot_sound(assignment, key, Direction::Down)? else {
            continue;
        };
        let down_range = single_range("dx", key, down)?;
        let up = slot_sound(assignment, key, Direction::Up)?.ok_or_else(|| Error::MissingKeyUp {
            key: key.to_string(),
            sound: down.name.clone(),
        })?;
        let up = single_range("dx", key, up)?;

        let definition = DxDefinition {
            timing: vec![down_range, up],
        };
        definitions.insert(key.to_string(), serde_json::to_value(definition)?);
    }
    log::debug!("dx: {} key definition(s)", definitions.len());

    Ok(DxConfig {
        id: meta.id.clone(),
        name: meta.name.clone(),
        author: meta.author.clone(),
        audio_file: meta.audio_file.clone(),
        config_version: "2".to_string(),
        created_at: meta.created_at.clone(),
        definition_method: "single".to_string(),
        icon: meta.icon.clone(),
        options: meta.options.clone(),
        tags: meta.tags.clone(),
        definitions,
    })
}
