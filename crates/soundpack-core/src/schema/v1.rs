//! Single-blob config with `[start, length]` clips per key code.

use super::{single_range, slot_sound, PackMeta, VersionField};
use crate::assignment::{Assignment, Direction};
use crate::error::{Error, Result};
use crate::keys::KeyRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V1Config {
    pub id: String,
    pub name: String,
    pub key_define_type: String,
    pub includes_numpad: bool,
    pub sound: String,
    pub defines: Map<String, Value>,
    pub version: VersionField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Compile an assignment into a v1 document.
///
/// Key-up slots must have been stripped beforehand; any that remain are an
/// error, as are random groups and sounds without timing.
pub fn compile(assignment: &Assignment, registry: &KeyRegistry, meta: &PackMeta) -> Result<V1Config> {
    for key in registry.names() {
        if let Some(slot) = assignment.get(key, Direction::Up) {
            return Err(Error::KeyUpNotSupported {
                key: key.to_string(),
                sound: slot.sound.clone(),
            });
        }
    }

    let mut defines = Map::new();
    for key in registry.keys() {
        let Some(sound) = slot_sound(assignment, key.name, Direction::Down)? else {
            continue;
        };
        let range = single_range("v1", key.name, sound)?;
        defines.insert(key.code.to_string(), Value::from(range.to_clip().to_vec()));
    }
    log::debug!("v1: {} key definition(s)", defines.len());

    Ok(V1Config {
        id: meta.id.clone(),
        name: meta.name.clone(),
        key_define_type: "single".to_string(),
        includes_numpad: meta.includes_numpad,
        sound: meta.audio_file.clone(),
        defines,
        version: VersionField::new(1, meta.dx_compatible),
        author: meta.author.clone(),
        icon: meta.icon.clone(),
        tags: meta.tags.clone(),
    })
}
