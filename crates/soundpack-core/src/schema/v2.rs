//! Multi-file config: key codes map to sound names, with `code-up` entries
//! for key-up sounds.

use super::{slot_sound, PackMeta, VersionField};
use crate::assignment::{Assignment, Direction};
use crate::error::Result;
use crate::keys::KeyRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V2Config {
    pub id: String,
    pub name: String,
    pub key_define_type: String,
    pub sound: String,
    pub soundup: String,
    pub defines: Map<String, Value>,
    pub version: VersionField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Inputs for the `sound`/`soundup` defaults
#[derive(Debug, Clone, Default)]
pub struct V2Defaults {
    /// First file of the source pool, used when no `*` fallback exists
    pub first_file: Option<String>,
    /// Derived up half of the first file, present only after splitting
    pub first_up: Option<String>,
}

/// Compile an assignment into a v2 document.
///
/// `sound` is the key-down fallback (or the first source file). `soundup` is
/// the key-up fallback, else the first file's derived up half when `sound`
/// came from the first file, else `sound`.
pub fn compile(
    assignment: &Assignment,
    registry: &KeyRegistry,
    meta: &PackMeta,
    defaults: &V2Defaults,
) -> Result<V2Config> {
    let mut defines = Map::new();
    for key in registry.keys() {
        if let Some(sound) = slot_sound(assignment, key.name, Direction::Down)? {
            defines.insert(key.code.to_string(), Value::from(sound.name.clone()));
        }
    }
    for key in registry.keys() {
        if let Some(sound) = slot_sound(assignment, key.name, Direction::Up)? {
            defines.insert(format!("{}-up", key.code), Value::from(sound.name.clone()));
        }
    }

    let sound = assignment
        .fallback_down
        .clone()
        .or_else(|| defaults.first_file.clone())
        .unwrap_or_default();
    let soundup = match (&assignment.fallback_up, &assignment.fallback_down) {
        (Some(up), _) => up.clone(),
        (None, None) => defaults.first_up.clone().unwrap_or_else(|| sound.clone()),
        (None, Some(_)) => sound.clone(),
    };
    log::debug!("v2: {} define(s), sound='{}', soundup='{}'", defines.len(), sound, soundup);

    Ok(V2Config {
        id: meta.id.clone(),
        name: meta.name.clone(),
        key_define_type: "multi".to_string(),
        sound,
        soundup,
        defines,
        version: VersionField::new(2, meta.dx_compatible),
        author: meta.author.clone(),
        icon: meta.icon.clone(),
        tags: meta.tags.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::Provenance;
    use crate::sound::{SoundFile, VirtualSound};
    use serde_json::json;

    #[test]
    fn test_preserves_groups_and_keyup() {
        let registry = KeyRegistry::subset(&["Enter", "Tab"]);
        let mut assignment = Assignment::new();
        let group = VirtualSound {
            name: "key*.wav".to_string(),
            entries: vec![SoundFile::new("key1.wav").entry(), SoundFile::new("key2.wav").entry()],
        };
        let group = assignment.register(group);
        let up = assignment.register(VirtualSound::single(&SoundFile::new("up.wav")));
        assignment.set("Enter", Direction::Down, &group, Provenance::Rule);
        assignment.set("Tab", Direction::Down, &group, Provenance::Rule);
        assignment.set("Enter", Direction::Up, &up, Provenance::Rule);

        let defaults = V2Defaults {
            first_file: Some("key1.wav".to_string()),
            first_up: None,
        };
        let config = compile(&assignment, &registry, &PackMeta::new("p", "P"), &defaults).unwrap();
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "p",
                "name": "P",
                "key_define_type": "multi",
                "sound": "key1.wav",
                "soundup": "key1.wav",
                "defines": {"28": "key*.wav", "15": "key*.wav", "28-up": "up.wav"},
                "version": 2,
                "tags": []
            })
        );
    }

    #[test]
    fn test_sound_defaults() {
        let registry = KeyRegistry::subset(&["Enter"]);
        let mut assignment = Assignment::new();
        assignment.fallback_down = Some("fallback.wav".to_string());

        let mut meta = PackMeta::new("p", "P");
        meta.dx_compatible = true;
        let split = V2Defaults {
            first_file: Some("a.wav".to_string()),
            first_up: Some("a-up.wav".to_string()),
        };
        let config = compile(&assignment, &registry, &meta, &split).unwrap();
        assert_eq!(config.sound, "fallback.wav");
        assert_eq!(config.soundup, "fallback.wav");
        assert_eq!(config.version, VersionField::Text("2".to_string()));

        assignment.fallback_up = Some("release.wav".to_string());
        let config = compile(&assignment, &registry, &meta, &split).unwrap();
        assert_eq!(config.soundup, "release.wav");

        let bare = Assignment::new();
        let config = compile(&bare, &registry, &meta, &split).unwrap();
        assert_eq!((config.sound.as_str(), config.soundup.as_str()), ("a.wav", "a-up.wav"));
        let unsplit = V2Defaults {
            first_up: None,
            ..split
        };
        let config = compile(&bare, &registry, &meta, &unsplit).unwrap();
        assert_eq!(config.soundup, "a.wav");
    }
}
