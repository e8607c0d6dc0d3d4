//! Key to sound assignment built up by the allocation stages.

use crate::sound::VirtualSound;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Key event direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Down,
    Up,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Down => write!(f, "down"),
            Direction::Up => write!(f, "up"),
        }
    }
}

/// Which stage filled a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Explicit rule selector
    Rule,
    /// File named after the key
    Direct,
    /// Balanced-random distribution
    Balanced,
    /// `*` / `*_UP` fallback
    Fallback,
    /// Derived by the timing splitter
    Split,
}

/// A filled key slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Name of the virtual sound played
    pub sound: String,
    /// Stage that filled the slot
    pub source: Provenance,
}

/// Mapping from (key, direction) to virtual sound.
///
/// Sounds are registered once by name; slots reference them by name.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    down: HashMap<String, Slot>,
    up: HashMap<String, Slot>,
    sounds: HashMap<String, VirtualSound>,
    /// Lower-cased filenames of the source pool
    reserved: HashSet<String>,
    /// Sound designated by a `*` selector
    pub fallback_down: Option<String>,
    /// Sound designated by a `*_UP` selector
    pub fallback_up: Option<String>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self, direction: Direction) -> &HashMap<String, Slot> {
        match direction {
            Direction::Down => &self.down,
            Direction::Up => &self.up,
        }
    }

    fn slots_mut(&mut self, direction: Direction) -> &mut HashMap<String, Slot> {
        match direction {
            Direction::Down => &mut self.down,
            Direction::Up => &mut self.up,
        }
    }

    /// Register a virtual sound and return its name
    pub fn register(&mut self, sound: VirtualSound) -> String {
        let name = sound.name.clone();
        match self.sounds.get(&name) {
            Some(existing) if existing.entries != sound.entries => {
                log::warn!("Sound name '{}' registered twice, keeping the first", name);
            }
            Some(_) => {}
            None => {
                self.sounds.insert(name.clone(), sound);
            }
        }
        name
    }

    /// Mark source filenames as taken so no derived sound can reuse them
    pub fn reserve_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.reserved
            .extend(names.into_iter().map(|name| name.as_ref().to_lowercase()));
    }

    /// True if `name` is a source filename (case-insensitive)
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(&name.to_lowercase())
    }

    /// Look up a registered sound
    pub fn sound(&self, name: &str) -> Option<&VirtualSound> {
        self.sounds.get(name)
    }

    /// All registered sounds
    pub fn sounds(&self) -> impl Iterator<Item = &VirtualSound> {
        self.sounds.values()
    }

    /// The slot for a key, if filled
    pub fn get(&self, key: &str, direction: Direction) -> Option<&Slot> {
        self.slots(direction).get(key)
    }

    /// The sound played for a key, if any
    pub fn sound_for(&self, key: &str, direction: Direction) -> Option<&VirtualSound> {
        self.get(key, direction).and_then(|slot| self.sounds.get(&slot.sound))
    }

    /// True if the key has a slot in this direction
    pub fn is_assigned(&self, key: &str, direction: Direction) -> bool {
        self.slots(direction).contains_key(key)
    }

    /// Fill an empty slot. Returns false if the slot was already taken.
    pub fn claim(&mut self, key: &str, direction: Direction, sound: &str, source: Provenance) -> bool {
        let slots = self.slots_mut(direction);
        if slots.contains_key(key) {
            return false;
        }
        slots.insert(
            key.to_string(),
            Slot {
                sound: sound.to_string(),
                source,
            },
        );
        true
    }

    /// Fill a slot unconditionally
    pub fn set(&mut self, key: &str, direction: Direction, sound: &str, source: Provenance) {
        self.slots_mut(direction).insert(
            key.to_string(),
            Slot {
                sound: sound.to_string(),
                source,
            },
        );
    }

    /// Iterate filled slots in one direction (unordered)
    pub fn iter(&self, direction: Direction) -> impl Iterator<Item = (&str, &Slot)> {
        self.slots(direction).iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of filled slots in one direction
    pub fn count(&self, direction: Direction) -> usize {
        self.slots(direction).len()
    }

    /// True if any key-up slot is filled
    pub fn has_keyup(&self) -> bool {
        !self.up.is_empty()
    }

    /// Drop every key-up slot and the key-up fallback.
    ///
    /// Returns the removed `(key, sound)` pairs.
    pub fn strip_keyup(&mut self) -> Vec<(String, String)> {
        self.fallback_up = None;
        let mut removed: Vec<_> = self.up.drain().map(|(k, slot)| (k, slot.sound)).collect();
        removed.sort();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::SoundFile;

    #[test]
    fn test_claim_does_not_overwrite() {
        let mut assignment = Assignment::new();
        let a = assignment.register(VirtualSound::single(&SoundFile::new("a.wav")));
        let b = assignment.register(VirtualSound::single(&SoundFile::new("b.wav")));

        assert!(assignment.claim("Enter", Direction::Down, &a, Provenance::Rule));
        assert!(!assignment.claim("Enter", Direction::Down, &b, Provenance::Balanced));
        assert_eq!(assignment.get("Enter", Direction::Down).unwrap().sound, "a.wav");

        // Directions are independent
        assert!(assignment.claim("Enter", Direction::Up, &b, Provenance::Rule));
        assert_eq!(assignment.sound_for("Enter", Direction::Up).unwrap().name, "b.wav");
    }

    #[test]
    fn test_strip_keyup() {
        let mut assignment = Assignment::new();
        let a = assignment.register(VirtualSound::single(&SoundFile::new("a.wav")));
        assignment.claim("Tab", Direction::Up, &a, Provenance::Rule);
        assignment.fallback_up = Some(a.clone());

        let removed = assignment.strip_keyup();
        assert_eq!(removed, vec![("Tab".to_string(), "a.wav".to_string())]);
        assert!(!assignment.has_keyup());
        assert!(assignment.fallback_up.is_none());
    }

    #[test]
    fn test_reserved_names_are_case_insensitive() {
        let mut assignment = Assignment::new();
        assignment.reserve_names(["Enter-Up.wav", "1.wav"]);
        assert!(assignment.is_reserved("enter-up.wav"));
        assert!(assignment.is_reserved("1.WAV"));
        assert!(!assignment.is_reserved("enter.wav"));
    }
}
