//! Fallback resolution: keys nothing else claimed get the `*` / `*_UP` sounds.

use crate::assignment::{Assignment, Direction, Provenance};
use crate::keys::KeyRegistry;

/// Fill empty slots with the designated fallbacks.
///
/// Returns the number of `(down, up)` slots filled. Without a designated
/// fallback the slots stay empty.
pub fn apply_fallbacks(assignment: &mut Assignment, registry: &KeyRegistry) -> (usize, usize) {
    let down = fill(assignment, registry, Direction::Down);
    let up = fill(assignment, registry, Direction::Up);
    if down + up > 0 {
        log::debug!("Fallback filled {} key-down and {} key-up slots", down, up);
    }
    (down, up)
}

fn fill(assignment: &mut Assignment, registry: &KeyRegistry, direction: Direction) -> usize {
    let fallback = match direction {
        Direction::Down => assignment.fallback_down.clone(),
        Direction::Up => assignment.fallback_up.clone(),
    };
    let Some(sound) = fallback else {
        return 0;
    };
    registry
        .names()
        .filter(|key| assignment.claim(key, direction, &sound, Provenance::Fallback))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::{SoundFile, VirtualSound};

    #[test]
    fn test_fills_only_empty_slots() {
        let registry = KeyRegistry::subset(&["Enter", "Tab", "Escape"]);
        let mut assignment = Assignment::new();
        let a = assignment.register(VirtualSound::single(&SoundFile::new("a.wav")));
        let fb = assignment.register(VirtualSound::single(&SoundFile::new("fb.wav")));
        assignment.claim("Enter", Direction::Down, &a, Provenance::Rule);
        assignment.fallback_down = Some(fb);

        assert_eq!(apply_fallbacks(&mut assignment, &registry), (2, 0));
        assert_eq!(assignment.get("Enter", Direction::Down).unwrap().sound, "a.wav");
        let tab = assignment.get("Tab", Direction::Down).unwrap();
        assert_eq!((tab.sound.as_str(), tab.source), ("fb.wav", Provenance::Fallback));
        assert!(!assignment.has_keyup());
    }

    #[test]
    fn test_keyup_fallback() {
        let registry = KeyRegistry::subset(&["Enter", "Tab"]);
        let mut assignment = Assignment::new();
        let up = assignment.register(VirtualSound::single(&SoundFile::new("up.wav")));
        let other = assignment.register(VirtualSound::single(&SoundFile::new("o.wav")));
        assignment.claim("Tab", Direction::Up, &other, Provenance::Rule);
        assignment.fallback_up = Some(up);

        assert_eq!(apply_fallbacks(&mut assignment, &registry), (0, 1));
        assert_eq!(assignment.get("Enter", Direction::Up).unwrap().sound, "up.wav");
        assert_eq!(assignment.get("Tab", Direction::Up).unwrap().sound, "o.wav");
    }

    #[test]
    fn test_no_fallback_leaves_slots_empty() {
        let registry = KeyRegistry::subset(&["Enter"]);
        let mut assignment = Assignment::new();
        assert_eq!(apply_fallbacks(&mut assignment, &registry), (0, 0));
        assert_eq!(assignment.count(Direction::Down), 0);
    }
}
