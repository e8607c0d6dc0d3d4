//! Timing splitter.
//!
//! Cuts one timing range into a key-down half and a key-up half at
//! `floor((start + end) / 2)`. The derived sounds are named after the source
//! file (`1.wav` -> `1-down.wav`, `1-up.wav`) and exist only in the in-memory
//! assignment; the pack stage recognises the suffixes and slices the audio
//! with the same policy.
//!
//! A derived name never shadows a source file. When `enter-up.wav` is itself
//! in the pool, the up half of `enter.wav` becomes `enter-up-2.wav`.

use crate::assignment::{Assignment, Direction, Provenance};
use crate::keys::KeyRegistry;
use crate::sound::{with_suffix, SoundEntry, TimeRange, VirtualSound};

/// Suffix of the key-down half
pub const DOWN_SUFFIX: &str = "-down";
/// Suffix of the key-up half
pub const UP_SUFFIX: &str = "-up";

/// Which half of a split range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    Down,
    Up,
}

impl Half {
    pub fn suffix(self) -> &'static str {
        match self {
            Half::Down => DOWN_SUFFIX,
            Half::Up => UP_SUFFIX,
        }
    }
}

/// Split point: the mean of start and end, floored to whole milliseconds
pub fn split_point(range: TimeRange) -> f64 {
    ((range.start + range.end) / 2.0).floor()
}

/// `(down, up)` halves of a range
pub fn split_range(range: TimeRange) -> (TimeRange, TimeRange) {
    let mid = split_point(range).clamp(range.start, range.end);
    (TimeRange::new(range.start, mid), TimeRange::new(mid, range.end))
}

/// One half of a range
pub fn half_of(range: TimeRange, half: Half) -> TimeRange {
    let (down, up) = split_range(range);
    match half {
        Half::Down => down,
        Half::Up => up,
    }
}

/// Name of the derived file for one half (`1.wav` -> `1-up.wav`)
pub fn derived_name(file: &str, half: Half) -> String {
    with_suffix(file, half.suffix())
}

fn numbered_name(file: &str, half: Half, n: usize) -> String {
    if n <= 1 {
        derived_name(file, half)
    } else {
        with_suffix(file, &format!("{}-{}", half.suffix(), n))
    }
}

/// Recognise a derived name (`1-up.wav`, `1-up-2.wav`) and return its base
/// file name and half
pub fn parse_derived(file: &str) -> Option<(String, Half)> {
    let (stem, ext) = match file.rfind('.') {
        Some(dot) if dot > 0 => (&file[..dot], &file[dot..]),
        _ => (file, ""),
    };
    let unnumbered = stem
        .rsplit_once('-')
        .filter(|(_, n)| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        .map(|(head, _)| head);

    [Some(stem), unnumbered].into_iter().flatten().find_map(|stem| {
        [Half::Up, Half::Down].into_iter().find_map(|half| {
            stem.strip_suffix(half.suffix())
                .filter(|base| !base.is_empty())
                .map(|base| (format!("{}{}", base, ext), half))
        })
    })
}

/// One derived half of `file`.
///
/// Takes the first of `1-up.wav`, `1-up-2.wav`, ... that is neither a source
/// filename nor registered for a different sound. Deriving the same half
/// twice yields the same name.
pub fn derive_half(assignment: &Assignment, file: &str, half: Half, timing: TimeRange) -> VirtualSound {
    let mut n = 1;
    loop {
        let name = numbered_name(file, half, n);
        let sound = VirtualSound {
            name: name.clone(),
            entries: vec![SoundEntry {
                file: name,
                timing: Some(timing),
            }],
        };
        let free = !assignment.is_reserved(&sound.name)
            && assignment
                .sound(&sound.name)
                .map_or(true, |existing| existing.entries == sound.entries);
        if free {
            return sound;
        }
        n += 1;
    }
}

fn derive(assignment: &Assignment, sound: &VirtualSound, range: TimeRange) -> Option<(VirtualSound, VirtualSound)> {
    let [entry] = sound.entries.as_slice() else {
        return None;
    };
    let (down, up) = split_range(range);
    Some((
        derive_half(assignment, &entry.file, Half::Down, down),
        derive_half(assignment, &entry.file, Half::Up, up),
    ))
}

/// Replace each splittable key's sounds with derived down/up halves.
///
/// A key is splittable when its key-down sound is a single entry with a
/// timing range and its key-up slot was not set by a rule. Rule-provided
/// key-up sounds always win. Returns the number of keys split.
pub fn apply_split(assignment: &mut Assignment, registry: &KeyRegistry) -> usize {
    let mut count = 0;
    for key in registry.names() {
        if matches!(assignment.get(key, Direction::Up), Some(slot) if slot.source == Provenance::Rule) {
            continue;
        }
        let Some(sound) = assignment.sound_for(key, Direction::Down) else {
            continue;
        };
        let Some(range) = sound.single_timing() else {
            continue;
        };
        let Some((down, up)) = derive(assignment, sound, range) else {
            continue;
        };

        let down = assignment.register(down);
        let up = assignment.register(up);
        assignment.set(key, Direction::Down, &down, Provenance::Split);
        assignment.set(key, Direction::Up, &up, Provenance::Split);
        count += 1;
    }

    if assignment.fallback_up.is_none() {
        let derived = assignment
            .fallback_down
            .as_deref()
            .and_then(|name| assignment.sound(name))
            .and_then(|sound| sound.single_timing().and_then(|range| derive(assignment, sound, range)));
        if let Some((down, up)) = derived {
            assignment.fallback_down = Some(assignment.register(down));
            assignment.fallback_up = Some(assignment.register(up));
        }
    }

    log::debug!("Split {} key(s) into down/up halves", count);
    count
}
