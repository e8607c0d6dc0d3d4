//! Key name registry
//!
//! The fixed list of physical keys a soundpack can define, in the order the
//! allocator walks them, together with the numeric key codes the v1/v2
//! playback configs use as `defines` keys.

/// A registry entry: key name -> playback key code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDef {
    /// Key name as used in rule files and DX definitions (e.g. `Enter`)
    pub name: &'static str,
    /// Key code used by v1/v2 `defines` (e.g. `28` for Enter)
    pub code: u16,
}

const fn key(name: &'static str, code: u16) -> KeyDef {
    KeyDef { name, code }
}

/// All supported keys, sorted by name.
pub const STANDARD_KEYS: &[KeyDef] = &[
    key("AltLeft", 56),
    key("ArrowDown", 57424),
    key("ArrowLeft", 57419),
    key("ArrowRight", 57421),
    key("ArrowUp", 57416),
    key("Backquote", 41),
    key("Backslash", 43),
    key("Backspace", 14),
    key("BracketLeft", 26),
    key("BracketRight", 27),
    key("CapsLock", 58),
    key("Comma", 51),
    key("ControlLeft", 29),
    key("Delete", 3667),
    key("Digit0", 11),
    key("Digit1", 2),
    key("Digit2", 3),
    key("Digit3", 4),
    key("Digit4", 5),
    key("Digit5", 6),
    key("Digit6", 7),
    key("Digit7", 8),
    key("Digit8", 9),
    key("Digit9", 10),
    key("End", 3663),
    key("Enter", 28),
    key("Equal", 13),
    key("Escape", 1),
    key("F1", 59),
    key("F10", 68),
    key("F11", 87),
    key("F12", 88),
    key("F2", 60),
    key("F3", 61),
    key("F4", 62),
    key("F5", 63),
    key("F6", 64),
    key("F7", 65),
    key("F8", 66),
    key("F9", 67),
    key("Home", 3655),
    key("Insert", 3666),
    key("KeyA", 30),
    key("KeyB", 48),
    key("KeyC", 46),
    key("KeyD", 32),
    key("KeyE", 18),
    key("KeyF", 33),
    key("KeyG", 34),
    key("KeyH", 35),
    key("KeyI", 23),
    key("KeyJ", 36),
    key("KeyK", 37),
    key("KeyL", 38),
    key("KeyM", 50),
    key("KeyN", 49),
    key("KeyO", 24),
    key("KeyP", 25),
    key("KeyQ", 16),
    key("KeyR", 19),
    key("KeyS", 31),
    key("KeyT", 20),
    key("KeyU", 22),
    key("KeyV", 47),
    key("KeyW", 17),
    key("KeyX", 45),
    key("KeyY", 21),
    key("KeyZ", 44),
    key("Minus", 12),
    key("NumLock", 69),
    key("Numpad0", 82),
    key("Numpad1", 79),
    key("Numpad2", 80),
    key("Numpad3", 81),
    key("Numpad4", 75),
    key("Numpad5", 76),
    key("Numpad6", 77),
    key("Numpad7", 71),
    key("Numpad8", 72),
    key("Numpad9", 73),
    key("NumpadAdd", 78),
    key("NumpadDecimal", 83),
    key("NumpadDivide", 3637),
    key("NumpadEnter", 3612),
    key("NumpadMultiply", 55),
    key("NumpadSubtract", 74),
    key("PageDown", 3665),
    key("PageUp", 3657),
    key("Pause", 3653),
    key("Period", 52),
    key("PrintScreen", 3639),
    key("Quote", 40),
    key("ScrollLock", 70),
    key("Semicolon", 39),
    key("ShiftLeft", 42),
    key("ShiftRight", 54),
    key("Slash", 53),
    key("Space", 57),
    key("Tab", 15),
];

/// Ordered set of keys the engine allocates over
#[derive(Debug, Clone)]
pub struct KeyRegistry {
    keys: Vec<KeyDef>,
}

impl Default for KeyRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl KeyRegistry {
    /// The full standard registry
    pub fn standard() -> Self {
        Self {
            keys: STANDARD_KEYS.to_vec(),
        }
    }

    /// A registry restricted to the given names, in the given order.
    ///
    /// Names are looked up case-insensitively in [`STANDARD_KEYS`]; unknown
    /// names are skipped.
    pub fn subset<S: AsRef<str>>(names: &[S]) -> Self {
        let keys = names
            .iter()
            .filter_map(|n| lookup(n.as_ref()))
            .collect();
        Self { keys }
    }

    /// All keys in allocation order
    pub fn keys(&self) -> &[KeyDef] {
        &self.keys
    }

    /// Key names in allocation order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.keys.iter().map(|k| k.name)
    }

    /// Find a key by name, ignoring case
    pub fn get(&self, name: &str) -> Option<&KeyDef> {
        self.keys.iter().find(|k| k.name.eq_ignore_ascii_case(name))
    }

    /// True if `name` equals any registered key name, ignoring case
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if the registry has no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Look up a key in the standard table, ignoring case
pub fn lookup(name: &str) -> Option<KeyDef> {
    STANDARD_KEYS
        .iter()
        .copied()
        .find(|k| k.name.eq_ignore_ascii_case(name))
}

/// Key code for a standard key name
pub fn key_code(name: &str) -> Option<u16> {
    lookup(name).map(|k| k.code)
}
