//! Rule documents.
//!
//! A rule file holds one `map` object whose keys are file patterns and whose
//! values are ordered key selectors:
//!
//! ```json
//! {
//!   "map": {
//!     "1.wav": ["Enter", "Tab"],
//!     "{0-3}.wav": ["Numpad*_UP"],
//!     "fallback.wav": ["*"], // every key nothing else claimed
//!   }
//! }
//! ```
//!
//! Object order is the evaluation order.

use crate::error::{Error, Result};
use crate::relaxed_json;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Selector token for the key-down fallback
pub const FALLBACK_DOWN: &str = "*";
/// Selector token for the key-up fallback
pub const FALLBACK_UP: &str = "*_UP";
/// Suffix that turns a selector into a key-up selector
pub const UP_SUFFIX: &str = "_UP";

/// A key selector from the right-hand side of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `*`: matched sound becomes the key-down fallback
    FallbackDown,
    /// `*_UP`: matched sound becomes the key-up fallback
    FallbackUp,
    /// Exact name or pattern over key names, key-down slots
    Down(String),
    /// `<name>_UP`: exact name or pattern over key names, key-up slots
    Up(String),
}

impl Selector {
    pub fn parse(raw: &str) -> Self {
        if raw == FALLBACK_DOWN {
            Selector::FallbackDown
        } else if raw == FALLBACK_UP {
            Selector::FallbackUp
        } else if let Some(stripped) = raw.strip_suffix(UP_SUFFIX) {
            Selector::Up(stripped.to_string())
        } else {
            Selector::Down(raw.to_string())
        }
    }

    /// True for selectors that only make sense with key-up support
    pub fn is_keyup(&self) -> bool {
        matches!(self, Selector::FallbackUp | Selector::Up(_))
    }
}

/// One `file-pattern -> selectors` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: String,
    pub selectors: Vec<Selector>,
}

impl Rule {
    pub fn new<S: AsRef<str>>(pattern: impl Into<String>, selectors: &[S]) -> Self {
        Self {
            pattern: pattern.into(),
            selectors: selectors.iter().map(|s| Selector::parse(s.as_ref())).collect(),
        }
    }

    /// True if any selector targets key-up slots
    pub fn has_keyup(&self) -> bool {
        self.selectors.iter().any(Selector::is_keyup)
    }
}

/// Ordered list of rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Load a rule file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let rules = Self::from_json_str(&text)?;
        log::info!("Loaded {} rules from {}", rules.len(), path.display());
        Ok(rules)
    }

    /// Parse relaxed JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = relaxed_json::from_str(text)
            .map_err(|e| Error::RuleSyntax(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Build from an already-parsed document.
    ///
    /// Accepts `{"map": {...}}` or the bare map.
    pub fn from_value(value: &Value) -> Result<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| Error::RuleSyntax("rule document must be an object".to_string()))?;
        let map = match root.get("map") {
            Some(Value::Object(map)) => map,
            Some(_) => return Err(Error::RuleSyntax("'map' must be an object".to_string())),
            None => root,
        };
        Self::from_map(map)
    }

    fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let mut rules = Vec::with_capacity(map.len());
        for (pattern, selectors) in map {
            // Legacy alias: "fallback": "<pattern>"
            if pattern == "fallback" {
                if let Value::String(target) = selectors {
                    rules.push(Rule::new(target.clone(), &[FALLBACK_DOWN]));
                    continue;
                }
            }
            rules.push(Rule {
                pattern: pattern.clone(),
                selectors: parse_selectors(pattern, selectors)?,
            });
        }
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True if any rule uses `_UP` selectors or `*_UP`
    pub fn has_keyup(&self) -> bool {
        self.rules.iter().any(Rule::has_keyup)
    }
}

fn parse_selectors(pattern: &str, value: &Value) -> Result<Vec<Selector>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(vec![Selector::parse(s)]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(Selector::parse).ok_or_else(|| {
                    Error::RuleSyntax(format!(
                        "selector for '{}' must be a string, got {}",
                        pattern, item
                    ))
                })
            })
            .collect(),
        other => Err(Error::RuleSyntax(format!(
            "selectors for '{}' must be a string or a list, got {}",
            pattern, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parsing() {
        assert_eq!(Selector::parse("*"), Selector::FallbackDown);
        assert_eq!(Selector::parse("*_UP"), Selector::FallbackUp);
        assert_eq!(Selector::parse("Enter_UP"), Selector::Up("Enter".to_string()));
        assert_eq!(Selector::parse("Numpad*_UP"), Selector::Up("Numpad*".to_string()));
        assert_eq!(Selector::parse("Enter"), Selector::Down("Enter".to_string()));
    }

    #[test]
    fn test_rule_order_is_preserved() {
        let text = r#"{"map": {"z.wav": ["Enter"], "a.wav": "Tab", "m.wav": ["*"]}}"#;
        let rules = RuleSet::from_json_str(text).unwrap();
        let patterns: Vec<_> = rules.rules.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["z.wav", "a.wav", "m.wav"]);
        assert_eq!(rules.rules[1].selectors, vec![Selector::Down("Tab".to_string())]);
    }

    #[test]
    fn test_bare_map_and_legacy_fallback() {
        let text = r#"{"1.wav": ["Enter"], "fallback": "f.wav"}"#;
        let rules = RuleSet::from_json_str(text).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.rules[1], Rule::new("f.wav", &["*"]));
    }

    #[test]
    fn test_relaxed_syntax() {
        let text = "{\n // keys\n \"map\": {\"1.wav\": [\"Enter\",],},\n}";
        let rules = RuleSet::from_json_str(text).unwrap();
        assert_eq!(rules.rules[0], Rule::new("1.wav", &["Enter"]));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(
            RuleSet::from_json_str("{\"map\": [").unwrap_err(),
            Error::RuleSyntax(_)
        ));
        assert!(matches!(
            RuleSet::from_json_str("[1, 2]").unwrap_err(),
            Error::RuleSyntax(_)
        ));
        assert!(matches!(
            RuleSet::from_json_str(r#"{"map": {"1.wav": [1]}}"#).unwrap_err(),
            Error::RuleSyntax(_)
        ));
        assert!(matches!(
            RuleSet::from_json_str(r#"{"map": {"1.wav": {"a": 1}}}"#).unwrap_err(),
            Error::RuleSyntax(_)
        ));
    }

    #[test]
    fn test_has_keyup() {
        let rules = RuleSet::new(vec![Rule::new("a.wav", &["Enter"])]);
        assert!(!rules.has_keyup());
        let rules = RuleSet::new(vec![Rule::new("a.wav", &["*_UP"])]);
        assert!(rules.has_keyup());
    }
}
