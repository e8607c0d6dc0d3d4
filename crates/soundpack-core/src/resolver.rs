//! Ordered, consuming rule evaluation.
//!
//! Rules run in declaration order against a shrinking pool of files. A file
//! matched by one rule is gone for every later rule and for the default
//! allocator.

use crate::assignment::{Assignment, Direction, Provenance};
use crate::keys::KeyRegistry;
use crate::pattern::Pattern;
use crate::rules::{Rule, RuleSet, Selector};
use crate::sound::{SoundFile, VirtualSound};

/// Output of the rule pass
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Slots filled by rules, plus fallback designations
    pub assignment: Assignment,
    /// Files no rule matched, in original order
    pub residual: Vec<SoundFile>,
    /// `(file, pattern)` for every consumed file, in consumption order
    pub consumed: Vec<(String, String)>,
}

/// Apply every rule in order to `pool`.
pub fn resolve_rules(rules: &RuleSet, pool: Vec<SoundFile>, registry: &KeyRegistry) -> Resolution {
    let initial = Resolution {
        residual: pool,
        ..Default::default()
    };
    rules
        .rules
        .iter()
        .fold(initial, |state, rule| apply_rule(state, rule, registry))
}

fn apply_rule(mut state: Resolution, rule: &Rule, registry: &KeyRegistry) -> Resolution {
    let pattern = Pattern::compile(&rule.pattern);
    let (matched, rest): (Vec<SoundFile>, Vec<SoundFile>) = std::mem::take(&mut state.residual)
        .into_iter()
        .partition(|f| pattern.is_match(&f.file));
    state.residual = rest;

    if matched.is_empty() {
        log::debug!("Rule '{}' matched no remaining files", rule.pattern);
        return state;
    }
    log::debug!(
        "Rule '{}' ({:?}) consumed {} file(s)",
        rule.pattern,
        pattern.kind(),
        matched.len()
    );

    let sound = match matched.as_slice() {
        [single] => VirtualSound::single(single),
        _ => VirtualSound {
            name: rule.pattern.clone(),
            entries: matched.iter().map(SoundFile::entry).collect(),
        },
    };
    let name = state.assignment.register(sound);

    for selector in &rule.selectors {
        let (selector_pattern, direction) = match selector {
            Selector::FallbackDown => {
                if state.assignment.fallback_down.is_none() {
                    state.assignment.fallback_down = Some(name.clone());
                }
                continue;
            }
            Selector::FallbackUp => {
                if state.assignment.fallback_up.is_none() {
                    state.assignment.fallback_up = Some(name.clone());
                }
                continue;
            }
            Selector::Down(p) => (p, Direction::Down),
            Selector::Up(p) => (p, Direction::Up),
        };

        let keys = resolve_keys(selector_pattern, registry);
        if keys.is_empty() {
            log::debug!("Selector '{}' matches no known keys", selector_pattern);
        }
        for key in keys {
            if !state.assignment.claim(key, direction, &name, Provenance::Rule) {
                log::debug!(
                    "Key {} ({}) already claimed by an earlier rule, skipping '{}'",
                    key,
                    direction,
                    rule.pattern
                );
            }
        }
    }

    state
        .consumed
        .extend(matched.into_iter().map(|f| (f.file, rule.pattern.clone())));
    state
}

/// Expand a key selector (without `_UP`) into registry key names, in registry order.
pub fn resolve_keys(selector: &str, registry: &KeyRegistry) -> Vec<&'static str> {
    if let Some(key) = registry.get(selector) {
        return vec![key.name];
    }
    let pattern = Pattern::compile(selector);
    registry.names().filter(|name| pattern.is_match(name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    fn files(names: &[&str]) -> Vec<SoundFile> {
        names.iter().map(|n| SoundFile::new(*n)).collect()
    }

    fn down(resolution: &Resolution, key: &str) -> Option<String> {
        resolution
            .assignment
            .get(key, Direction::Down)
            .map(|s| s.sound.clone())
    }

    #[test]
    fn test_resolve_keys() {
        let registry = KeyRegistry::standard();
        assert_eq!(resolve_keys("enter", &registry), vec!["Enter"]);
        assert_eq!(resolve_keys("Enter", &registry), vec!["Enter"]);
        let numpad = resolve_keys("^Numpad[0-2]$", &registry);
        assert_eq!(numpad, vec!["Numpad0", "Numpad1", "Numpad2"]);
        assert!(resolve_keys("Hyper", &registry).is_empty());
    }

    #[test]
    fn test_files_are_consumed_once() {
        let registry = KeyRegistry::subset(&["Enter", "Tab", "Space"]);
        let rules = RuleSet::new(vec![
            Rule::new("*.wav", &["Enter"]),
            Rule::new("a.wav", &["Tab"]),
        ]);
        let res = resolve_rules(&rules, files(&["a.wav", "b.wav"]), &registry);

        assert_eq!(down(&res, "Enter"), Some("*.wav".to_string()));
        assert_eq!(down(&res, "Tab"), None);
        assert!(res.residual.is_empty());
        assert_eq!(res.consumed.len(), 2);
    }

    #[test]
    fn test_rule_order_decides_overlap() {
        let registry = KeyRegistry::subset(&["Enter", "Tab"]);
        let pool = files(&["1.wav", "2.wav"]);

        let first = RuleSet::new(vec![
            Rule::new("1.wav", &["Enter"]),
            Rule::new("{1-2}.wav", &["Tab"]),
        ]);
        let res = resolve_rules(&first, pool.clone(), &registry);
        assert_eq!(down(&res, "Enter"), Some("1.wav".to_string()));
        assert_eq!(down(&res, "Tab"), Some("2.wav".to_string()));

        let swapped = RuleSet::new(vec![
            Rule::new("{1-2}.wav", &["Tab"]),
            Rule::new("1.wav", &["Enter"]),
        ]);
        let res = resolve_rules(&swapped, pool, &registry);
        assert_eq!(down(&res, "Tab"), Some("{1-2}.wav".to_string()));
        assert_eq!(down(&res, "Enter"), None);
        let group = res.assignment.sound("{1-2}.wav").unwrap();
        assert!(group.is_random_group());
    }

    #[test]
    fn test_earlier_rule_keeps_key() {
        let registry = KeyRegistry::subset(&["Enter"]);
        let rules = RuleSet::new(vec![
            Rule::new("a.wav", &["Enter"]),
            Rule::new("b.wav", &["Enter"]),
        ]);
        let res = resolve_rules(&rules, files(&["a.wav", "b.wav"]), &registry);
        assert_eq!(down(&res, "Enter"), Some("a.wav".to_string()));
        // b.wav is still consumed even though it populated nothing
        assert!(res.residual.is_empty());
    }

    #[test]
    fn test_up_selectors_and_fallbacks() {
        let registry = KeyRegistry::subset(&["Enter", "Numpad0", "Numpad1"]);
        let rules = RuleSet::new(vec![
            Rule::new("1.wav", &["Enter", "*"]),
            Rule::new("{0-3}.wav", &["Numpad*_UP", "*_UP"]),
        ]);
        let pool = files(&["0.wav", "1.wav", "2.wav", "3.wav"]);
        let res = resolve_rules(&rules, pool, &registry);

        assert_eq!(res.assignment.fallback_down.as_deref(), Some("1.wav"));
        assert_eq!(res.assignment.fallback_up.as_deref(), Some("{0-3}.wav"));
        assert_eq!(
            res.assignment.get("Numpad0", Direction::Up).unwrap().sound,
            "{0-3}.wav"
        );
        assert!(res.assignment.get("Numpad0", Direction::Down).is_none());
        assert_eq!(res.assignment.sound("{0-3}.wav").unwrap().entries.len(), 3);
    }

    #[test]
    fn test_unmatched_rule_is_noop() {
        let registry = KeyRegistry::subset(&["Enter"]);
        let rules = RuleSet::new(vec![
            Rule::new("missing.wav", &["Enter", "*"]),
            Rule::new("a.wav", &["NoSuchKey", "*"]),
        ]);
        let res = resolve_rules(&rules, files(&["a.wav"]), &registry);
        assert!(res.assignment.get("Enter", Direction::Down).is_none());
        // Unknown key selector does not block fallback marking
        assert_eq!(res.assignment.fallback_down.as_deref(), Some("a.wav"));
    }
}
