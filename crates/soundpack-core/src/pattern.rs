//! Pattern matching for file and key selectors.
//!
//! A pattern is classified once, when it is compiled:
//!
//! - brace ranges such as `2{0-3}.wav` expand into one glob per number
//! - strings without metacharacters match a whole candidate, ignoring case
//! - anything else is a case-insensitive regex searched within the candidate,
//!   or a case-insensitive glob when it does not compile as a regex
//!
//! Glob users who write `*.wav` never hit a regex error; the failed compile is
//! just the branch that selects [`Pattern::Glob`].

use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

/// Characters that turn a plain name into a regex/glob pattern.
///
/// `.` is deliberately absent so `1.wav` stays an exact filename.
const METACHARACTERS: &[char] = &[
    '*', '?', '[', ']', '(', ')', '{', '}', '|', '^', '$', '+', '\\',
];

/// Upper bound on brace expansions for a single pattern
pub const MAX_BRACE_EXPANSIONS: usize = 10_000;

fn brace_range() -> &'static Regex {
    static BRACE_RANGE: OnceLock<Regex> = OnceLock::new();
    BRACE_RANGE.get_or_init(|| Regex::new(r"\{(\d+)-(\d+)\}").expect("valid brace regex"))
}

/// How a pattern was interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Exact,
    Braced,
    Regex,
    Glob,
}

/// A compiled file or key pattern
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Whole-string equality (lowercased)
    Exact(String),
    /// Expanded brace ranges, each matched as an anchored glob
    Braced(Vec<Regex>),
    /// Case-insensitive regex with search semantics
    Regex(Regex),
    /// Case-insensitive anchored glob
    Glob(Regex),
}

impl Pattern {
    /// Compile a raw pattern string.
    ///
    /// Never fails: a pattern that is not a valid regex becomes a glob.
    pub fn compile(raw: &str) -> Self {
        if brace_range().is_match(raw) {
            let expanded = expand_braces(raw);
            log::debug!("Pattern '{}' expands to {} globs", raw, expanded.len());
            return Pattern::Braced(expanded.iter().filter_map(|p| glob_regex(p)).collect());
        }

        if !raw.contains(METACHARACTERS) {
            return Pattern::Exact(raw.to_lowercase());
        }

        match RegexBuilder::new(raw).case_insensitive(true).build() {
            Ok(regex) => Pattern::Regex(regex),
            Err(e) => {
                log::debug!("Pattern '{}' is not a regex ({}), using glob", raw, e);
                match glob_regex(raw) {
                    Some(glob) => Pattern::Glob(glob),
                    None => Pattern::Exact(raw.to_lowercase()),
                }
            }
        }
    }

    /// Which interpretation was chosen
    pub fn kind(&self) -> PatternKind {
        match self {
            Pattern::Exact(_) => PatternKind::Exact,
            Pattern::Braced(_) => PatternKind::Braced,
            Pattern::Regex(_) => PatternKind::Regex,
            Pattern::Glob(_) => PatternKind::Glob,
        }
    }

    /// Test a single candidate
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Pattern::Exact(name) => text.to_lowercase() == *name,
            Pattern::Braced(globs) => globs.iter().any(|g| g.is_match(text)),
            Pattern::Regex(regex) | Pattern::Glob(regex) => regex.is_match(text),
        }
    }

    /// Select the matching candidates, preserving pool order.
    ///
    /// Each candidate is returned at most once even if several brace
    /// expansions match it.
    pub fn select<'a, S: AsRef<str>>(&self, pool: &'a [S]) -> Vec<&'a S> {
        pool.iter().filter(|c| self.is_match(c.as_ref())).collect()
    }
}

/// Expand every `{a-b}` numeric range into literal alternatives.
///
/// Ranges given high-to-low are swapped. Several ranges expand as a cartesian
/// product, leftmost range outermost.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let mut expanded = vec![pattern.to_string()];
    loop {
        let mut next = Vec::with_capacity(expanded.len());
        let mut did_expand = false;
        for item in &expanded {
            let Some(caps) = brace_range().captures(item) else {
                next.push(item.clone());
                continue;
            };
            let Some(whole) = caps.get(0) else {
                next.push(item.clone());
                continue;
            };
            let (Ok(mut lo), Ok(mut hi)) = (caps[1].parse::<u64>(), caps[2].parse::<u64>()) else {
                next.push(item.clone());
                continue;
            };
            if lo > hi {
                std::mem::swap(&mut lo, &mut hi);
            }
            did_expand = true;
            for n in lo..=hi {
                if next.len() >= MAX_BRACE_EXPANSIONS {
                    log::warn!(
                        "Brace pattern '{}' exceeds {} expansions, truncating",
                        pattern,
                        MAX_BRACE_EXPANSIONS
                    );
                    break;
                }
                next.push(format!("{}{}{}", &item[..whole.start()], n, &item[whole.end()..]));
            }
        }
        expanded = next;
        if !did_expand {
            return expanded;
        }
    }
}

/// Compile a shell-style glob into an anchored, case-insensitive regex.
///
/// A glob whose translation is rejected (e.g. an inverted class range) is
/// matched literally instead.
fn glob_regex(glob: &str) -> Option<Regex> {
    Regex::new(&glob_to_regex_source(glob))
        .or_else(|_| Regex::new(&format!("(?is)^{}$", regex::escape(glob))))
        .ok()
}

fn glob_to_regex_source(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::from("(?is)^");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut j = i + 1;
                if j < chars.len() && chars[j] == '!' {
                    j += 1;
                }
                if j < chars.len() && chars[j] == ']' {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    out.push_str(r"\[");
                } else {
                    push_class(&mut out, &chars[i + 1..j]);
                    i = j;
                }
            }
            c => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            }
        }
        i += 1;
    }
    out.push('$');
    out
}

fn push_class(out: &mut String, body: &[char]) {
    let (negate, body) = match body.first() {
        Some('!') => (true, &body[1..]),
        _ => (false, body),
    };
    out.push('[');
    if negate {
        out.push('^');
    }
    for (idx, &c) in body.iter().enumerate() {
        let literal_dash = c == '-' && (idx == 0 || idx + 1 == body.len() || body[idx - 1] == '-');
        if matches!(c, '\\' | '[' | ']' | '^' | '&' | '~') || literal_dash {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(']');
}
