//! Relaxed JSON reading.
//!
//! Rule files are hand-written, so they may carry `//` and `/* */` comments
//! and trailing commas. Both are removed outside string literals before the
//! text is handed to `serde_json`.

use crate::error::Result;
use serde::de::DeserializeOwned;

/// Parse relaxed JSON text into any deserializable type
pub fn from_str<T: DeserializeOwned>(text: &str) -> Result<T> {
    let cleaned = strip_trailing_commas(&strip_comments(text));
    Ok(serde_json::from_str(&cleaned)?)
}

/// Remove line and block comments, leaving string contents untouched
pub fn strip_comments(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut scanner = StringScanner::default();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if scanner.in_string() || ch == '"' || ch == '\'' {
            scanner.feed(ch);
            out.push(ch);
            i += 1;
            continue;
        }

        match (ch, chars.get(i + 1)) {
            ('/', Some('/')) => {
                i += 2;
                while i < chars.len() && chars[i] != '\n' && chars[i] != '\r' {
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
            }
            _ => {
                out.push(ch);
                i += 1;
            }
        }
    }
    out
}

/// Remove commas that directly precede `}` or `]`
pub fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut scanner = StringScanner::default();

    for (i, &ch) in chars.iter().enumerate() {
        if scanner.in_string() || ch == '"' || ch == '\'' {
            scanner.feed(ch);
            out.push(ch);
            continue;
        }
        if ch == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(ch);
    }
    out
}

/// Tracks whether the scan position is inside a string literal
#[derive(Default)]
struct StringScanner {
    quote: Option<char>,
    escape: bool,
}

impl StringScanner {
    fn in_string(&self) -> bool {
        self.quote.is_some()
    }

    fn feed(&mut self, ch: char) {
        match self.quote {
            None => self.quote = Some(ch),
            Some(_) if self.escape => self.escape = false,
            Some(_) if ch == '\\' => self.escape = true,
            Some(q) if ch == q => self.quote = None,
            Some(_) => {}
        }
    }
}
