//! Regex scanning with a guarded leading edge
//!
//! The `regex` crate has no look-behind, so recognizers that must not start
//! in the middle of a word check the preceding character by hand. Trailing
//! edges are written into the patterns themselves as a consumed delimiter
//! (`(?:[^\p{L}\p{N}]|$)`), which keeps backtracking behaviour intact.

use regex::{Captures, Regex};

/// Constraint on the character right before a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leading {
    Any,
    /// No letter or digit may precede the match
    NotAlnum,
    /// No digit may precede the match
    NotDigit,
}

#[derive(Debug, Clone, Copy)]
pub struct Recognizer {
    regex: &'static Regex,
    leading: Leading,
}

impl Recognizer {
    pub const fn new(regex: &'static Regex, leading: Leading) -> Self {
        Self { regex, leading }
    }

    /// All non-overlapping matches starting at or after `from`.
    pub fn captures_from<'t>(&self, text: &'t str, from: usize) -> Vec<Captures<'t>> {
        let mut found = Vec::new();
        let mut pos = align(text, from);

        while pos <= text.len() {
            let Some(caps) = self.regex.captures_at(text, pos) else {
                break;
            };
            let Some(whole) = caps.get(0) else {
                break;
            };

            if self.leading_ok(text, whole.start()) {
                pos = if whole.end() > whole.start() {
                    whole.end()
                } else {
                    next_boundary(text, whole.end())
                };
                found.push(caps);
            } else {
                pos = next_boundary(text, whole.start());
            }
        }

        found
    }

    fn leading_ok(&self, text: &str, start: usize) -> bool {
        let previous = text[..start].chars().next_back();
        match self.leading {
            Leading::Any => true,
            Leading::NotAlnum => previous.is_none_or(|c| !c.is_alphanumeric()),
            Leading::NotDigit => previous.is_none_or(|c| !c.is_ascii_digit()),
        }
    }
}

/// Clamp `index` into `text` and move it forward onto a char boundary.
pub fn align(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Boundary of the character after `index`; past the end when at the end.
fn next_boundary(text: &str, index: usize) -> usize {
    match text[index..].chars().next() {
        Some(c) => index + c.len_utf8(),
        None => text.len() + 1,
    }
}

/// Parse a captured group as a number.
pub fn group_number(caps: &Captures<'_>, group: usize) -> Option<i32> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}
