//! `{{name}}` placeholders in snippet bodies
//!
//! Scanning is a single left-to-right pass with two states: literal text and
//! inside a placeholder. `{{` opens a placeholder, the first `}` ends the name,
//! and that `}` must be followed by another `}`. A `{` inside a placeholder is
//! part of the name (no nesting). An opener whose name is empty, or whose first
//! `}` is not doubled, is literal text; so is an unterminated `{{`.

use std::collections::HashMap;

const OPEN: &[u8] = b"{{";
const CLOSE: &[u8] = b"}}";

/// A piece of a tokenized body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Placeholder {
        /// The full `{{ ... }}` span as written
        raw: &'a str,
        /// The text between the braces, untrimmed
        name: &'a str,
    },
}

impl<'a> Segment<'a> {
    /// Trimmed placeholder name, `None` for literals
    pub fn variable_name(&self) -> Option<&'a str> {
        match self {
            Segment::Placeholder { name, .. } => Some(name.trim()),
            Segment::Literal(_) => None,
        }
    }
}

enum State {
    Literal,
    /// Inside a placeholder whose `{{` starts at the given byte offset
    Placeholder(usize),
}

/// Iterator over the segments of a body. Concatenating every segment's text
/// reproduces the input exactly.
pub struct Segments<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Segments<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Find the next well-formed placeholder at or after `from`.
    /// Returns (start, name_end) byte offsets; the span ends at name_end + 2.
    fn next_placeholder(&self, from: usize) -> Option<(usize, usize)> {
        let bytes = self.src.as_bytes();
        let mut state = State::Literal;
        let mut i = from;

        while i < bytes.len() {
            match state {
                State::Literal => {
                    if bytes[i..].starts_with(OPEN) {
                        state = State::Placeholder(i);
                        i += OPEN.len();
                    } else {
                        i += 1;
                    }
                }
                State::Placeholder(start) => {
                    if bytes[i] != b'}' {
                        i += 1;
                        continue;
                    }
                    let name_start = start + OPEN.len();
                    if i > name_start && bytes[i..].starts_with(CLOSE) {
                        return Some((start, i));
                    }
                    // Any opener between `start` and `i` would stop at this
                    // same `}`, so scanning resumes here.
                    state = State::Literal;
                    if i == name_start {
                        i = start + 1;
                    }
                }
            }
        }
        // Unterminated `{{`: literal to the end.
        None
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.src.len() {
            return None;
        }
        match self.next_placeholder(self.pos) {
            Some((start, _)) if start > self.pos => {
                let literal = &self.src[self.pos..start];
                self.pos = start;
                Some(Segment::Literal(literal))
            }
            Some((start, name_end)) => {
                let end = name_end + CLOSE.len();
                self.pos = end;
                Some(Segment::Placeholder {
                    raw: &self.src[start..end],
                    name: &self.src[start + OPEN.len()..name_end],
                })
            }
            None => {
                let literal = &self.src[self.pos..];
                self.pos = self.src.len();
                Some(Segment::Literal(literal))
            }
        }
    }
}

/// Tokenize a body into literal and placeholder segments.
pub fn segments(body: &str) -> Segments<'_> {
    Segments::new(body)
}

/// Distinct trimmed variable names in order of first occurrence.
/// Placeholders whose name is blank after trimming are skipped.
pub fn extract_variables(body: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in segments(body).filter_map(|s| s.variable_name()) {
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Replace each placeholder whose trimmed name is in `values`; unresolved
/// placeholders are kept verbatim.
pub fn substitute_variables(body: &str, values: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(body.len());
    for segment in segments(body) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder { raw, name } => match values.get(name.trim()) {
                Some(value) => out.push_str(value),
                None => out.push_str(raw),
            },
        }
    }
    out
}

/// True iff at least one well-formed placeholder exists.
pub fn has_variables(body: &str) -> bool {
    segments(body).any(|s| matches!(s, Segment::Placeholder { .. }))
}
