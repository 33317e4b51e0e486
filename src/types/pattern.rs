//! Wildcard patterns for the `like` operator.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::token::decode_escape;

/// One piece of a pattern: a literal chunk or a `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Wildcard,
}

/// A `like` pattern: literal chunks interleaved with wildcards.
///
/// Built from the raw (still-escaped) body of a string literal, where an
/// unescaped `*` is a wildcard and `\*` is a literal asterisk. Wildcards
/// match any run of characters, including the empty run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern(Vec<Segment>);

impl Pattern {
    /// Interpret the raw body of a string token. Adjacent literal chunks
    /// merge and runs of wildcards collapse, so matching never has to care.
    pub(crate) fn from_raw(raw: &str) -> Result<Self, String> {
        let mut segments: Vec<Segment> = Vec::new();
        let mut push_char = |segments: &mut Vec<Segment>, c: char| {
            if let Some(Segment::Literal(s)) = segments.last_mut() {
                s.push(c);
            } else {
                segments.push(Segment::Literal(c.to_string()));
            }
        };
        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' => {
                    if segments.last() != Some(&Segment::Wildcard) {
                        segments.push(Segment::Wildcard);
                    }
                }
                '\\' => push_char(&mut segments, decode_escape(&mut chars)?),
                c => push_char(&mut segments, c),
            }
        }
        Ok(Pattern(segments))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Greedy wildcard match over the whole input.
    pub fn matches(&self, input: &str) -> bool {
        // Flatten to single-char steps so the classic two-pointer walk with
        // star backtracking applies directly.
        enum Step {
            Char(char),
            Star,
        }
        let mut pattern = Vec::new();
        for seg in &self.0 {
            match seg {
                Segment::Literal(s) => pattern.extend(s.chars().map(Step::Char)),
                Segment::Wildcard => pattern.push(Step::Star),
            }
        }
        let text: Vec<char> = input.chars().collect();

        let (mut t, mut p) = (0usize, 0usize);
        let mut backtrack: Option<(usize, usize)> = None;
        while t < text.len() {
            match pattern.get(p) {
                Some(Step::Char(c)) if *c == text[t] => {
                    t += 1;
                    p += 1;
                }
                Some(Step::Star) => {
                    backtrack = Some((p, t));
                    p += 1;
                }
                _ => match backtrack {
                    // Let the most recent star absorb one more character.
                    Some((star_p, star_t)) => {
                        backtrack = Some((star_p, star_t + 1));
                        p = star_p + 1;
                        t = star_t + 1;
                    }
                    None => return false,
                },
            }
        }
        while let Some(Step::Star) = pattern.get(p) {
            p += 1;
        }
        p == pattern.len()
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for seg in &self.0 {
            match seg {
                Segment::Wildcard => write!(f, "*")?,
                Segment::Literal(s) => {
                    for c in s.chars() {
                        match c {
                            '*' => write!(f, "\\*")?,
                            '"' => write!(f, "\\\"")?,
                            '\\' => write!(f, "\\\\")?,
                            '\n' => write!(f, "\\n")?,
                            '\r' => write!(f, "\\r")?,
                            '\t' => write!(f, "\\t")?,
                            '\0' => write!(f, "\\0")?,
                            c => write!(f, "{c}")?,
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
