//! Tokenizer for the Cedar policy grammar.
//!
//! A single forward pass materializes every token up front; the parser then
//! consumes the stream with one-token lookahead. Each token carries its
//! source position so errors can point at the offending text.

use std::iter::Peekable;
use std::str::Chars;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ParseError;

/// Source location: 0-based byte offset, 1-based line and column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident,
    Int,
    String,
    Punct,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Raw source text. For string tokens this includes the quotes, with
    /// escapes still in place so the pattern constructor can tell `\*`
    /// from a bare `*`.
    pub text: String,
    pub pos: Position,
}

impl Token {
    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Ident
    }

    pub fn is_int(&self) -> bool {
        self.kind == TokenKind::Int
    }

    pub fn is_string(&self) -> bool {
        self.kind == TokenKind::String
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// The body of a string token, quotes stripped, escapes untouched.
    pub fn raw_string_body(&self) -> &str {
        &self.text[1..self.text.len() - 1]
    }

    /// Decode a string token into its value. `\*` decodes to a literal `*`.
    pub fn string_value(&self) -> Result<String, String> {
        let mut out = String::new();
        let mut chars = self.raw_string_body().chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\\' {
                out.push(decode_escape(&mut chars)?);
            } else {
                out.push(c);
            }
        }
        Ok(out)
    }

    /// Decode an integer token. The grammar keeps unary minus out of the
    /// token, so the text is always a bare digit run.
    pub fn int_value(&self) -> Result<i64, String> {
        self.text
            .parse::<i64>()
            .map_err(|_| format!("invalid integer literal `{}`", self.text))
    }
}

/// Decode one escape sequence, positioned just after the backslash.
///
/// `\*` is accepted here and yields a literal `*`; the pattern constructor
/// never routes `\*` through this function, so wildcards stay distinct.
pub(crate) fn decode_escape(chars: &mut Peekable<Chars<'_>>) -> Result<char, String> {
    match chars.next() {
        Some('n') => Ok('\n'),
        Some('t') => Ok('\t'),
        Some('r') => Ok('\r'),
        Some('"') => Ok('"'),
        Some('\'') => Ok('\''),
        Some('\\') => Ok('\\'),
        Some('0') => Ok('\0'),
        Some('*') => Ok('*'),
        Some('u') => {
            if chars.next() != Some('{') {
                return Err("bad unicode escape".to_string());
            }
            let mut hex = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    return u32::from_str_radix(&hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| "bad unicode escape".to_string());
                }
                hex.push(c);
                if hex.len() > 6 {
                    return Err("bad unicode escape".to_string());
                }
            }
            Err("bad unicode escape".to_string())
        }
        Some(c) => Err(format!("bad char escape `\\{c}`")),
        None => Err("bad char escape".to_string()),
    }
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    Tokenizer::new(input).run()
}

struct Tokenizer<'a> {
    chars: Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
    line: usize,
    column: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Tokenizer {
            chars: src.char_indices().peekable(),
            src,
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn position(&mut self) -> Position {
        let offset = self
            .chars
            .peek()
            .map(|&(i, _)| i)
            .unwrap_or(self.src.len());
        Position {
            offset,
            line: self.line,
            column: self.column,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let pos = self.position();
            let Some((start, c)) = self.bump() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    text: String::new(),
                    pos,
                });
                return Ok(tokens);
            };
            let token = match c {
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let end = self.scan_while(|c| c.is_ascii_alphanumeric() || c == '_');
                    Token {
                        kind: TokenKind::Ident,
                        text: self.src[start..end].to_string(),
                        pos,
                    }
                }
                c if c.is_ascii_digit() => {
                    let end = self.scan_while(|c| c.is_ascii_digit());
                    Token {
                        kind: TokenKind::Int,
                        text: self.src[start..end].to_string(),
                        pos,
                    }
                }
                '"' => self.scan_string(start, pos)?,
                _ => {
                    let text = self.scan_punct(c, pos)?;
                    Token {
                        kind: TokenKind::Punct,
                        text,
                        pos,
                    }
                }
            };
            tokens.push(token);
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    // Only a `//` line comment counts as trivia.
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if lookahead.peek().map(|&(_, c)| c) != Some('/') {
                        return;
                    }
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    fn scan_while(&mut self, keep: impl Fn(char) -> bool) -> usize {
        while let Some(c) = self.peek_char() {
            if !keep(c) {
                break;
            }
            self.bump();
        }
        self.chars
            .peek()
            .map(|&(i, _)| i)
            .unwrap_or(self.src.len())
    }

    fn scan_string(&mut self, start: usize, pos: Position) -> Result<Token, ParseError> {
        loop {
            match self.bump() {
                Some((i, '"')) => {
                    return Ok(Token {
                        kind: TokenKind::String,
                        text: self.src[start..=i].to_string(),
                        pos,
                    });
                }
                Some((_, '\\')) => {
                    // Keep the escape raw; just make sure an escaped quote
                    // does not terminate the literal.
                    self.bump();
                }
                Some(_) => {}
                None => {
                    return Err(ParseError::new(pos, &self.src[start..], "literal not terminated"));
                }
            }
        }
    }

    fn scan_punct(&mut self, first: char, pos: Position) -> Result<String, ParseError> {
        let pair = |t: &mut Self, two: &str| {
            t.bump();
            two.to_string()
        };
        match first {
            ':' if self.peek_char() == Some(':') => Ok(pair(self, "::")),
            '=' if self.peek_char() == Some('=') => Ok(pair(self, "==")),
            '!' if self.peek_char() == Some('=') => Ok(pair(self, "!=")),
            '<' if self.peek_char() == Some('=') => Ok(pair(self, "<=")),
            '>' if self.peek_char() == Some('=') => Ok(pair(self, ">=")),
            '&' if self.peek_char() == Some('&') => Ok(pair(self, "&&")),
            '|' if self.peek_char() == Some('|') => Ok(pair(self, "||")),
            '@' | '(' | ')' | '{' | '}' | '[' | ']' | ',' | ';' | ':' | '.' | '=' | '<' | '>'
            | '!' | '+' | '-' | '*' | '?' => Ok(first.to_string()),
            _ => Err(ParseError::new(pos, first.to_string(), "invalid character")),
        }
    }
}
