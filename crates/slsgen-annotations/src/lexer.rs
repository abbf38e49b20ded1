//! Tokenizer for TypeScript controller and module sources.
//!
//! Produces just enough structure for decorator and import recovery:
//! identifiers, string/template/regex/number literals and punctuation,
//! each with its byte span and whether a line break preceded it.
//! Comments and whitespace are dropped.

use thiserror::Error;

/// Tokenization failure (unterminated literal or comment).
#[derive(Debug, Clone, Error)]
#[error("line {line}: {message}")]
pub struct LexError {
    pub line: usize,
    pub message: String,
}

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Str,
    Template,
    Number,
    Regex,
    Punct,
}

/// A token with its byte span in the source.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    /// 1-based line of the first byte.
    pub line: usize,
    /// A line break separates this token from the previous one.
    pub newline_before: bool,
}

impl Token {
    /// The token's source text.
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.start..self.end]
    }

    /// True for a punctuation token with exactly this text.
    pub fn is_punct(&self, src: &str, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text(src) == p
    }

    /// True for an identifier token with exactly this text.
    pub fn is_ident(&self, src: &str, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(src) == name
    }
}

/// Keywords after which a `/` starts a regular expression literal.
const REGEX_PREFIX_KEYWORDS: &[&str] = &[
    "return", "typeof", "case", "do", "else", "in", "of", "new", "delete", "void", "throw",
    "instanceof", "yield", "await",
];

/// Multi-character punctuators, longest first.
const MULTI_PUNCT: &[&str] = &[
    "...", "===", "!==", "=>", "==", "!=", "&&", "||", "??", "?.", "++", "--", "**",
];

/// Tokenize a TypeScript source string.
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer {
        src,
        bytes: src.as_bytes(),
        pos: 0,
        line: 1,
        newline: false,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    newline: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn run(&mut self) -> Result<(), LexError> {
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            match b {
                b'\n' => {
                    self.line += 1;
                    self.newline = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                b'/' if self.regex_allowed() => self.lex_regex()?,
                b'\'' | b'"' => self.lex_string(b)?,
                b'`' => self.lex_template()?,
                b'0'..=b'9' => self.lex_number(),
                b'.' if matches!(self.peek(1), Some(b'0'..=b'9')) => self.lex_number(),
                _ if is_ident_start(b) => self.lex_ident(),
                _ => self.lex_punct(),
            }
        }
        Ok(())
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn push(&mut self, kind: TokenKind, start: usize, line: usize) {
        self.tokens.push(Token {
            kind,
            start,
            end: self.pos,
            line,
            newline_before: self.newline,
        });
        self.newline = false;
    }

    fn error(&self, line: usize, message: &str) -> LexError {
        LexError {
            line,
            message: message.to_string(),
        }
    }

    fn skip_line_comment(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let line = self.line;
        self.pos += 2;
        while self.pos + 1 < self.bytes.len() {
            if self.bytes[self.pos] == b'*' && self.bytes[self.pos + 1] == b'/' {
                self.pos += 2;
                return Ok(());
            }
            if self.bytes[self.pos] == b'\n' {
                self.line += 1;
                self.newline = true;
            }
            self.pos += 1;
        }
        Err(self.error(line, "unterminated block comment"))
    }

    /// Decide between division and a regex literal from the previous token.
    fn regex_allowed(&self) -> bool {
        let Some(prev) = self.tokens.last() else {
            return true;
        };
        let text = prev.text(self.src);
        match prev.kind {
            TokenKind::Punct => !matches!(text, ")" | "]" | "}"),
            TokenKind::Ident => REGEX_PREFIX_KEYWORDS.contains(&text),
            _ => false,
        }
    }

    fn lex_regex(&mut self) -> Result<(), LexError> {
        let (start, line) = (self.pos, self.line);
        self.pos += 1;
        let mut in_class = false;
        loop {
            match self.bytes.get(self.pos) {
                None | Some(b'\n') => return Err(self.error(line, "unterminated regex literal")),
                Some(b'\\') => self.pos += 2,
                Some(b'[') => {
                    in_class = true;
                    self.pos += 1;
                }
                Some(b']') => {
                    in_class = false;
                    self.pos += 1;
                }
                Some(b'/') if !in_class => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        while self.pos < self.bytes.len() && is_ident_part(self.bytes[self.pos]) {
            self.pos += 1;
        }
        self.push(TokenKind::Regex, start, line);
        Ok(())
    }

    fn lex_string(&mut self, quote: u8) -> Result<(), LexError> {
        let (start, line) = (self.pos, self.line);
        self.pos += 1;
        loop {
            match self.bytes.get(self.pos) {
                None | Some(b'\n') => return Err(self.error(line, "unterminated string literal")),
                Some(b'\\') => {
                    if self.peek(1) == Some(b'\n') {
                        self.line += 1;
                    }
                    self.pos += 2;
                }
                Some(&b) if b == quote => {
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        self.push(TokenKind::Str, start, line);
        Ok(())
    }

    fn lex_template(&mut self) -> Result<(), LexError> {
        let (start, line) = (self.pos, self.line);
        self.pos += 1;
        self.skip_template_body(line)?;
        self.push(TokenKind::Template, start, line);
        Ok(())
    }

    /// Skip to just past the closing backtick, including `${...}` holes.
    fn skip_template_body(&mut self, line: usize) -> Result<(), LexError> {
        loop {
            match self.bytes.get(self.pos) {
                None => return Err(self.error(line, "unterminated template literal")),
                Some(b'\\') => self.pos += 2,
                Some(b'`') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b'$') if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.skip_template_hole(line)?;
                }
                Some(b'\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn skip_template_hole(&mut self, line: usize) -> Result<(), LexError> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.bytes.get(self.pos) {
                None => return Err(self.error(line, "unterminated template expression")),
                Some(b'{') => {
                    depth += 1;
                    self.pos += 1;
                }
                Some(b'}') => {
                    depth -= 1;
                    self.pos += 1;
                }
                Some(b'`') => {
                    self.pos += 1;
                    self.skip_template_body(line)?;
                }
                Some(&q) if q == b'\'' || q == b'"' => {
                    self.pos += 1;
                    while let Some(&b) = self.bytes.get(self.pos) {
                        self.pos += if b == b'\\' { 2 } else { 1 };
                        if b == q {
                            break;
                        }
                    }
                }
                Some(b'\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
        Ok(())
    }

    fn lex_number(&mut self) {
        let (start, line) = (self.pos, self.line);
        let hex = self.bytes[self.pos] == b'0' && matches!(self.peek(1), Some(b'x' | b'X'));
        while let Some(&b) = self.bytes.get(self.pos) {
            let exponent_sign = (b == b'+' || b == b'-')
                && !hex
                && matches!(self.bytes[self.pos - 1], b'e' | b'E');
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.push(TokenKind::Number, start, line);
    }

    fn lex_ident(&mut self) {
        let (start, line) = (self.pos, self.line);
        self.pos += 1;
        while self.pos < self.bytes.len() && is_ident_part(self.bytes[self.pos]) {
            self.pos += 1;
        }
        self.push(TokenKind::Ident, start, line);
    }

    fn lex_punct(&mut self) {
        let (start, line) = (self.pos, self.line);
        let rest = &self.src[self.pos..];
        let len = MULTI_PUNCT
            .iter()
            .find(|p| rest.starts_with(**p))
            // `a?.5:b` is a conditional, not optional chaining.
            .filter(|p| **p != "?." || !matches!(self.peek(2), Some(b'0'..=b'9')))
            .map(|p| p.len())
            .unwrap_or_else(|| rest.chars().next().map(char::len_utf8).unwrap_or(1));
        self.pos += len;
        self.push(TokenKind::Punct, start, line);
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b == b'#' || b >= 0x80
}

fn is_ident_part(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}
