//! Persisted literal notation of the catalog
//!
//! The catalog is kept in version control as a hand-edited nested mapping:
//!
//! ```text
//! tooltips = {
//!     "fuse": {
//!         "In": "<b>Rated current</b> of the fuse link",
//!         "Un": "Rated voltage",
//!     },
//! }
//! ```
//!
//! Keys and help texts are quoted strings (double or single quotes, with
//! backslash escapes). Adjacent strings are concatenated, `#` starts a
//! comment, and a trailing comma is allowed after every entry. The writer
//! emits one field per line with a trailing comma so that diffs against
//! history stay readable.

use crate::catalog::Catalog;
use crate::{CatalogFormatError, Result};
use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::Chars;
use tracing::trace;

/// A loaded catalog plus the name its literal is bound to, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDocument {
    pub binding: Option<String>,
    pub catalog: Catalog,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    OpenBrace,
    CloseBrace,
    Colon,
    Comma,
    Equals,
    Semicolon,
    Str(String),
    Ident(String),
    /// Anything else (numbers, brackets, ...), kept for error messages
    Other(String),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::OpenBrace => "'{'".to_string(),
            Token::CloseBrace => "'}'".to_string(),
            Token::Colon => "':'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Equals => "'='".to_string(),
            Token::Semicolon => "';'".to_string(),
            Token::Str(s) => format!("string \"{s}\""),
            Token::Ident(s) => format!("identifier `{s}`"),
            Token::Other(s) => format!("`{s}`"),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while self.chars.peek().is_some_and(|&c| c != '\n') {
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn tokenize(mut self) -> Result<Vec<Spanned>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let (line, column) = (self.line, self.column);
            let Some(&c) = self.chars.peek() else {
                break;
            };
            let token = match c {
                '{' | '}' | ':' | ',' | '=' | ';' => {
                    self.bump();
                    match c {
                        '{' => Token::OpenBrace,
                        '}' => Token::CloseBrace,
                        ':' => Token::Colon,
                        ',' => Token::Comma,
                        '=' => Token::Equals,
                        _ => Token::Semicolon,
                    }
                }
                '"' | '\'' => Token::Str(self.string(line, column)?),
                c if c.is_alphabetic() || c == '_' => Token::Ident(self.word()),
                _ => Token::Other(self.word()),
            };
            tokens.push(Spanned {
                token,
                line,
                column,
            });
        }
        Ok(tokens)
    }

    fn string(&mut self, line: usize, column: usize) -> Result<String> {
        let quote = self.bump().unwrap_or('"');
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(CatalogFormatError::syntax(
                        line,
                        column,
                        "unterminated string",
                    ));
                }
                Some(c) if c == quote => return Ok(value),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(c @ ('\\' | '"' | '\'')) => value.push(c),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => {
                        return Err(CatalogFormatError::syntax(
                            line,
                            column,
                            "unterminated string",
                        ));
                    }
                },
                Some(c) => value.push(c),
            }
        }
    }

    /// Run of characters up to the next whitespace, delimiter or quote
    fn word(&mut self) -> String {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace()
                || matches!(c, '{' | '}' | ':' | ',' | '=' | ';' | '"' | '\'' | '#')
            {
                break;
            }
            word.push(c);
            self.bump();
        }
        word
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Position reported for errors at end of input
    end: (usize, usize),
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek().map(|s| &s.token)
    }

    fn next(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.pos).cloned();
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    fn unexpected(&self, expected: &str) -> CatalogFormatError {
        match self.peek() {
            Some(s) => CatalogFormatError::syntax(
                s.line,
                s.column,
                format!("expected {expected}, found {}", s.token.describe()),
            ),
            None => CatalogFormatError::syntax(
                self.end.0,
                self.end.1,
                format!("expected {expected}, found end of input"),
            ),
        }
    }

    fn expect(&mut self, token: &Token, expected: &str) -> Result<Spanned> {
        if self.peek_token() != Some(token) {
            return Err(self.unexpected(expected));
        }
        self.next().ok_or_else(|| self.unexpected(expected))
    }

    /// Quoted key, returned with its line
    fn key(&mut self, what: &str) -> Result<(String, usize)> {
        match self.peek().cloned() {
            Some(Spanned {
                token: Token::Str(key),
                line,
                ..
            }) => {
                self.pos += 1;
                Ok((key, line))
            }
            Some(Spanned {
                token: Token::Ident(name),
                line,
                ..
            }) => Err(CatalogFormatError::malformed(
                name,
                line,
                format!("{what} must be a quoted string"),
            )),
            _ => Err(self.unexpected(what)),
        }
    }

    /// After an entry: consume a separating comma, or stop at the closing brace.
    /// Returns `true` when the enclosing block is complete.
    fn separator(&mut self) -> Result<bool> {
        match self.peek_token() {
            Some(Token::Comma) => {
                self.pos += 1;
                Ok(self.peek_token() == Some(&Token::CloseBrace))
            }
            Some(Token::CloseBrace) => Ok(true),
            _ => Err(self.unexpected("',' or '}'")),
        }
    }

    fn document(&mut self) -> Result<CatalogDocument> {
        let mut binding = None;
        let bound = matches!(
            self.tokens.get(self.pos + 1).map(|s| &s.token),
            Some(Token::Equals)
        );
        if let Some(Token::Ident(name)) = self.peek_token().filter(|_| bound) {
            binding = Some(name.clone());
            self.pos += 2;
        }

        self.expect(&Token::OpenBrace, "'{' opening the catalog")?;
        let mut catalog = Catalog::new();

        if self.peek_token() != Some(&Token::CloseBrace) {
            loop {
                self.type_block(&mut catalog)?;
                if self.separator()? {
                    break;
                }
            }
        }
        self.expect(&Token::CloseBrace, "'}' closing the catalog")?;

        if self.peek_token() == Some(&Token::Semicolon) {
            self.pos += 1;
        }
        if self.peek().is_some() {
            return Err(self.unexpected("end of input after the catalog"));
        }

        Ok(CatalogDocument { binding, catalog })
    }

    fn type_block(&mut self, catalog: &mut Catalog) -> Result<()> {
        let (type_code, line) = self.key("element type code")?;
        if catalog.contains_type(&type_code) {
            return Err(CatalogFormatError::DuplicateType { type_code, line });
        }
        self.expect(&Token::Colon, "':' after element type code")?;

        if self.peek_token() != Some(&Token::OpenBrace) {
            let found = self
                .peek()
                .map_or_else(|| "end of input".to_string(), |s| s.token.describe());
            return Err(CatalogFormatError::malformed(
                type_code,
                line,
                format!("expected '{{' opening the field block, found {found}"),
            ));
        }
        self.pos += 1;
        catalog.insert_type(type_code.clone());

        if self.peek_token() != Some(&Token::CloseBrace) {
            loop {
                self.field_entry(catalog, &type_code)?;
                if self.separator()? {
                    break;
                }
            }
        }
        self.expect(&Token::CloseBrace, "'}' closing the field block")?;
        trace!("Parsed element type {}", type_code);
        Ok(())
    }

    fn field_entry(&mut self, catalog: &mut Catalog, type_code: &str) -> Result<()> {
        let (field_code, line) = self.key("field code")?;
        if catalog.contains_field(type_code, &field_code) {
            return Err(CatalogFormatError::DuplicateField {
                type_code: type_code.to_string(),
                field_code,
                line,
            });
        }
        self.expect(&Token::Colon, "':' after field code")?;

        let mut text = match self.peek_token() {
            Some(Token::Str(_)) => String::new(),
            Some(Token::OpenBrace) => {
                return Err(CatalogFormatError::malformed(
                    field_code,
                    line,
                    "nested mapping where help text was expected",
                ));
            }
            Some(other) => {
                let reason = format!("expected quoted help text, found {}", other.describe());
                return Err(CatalogFormatError::malformed(field_code, line, reason));
            }
            None => return Err(self.unexpected("quoted help text")),
        };
        while let Some(Token::Str(part)) = self.peek_token() {
            text.push_str(part);
            self.pos += 1;
        }

        catalog.insert(type_code, field_code, text);
        Ok(())
    }
}

/// Parse a catalog literal, keeping the binding name if present
///
/// # Errors
///
/// Returns a [`CatalogFormatError`] for syntax errors, duplicate keys and
/// entries of the wrong shape.
pub fn parse_literal(source: &str) -> Result<CatalogDocument> {
    let lexer = Lexer::new(source);
    let tokens = lexer.tokenize()?;
    let end = end_position(source);
    let mut parser = Parser {
        tokens,
        pos: 0,
        end,
    };
    parser.document()
}

fn end_position(source: &str) -> (usize, usize) {
    let line = source.matches('\n').count() + 1;
    let column = source.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

/// Writer for the persisted literal notation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralWriter {
    /// Name the literal is bound to (`tooltips = {`)
    pub binding: Option<String>,
    /// Spaces per nesting level
    pub indent: usize,
}

impl Default for LiteralWriter {
    fn default() -> Self {
        Self {
            binding: None,
            indent: 4,
        }
    }
}

impl LiteralWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binding(mut self, binding: impl Into<String>) -> Self {
        self.binding = Some(binding.into());
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Render the catalog in its current order
    pub fn write(&self, catalog: &Catalog) -> String {
        let pad = " ".repeat(self.indent);
        let mut out = String::new();

        if let Some(binding) = &self.binding {
            let _ = write!(out, "{binding} = ");
        }
        out.push_str("{\n");
        for (type_code, fields) in catalog.iter() {
            let _ = writeln!(out, "{pad}{}: {{", quote(type_code));
            for (field_code, text) in fields {
                let _ = writeln!(out, "{pad}{pad}{}: {},", quote(field_code), quote(text));
            }
            let _ = writeln!(out, "{pad}}},");
        }
        out.push_str("}\n");
        out
    }
}

/// Double-quoted string with the escapes the parser understands
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
