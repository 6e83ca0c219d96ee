//! Tokenizer for the path string grammar.
//!
//! ```text
//! path      := operator? segment*
//! operator  := '^'+                      (only at position 0)
//! segment   := '.' ident  | '[' digits ']'
//! ident     := [A-Za-z_$][A-Za-z0-9_$]*
//! digits    := [0-9]+
//! ```
//!
//! The first segment omits the leading `.` when it is an identifier.

use std::sync::Arc;

use trellis_foundation::{Error, Result};

use crate::token::{is_ident_char, is_ident_start, Token};

/// Tokenizes a path string into a token sequence.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>> {
    Tokenizer::new(source).run()
}

/// Scanner over the path grammar.
struct Tokenizer<'src> {
    source: &'src str,
    position: usize,
    tokens: Vec<Token>,
}

impl<'src> Tokenizer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            position: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>> {
        if self.peek() == Some(b'^') {
            self.scan_parent_operator()?;
        }

        while let Some(b) = self.peek() {
            match b {
                b'.' => self.scan_dot_segment()?,
                b'[' => self.scan_index()?,
                b'^' => {
                    return Err(Error::syntax(
                        "parent operator is only valid at the start of a path",
                        self.position,
                    ));
                }
                b if is_ident_start(b) => self.scan_key()?,
                _ => {
                    return Err(Error::syntax(
                        format!("unexpected character {:?}", self.current_char()),
                        self.position,
                    ));
                }
            }
        }

        Ok(self.tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.position).copied()
    }

    fn previous(&self) -> Option<u8> {
        if self.position == 0 {
            return None;
        }
        self.source.as_bytes().get(self.position - 1).copied()
    }

    fn current_char(&self) -> char {
        self.source[self.position..].chars().next().unwrap_or('\0')
    }

    /// Scans the leading `^` run. Only called at position 0.
    fn scan_parent_operator(&mut self) -> Result<()> {
        while self.peek() == Some(b'^') {
            self.position += 1;
        }
        // An identifier must not follow the operator run directly
        if self.peek().is_some_and(is_ident_start) {
            return Err(Error::syntax(
                "expected '.' or '[' after parent operator",
                self.position,
            ));
        }
        self.tokens.push(Token::Parents(self.position));
        Ok(())
    }

    /// Scans a `.` followed by an identifier.
    fn scan_dot_segment(&mut self) -> Result<()> {
        if self.position + 1 == self.source.len() {
            return Err(Error::syntax("trailing dot at end of path", self.position));
        }
        self.position += 1;
        if !self.peek().is_some_and(is_ident_start) {
            return Err(Error::syntax(
                "expected identifier after '.'",
                self.position,
            ));
        }
        self.scan_ident();
        Ok(())
    }

    /// Scans a bare identifier. A bare identifier is only legal at the start
    /// of the path; anywhere else the previous character must have been `]`.
    fn scan_key(&mut self) -> Result<()> {
        if self.previous() == Some(b']') {
            return Err(Error::syntax(
                "missing '.' after index brackets",
                self.position,
            ));
        }
        self.scan_ident();
        Ok(())
    }

    fn scan_ident(&mut self) {
        let start = self.position;
        while self.peek().is_some_and(is_ident_char) {
            self.position += 1;
        }
        let text = &self.source[start..self.position];
        self.tokens.push(Token::Key(Arc::from(text)));
    }

    /// Scans a bracketed index.
    fn scan_index(&mut self) -> Result<()> {
        let open = self.position;
        self.position += 1;

        let start = self.position;
        loop {
            match self.peek() {
                None => return Err(Error::syntax("unterminated '[' in path", open)),
                Some(b']') => break,
                Some(b) if b.is_ascii_digit() => self.position += 1,
                Some(_) => {
                    return Err(Error::syntax(
                        format!("invalid character {:?} in index", self.current_char()),
                        self.position,
                    ));
                }
            }
        }
        if self.position == start {
            return Err(Error::syntax("empty index '[]' not allowed", open));
        }

        let digits = &self.source[start..self.position];
        let index: usize = digits
            .parse()
            .map_err(|_| Error::syntax("index out of range", start))?;
        self.tokens.push(Token::Index(index));
        self.position += 1; // skip ']'
        Ok(())
    }
}
