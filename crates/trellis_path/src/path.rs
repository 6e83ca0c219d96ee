//! Ordered, validated token sequences.

use std::fmt;

use trellis_foundation::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::token::Token;
use crate::tokenizer::tokenize;

/// An ordered, validated sequence of tokens identifying a tree location.
///
/// Invariant: a parent-operator token may only appear as the very first
/// token. Every constructor enforces this.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityPath {
    tokens: Vec<Token>,
}

impl EntityPath {
    /// Creates an empty path.
    #[must_use]
    pub const fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Parses a path string.
    ///
    /// # Errors
    /// Returns a syntax error describing the first malformed position.
    pub fn parse(source: &str) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
        })
    }

    /// Tokenizes a path string without constructing a path.
    ///
    /// # Errors
    /// Returns a syntax error describing the first malformed position.
    pub fn tokenize(source: &str) -> Result<Vec<Token>> {
        tokenize(source)
    }

    /// Builds a path from a token sequence.
    ///
    /// # Errors
    /// Returns a validation error if a parent-operator token appears
    /// anywhere but the first position.
    pub fn from_tokens(tokens: Vec<Token>) -> Result<Self> {
        for (i, token) in tokens.iter().enumerate() {
            if token.is_parents() && i > 0 {
                return Err(Error::invalid_tokens(format!(
                    "parent operator only allowed as the first token (found at {i})"
                )));
            }
        }
        Ok(Self { tokens })
    }

    /// Converts any accepted path form into a path.
    ///
    /// # Errors
    /// Propagates the conversion's syntax or validation error.
    pub fn normalize(path: impl IntoPath) -> Result<Self> {
        path.into_path()
    }

    /// Joins parts into a new path, concatenating tokens in argument order.
    ///
    /// Each part may be an existing path, a string (re-tokenized), a token
    /// sequence (validated), or a bare index.
    ///
    /// # Errors
    /// Propagates part conversion errors; fails if the combined sequence
    /// carries a parent operator anywhere but the front.
    pub fn join(parts: impl IntoIterator<Item = PathPart>) -> Result<Self> {
        let mut tokens = Vec::new();
        for part in parts {
            tokens.extend(part.into_tokens()?);
        }
        Self::from_tokens(tokens)
    }

    /// Returns the token sequence.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Returns the number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the path has no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns the first token.
    #[must_use]
    pub fn first(&self) -> Option<&Token> {
        self.tokens.first()
    }

    /// Returns the last token.
    #[must_use]
    pub fn last(&self) -> Option<&Token> {
        self.tokens.last()
    }

    /// Returns the ascent count of a leading parent operator, or zero.
    #[must_use]
    pub fn parent_levels(&self) -> usize {
        self.tokens
            .first()
            .and_then(Token::parent_levels)
            .unwrap_or(0)
    }

    /// Splits off the first token.
    #[must_use]
    pub fn split_first(&self) -> Option<(&Token, &[Token])> {
        self.tokens.split_first()
    }

    /// Splits off the last token.
    #[must_use]
    pub fn split_last(&self) -> Option<(&Token, &[Token])> {
        self.tokens.split_last()
    }

    /// Appends a token in place.
    ///
    /// # Errors
    /// Returns a validation error if the token is a parent operator and
    /// the path is not empty.
    pub fn push(&mut self, token: Token) -> Result<()> {
        if token.is_parents() && !self.tokens.is_empty() {
            return Err(Error::invalid_tokens(
                "parent operator only allowed as the first token",
            ));
        }
        self.tokens.push(token);
        Ok(())
    }

    /// Returns a new path extended by one child token.
    ///
    /// # Errors
    /// Returns a validation error for a parent-operator token, which can
    /// never address a child.
    pub fn child(&self, token: &Token) -> Result<Self> {
        let mut next = self.clone();
        next.push(token.clone())?;
        Ok(next)
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 && token.is_key() {
                write!(f, ".")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl From<Token> for EntityPath {
    fn from(token: Token) -> Self {
        Self {
            tokens: vec![token],
        }
    }
}

/// One argument to [`EntityPath::join`].
#[derive(Clone, Debug)]
pub enum PathPart {
    /// An existing path.
    Path(EntityPath),
    /// A path string, re-tokenized on use.
    Text(String),
    /// A raw token sequence, validated on use.
    Tokens(Vec<Token>),
    /// A bare list index.
    Index(usize),
}

impl PathPart {
    fn into_tokens(self) -> Result<Vec<Token>> {
        match self {
            Self::Path(path) => Ok(path.tokens),
            Self::Text(text) => tokenize(&text),
            Self::Tokens(tokens) => Ok(EntityPath::from_tokens(tokens)?.tokens),
            Self::Index(index) => Ok(vec![Token::Index(index)]),
        }
    }
}

impl From<EntityPath> for PathPart {
    fn from(path: EntityPath) -> Self {
        Self::Path(path)
    }
}

impl From<&EntityPath> for PathPart {
    fn from(path: &EntityPath) -> Self {
        Self::Path(path.clone())
    }
}

impl From<&str> for PathPart {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for PathPart {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<Token>> for PathPart {
    fn from(tokens: Vec<Token>) -> Self {
        Self::Tokens(tokens)
    }
}

impl From<Token> for PathPart {
    fn from(token: Token) -> Self {
        Self::Tokens(vec![token])
    }
}

impl From<usize> for PathPart {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Conversion from any accepted path form.
///
/// Implemented for paths, strings, and token sequences; anything else is
/// rejected at compile time.
pub trait IntoPath {
    /// Converts into a validated path.
    ///
    /// # Errors
    /// Returns the syntax or validation error of the underlying form.
    fn into_path(self) -> Result<EntityPath>;
}

impl IntoPath for EntityPath {
    fn into_path(self) -> Result<EntityPath> {
        Ok(self)
    }
}

impl IntoPath for &EntityPath {
    fn into_path(self) -> Result<EntityPath> {
        Ok(self.clone())
    }
}

impl IntoPath for &str {
    fn into_path(self) -> Result<EntityPath> {
        EntityPath::parse(self)
    }
}

impl IntoPath for String {
    fn into_path(self) -> Result<EntityPath> {
        EntityPath::parse(&self)
    }
}

impl IntoPath for Vec<Token> {
    fn into_path(self) -> Result<EntityPath> {
        EntityPath::from_tokens(self)
    }
}

impl IntoPath for &[Token] {
    fn into_path(self) -> Result<EntityPath> {
        EntityPath::from_tokens(self.to_vec())
    }
}

impl IntoPath for Token {
    fn into_path(self) -> Result<EntityPath> {
        Ok(EntityPath::from(self))
    }
}
