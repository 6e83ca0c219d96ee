//! Atomic path components.

use std::fmt;
use std::sync::Arc;

use trellis_foundation::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One atomic path component.
///
/// Index tokens use `usize`, so negative or fractional indices are
/// unrepresentable. Parent-operator tokens carry the number of levels to
/// ascend and are only valid as the first token of a path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Token {
    /// Property key matching identifier syntax.
    Key(Arc<str>),
    /// Non-negative list index.
    Index(usize),
    /// Parent operator: ascend this many levels (always >= 1).
    Parents(usize),
}

impl Token {
    /// Creates a token from key text.
    ///
    /// Identifier text becomes a [`Token::Key`]; a pure run of `^`
    /// characters becomes a [`Token::Parents`].
    ///
    /// # Errors
    /// Returns a validation error for any other text.
    pub fn key(text: impl AsRef<str>) -> Result<Self> {
        let text = text.as_ref();
        if is_identifier(text) {
            return Ok(Self::Key(Arc::from(text)));
        }
        if !text.is_empty() && text.bytes().all(|b| b == b'^') {
            return Ok(Self::Parents(text.len()));
        }
        Err(Error::invalid_key(text))
    }

    /// Creates an index token.
    #[must_use]
    pub const fn index(index: usize) -> Self {
        Self::Index(index)
    }

    /// Creates a parent-operator token ascending `levels` levels.
    ///
    /// # Errors
    /// Returns a validation error if `levels` is zero.
    pub fn parents(levels: usize) -> Result<Self> {
        if levels == 0 {
            return Err(Error::invalid_tokens(
                "parent operator must ascend at least one level",
            ));
        }
        Ok(Self::Parents(levels))
    }

    /// Returns true if this is a property key.
    #[must_use]
    pub const fn is_key(&self) -> bool {
        matches!(self, Self::Key(_))
    }

    /// Returns true if this is a list index.
    #[must_use]
    pub const fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }

    /// Returns true if this is a parent operator.
    #[must_use]
    pub const fn is_parents(&self) -> bool {
        matches!(self, Self::Parents(_))
    }

    /// Attempts to extract the key text.
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(k) => Some(k),
            _ => None,
        }
    }

    /// Attempts to extract the index.
    #[must_use]
    pub const fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract the ascent level count.
    #[must_use]
    pub const fn parent_levels(&self) -> Option<usize> {
        match self {
            Self::Parents(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<usize> for Token {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl TryFrom<&str> for Token {
    type Error = Error;

    fn try_from(text: &str) -> Result<Self> {
        Self::key(text)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => write!(f, "{k}"),
            Self::Index(n) => write!(f, "[{n}]"),
            Self::Parents(n) => {
                for _ in 0..*n {
                    write!(f, "^")?;
                }
                Ok(())
            }
        }
    }
}

/// Returns true if the character can start an identifier.
pub(crate) const fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

/// Returns true if the character can continue an identifier.
pub(crate) const fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn is_identifier(text: &str) -> bool {
    let bytes = text.as_bytes();
    match bytes.split_first() {
        Some((first, rest)) => {
            is_ident_start(*first) && rest.iter().all(|b| is_ident_char(*b))
        }
        None => false,
    }
}
