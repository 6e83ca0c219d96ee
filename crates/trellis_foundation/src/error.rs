//! Error types for the Trellis system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every kind belongs to one of four [`ErrorClass`] categories: syntax
//! errors from the path tokenizer, validation errors from token or
//! descriptor checks, structural errors from variant-inappropriate
//! operations, and linkage errors from parent/registry bookkeeping.

use std::fmt;

use thiserror::Error;

use crate::node::NodeId;

/// The main error type for Trellis operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context naming the operation that failed.
    pub context: Option<String>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Returns the class this error's kind belongs to.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    /// Creates a path syntax error at the given byte position.
    #[must_use]
    pub fn syntax(message: impl Into<String>, position: usize) -> Self {
        Self::new(ErrorKind::Syntax {
            message: message.into(),
            position,
        })
    }

    /// Creates an invalid-key validation error.
    #[must_use]
    pub fn invalid_key(text: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidKey { text: text.into() })
    }

    /// Creates an invalid-token-sequence validation error.
    #[must_use]
    pub fn invalid_tokens(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidTokens {
            message: message.into(),
        })
    }

    /// Creates an invalid-descriptor validation error.
    #[must_use]
    pub fn invalid_descriptor(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidDescriptor {
            message: message.into(),
        })
    }

    /// Creates an empty-path validation error.
    #[must_use]
    pub fn empty_path() -> Self {
        Self::new(ErrorKind::EmptyPath)
    }

    /// Creates a structural error for an operation attempted on a leaf.
    #[must_use]
    pub fn not_a_container(operation: &'static str, path: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAContainer {
            operation,
            path: path.into(),
        })
    }

    /// Creates a duplicate-key structural error.
    #[must_use]
    pub fn duplicate_key(key: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateKey {
            key: key.into(),
            path: path.into(),
        })
    }

    /// Creates a token-kind mismatch structural error.
    #[must_use]
    pub fn token_mismatch(expected: &'static str, path: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenMismatch {
            expected,
            path: path.into(),
        })
    }

    /// Creates an index-out-of-bounds structural error.
    #[must_use]
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        Self::new(ErrorKind::IndexOutOfBounds { index, length })
    }

    /// Creates an element-already-bound structural error.
    #[must_use]
    pub fn element_bound(path: impl Into<String>) -> Self {
        Self::new(ErrorKind::ElementBound { path: path.into() })
    }

    /// Creates a linkage error for a node that already has a parent.
    #[must_use]
    pub fn already_linked(path: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyLinked { path: path.into() })
    }

    /// Creates a linkage error for an operation on an attached node.
    #[must_use]
    pub fn already_attached(path: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyAttached { path: path.into() })
    }

    /// Creates a linkage error for traversal into a childless node.
    #[must_use]
    pub fn no_children(path: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoChildren { path: path.into() })
    }

    /// Creates a linkage error for a missing child token.
    #[must_use]
    pub fn child_not_found(token: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(ErrorKind::ChildNotFound {
            token: token.into(),
            path: path.into(),
        })
    }

    /// Creates a linkage error for a missing registry root.
    #[must_use]
    pub fn root_not_found(token: impl Into<String>) -> Self {
        Self::new(ErrorKind::RootNotFound {
            token: token.into(),
        })
    }

    /// Creates a linkage error for an ascent past the topmost ancestor.
    #[must_use]
    pub fn parent_operator(index: usize) -> Self {
        Self::new(ErrorKind::ParentOperator { index })
    }

    /// Creates a node not found error.
    #[must_use]
    pub fn node_not_found(id: NodeId) -> Self {
        Self::new(ErrorKind::NodeNotFound(id))
    }

    /// Creates a stale node reference error.
    #[must_use]
    pub fn stale_node(id: NodeId) -> Self {
        Self::new(ErrorKind::StaleNode(id))
    }

    /// Creates a linkage error for a node not attached to the registry.
    #[must_use]
    pub fn not_attached(id: NodeId) -> Self {
        Self::new(ErrorKind::NotAttached(id))
    }

    /// Creates a linkage error for a missing named callback.
    #[must_use]
    pub fn callback_not_found(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(ErrorKind::CallbackNotFound {
            name: name.into(),
            path: path.into(),
        })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Malformed path string, reported with its byte position.
    #[error("syntax error at position {position}: {message}")]
    Syntax {
        /// Description of the syntax error.
        message: String,
        /// Byte position in the path string.
        position: usize,
    },

    /// Text that is neither a valid identifier nor a parent-operator run.
    #[error("invalid property key: \"{text}\"")]
    InvalidKey {
        /// The offending text.
        text: String,
    },

    /// A token sequence that violates path invariants.
    #[error("invalid token sequence: {message}")]
    InvalidTokens {
        /// Description of the violation.
        message: String,
    },

    /// A declarative descriptor that fails shape checks.
    #[error("invalid descriptor: {message}")]
    InvalidDescriptor {
        /// Description of the violation.
        message: String,
    },

    /// A path that resolved to zero tokens where one is required.
    #[error("empty path")]
    EmptyPath,

    /// An operation that requires children attempted on a leaf.
    #[error("cannot {operation} on leaf entity \"{path}\"")]
    NotAContainer {
        /// The operation that was attempted.
        operation: &'static str,
        /// Path of the leaf node.
        path: String,
    },

    /// A group key that is already in use.
    #[error("cannot add child \"{key}\" to group \"{path}\": already exists")]
    DuplicateKey {
        /// The duplicated key.
        key: String,
        /// Path of the group node.
        path: String,
    },

    /// A token whose kind does not match the container it addresses.
    #[error("token mismatch on \"{path}\": expected {expected}")]
    TokenMismatch {
        /// Description of the expected token kind.
        expected: &'static str,
        /// Path of the container node.
        path: String,
    },

    /// Index out of bounds.
    #[error("index out of bounds: {index} (length {length})")]
    IndexOutOfBounds {
        /// The index that was accessed.
        index: usize,
        /// The actual length of the container.
        length: usize,
    },

    /// An element handle bound to a node that already has one.
    #[error("entity \"{path}\" already has a bound element")]
    ElementBound {
        /// Path of the node.
        path: String,
    },

    /// A node that already has a parent cannot be linked again.
    #[error("entity \"{path}\" already has a parent")]
    AlreadyLinked {
        /// Path of the already-linked entity.
        path: String,
    },

    /// The operation is invalid on a node attached to a registry.
    #[error("entity \"{path}\" is already attached to a registry")]
    AlreadyAttached {
        /// Path of the attached entity.
        path: String,
    },

    /// Traversal stepped into a node with no children container.
    #[error("entity \"{path}\" has no children")]
    NoChildren {
        /// Path of the childless node.
        path: String,
    },

    /// Traversal addressed a child that does not exist.
    #[error("entity \"{path}\" has no child with token \"{token}\"")]
    ChildNotFound {
        /// The token that failed to resolve.
        token: String,
        /// Path of the last successfully resolved node.
        path: String,
    },

    /// The registry has no root under the given token.
    #[error("registry has no root entity \"{token}\"")]
    RootNotFound {
        /// The root token that failed to resolve.
        token: String,
    },

    /// A parent-operator ascent stepped past the topmost ancestor.
    #[error("parent operator error at index {index}")]
    ParentOperator {
        /// Zero-based index of the ascent step that failed.
        index: usize,
    },

    /// Node was not found in storage.
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Node reference is stale (generation mismatch).
    #[error("stale node reference: {0:?}")]
    StaleNode(NodeId),

    /// The targeted node is not attached to this registry.
    #[error("node is not attached to this registry: {0:?}")]
    NotAttached(NodeId),

    /// A named callback was not registered on the node.
    #[error("entity \"{path}\" has no callback \"{name}\"")]
    CallbackNotFound {
        /// The callback name.
        name: String,
        /// Path of the node.
        path: String,
    },

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Returns the class this kind belongs to.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Syntax { .. } => ErrorClass::Syntax,
            Self::InvalidKey { .. }
            | Self::InvalidTokens { .. }
            | Self::InvalidDescriptor { .. }
            | Self::EmptyPath => ErrorClass::Validation,
            Self::NotAContainer { .. }
            | Self::DuplicateKey { .. }
            | Self::TokenMismatch { .. }
            | Self::IndexOutOfBounds { .. }
            | Self::ElementBound { .. }
            | Self::Internal(_) => ErrorClass::Structural,
            Self::AlreadyLinked { .. }
            | Self::AlreadyAttached { .. }
            | Self::NoChildren { .. }
            | Self::ChildNotFound { .. }
            | Self::RootNotFound { .. }
            | Self::ParentOperator { .. }
            | Self::NodeNotFound(_)
            | Self::StaleNode(_)
            | Self::NotAttached(_)
            | Self::CallbackNotFound { .. } => ErrorClass::Linkage,
        }
    }
}

/// The four error classes exposed to callers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Malformed path string.
    Syntax,
    /// Token array or descriptor failed validation.
    Validation,
    /// Operation invalid for the node's variant.
    Structural,
    /// Parent/registry linkage or addressing failure.
    Linkage,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Validation => write!(f, "validation"),
            Self::Structural => write!(f, "structural"),
            Self::Linkage => write!(f, "linkage"),
        }
    }
}
