//! Node representation: variants, recorded location, and callback tables.

use std::fmt;
use std::sync::Arc;

use trellis_foundation::{NodeId, Result, Value};
use trellis_path::{EntityPath, Token};

use crate::tree::EntityTree;

/// A callback registered on a node under a name.
///
/// The owning tree and the node the callback is registered on are passed
/// explicitly; callbacks never capture their environment.
pub type NodeCallback = fn(&mut EntityTree, NodeId, &[Value]) -> Result<Value>;

/// A hook run once for each node after its subtree is fully linked.
pub type InitFn = fn(&mut EntityTree, NodeId) -> Result<()>;

/// An opaque handle to an external display element.
///
/// The engine stores and hands back handles; it never interprets them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({})", self.0)
    }
}

/// The three node variants and their children containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A terminal node with no children container.
    Leaf,
    /// Named children in insertion order.
    Group {
        /// Child ids keyed by property name.
        children: Vec<(Arc<str>, NodeId)>,
    },
    /// Positional children.
    List {
        /// Child ids in list order.
        children: Vec<NodeId>,
    },
}

impl NodeKind {
    /// Returns the variant name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Leaf => "leaf",
            Self::Group { .. } => "group",
            Self::List { .. } => "list",
        }
    }

    /// Returns true for the leaf variant.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf)
    }

    /// Returns the number of children; zero for a leaf.
    #[must_use]
    pub fn child_count(&self) -> usize {
        match self {
            Self::Leaf => 0,
            Self::Group { children } => children.len(),
            Self::List { children } => children.len(),
        }
    }

    /// Resolves a child by token; a key addresses a group, an index a list.
    #[must_use]
    pub fn child(&self, token: &Token) -> Option<NodeId> {
        match (self, token) {
            (Self::Group { children }, Token::Key(key)) => children
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, id)| *id),
            (Self::List { children }, Token::Index(index)) => {
                children.get(*index).copied()
            }
            _ => None,
        }
    }
}

/// A node in the entity tree.
///
/// Location (`token`, `path`, `parent`) is recorded eagerly: every
/// structural mutation recomputes the affected subtree so reads never
/// walk ancestors.
#[derive(Debug)]
pub struct Node {
    pub(crate) token: Option<Token>,
    pub(crate) path: EntityPath,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
    pub(crate) state: Option<Value>,
    pub(crate) local_state: Option<Value>,
    pub(crate) attrs: Option<Value>,
    pub(crate) element: Option<ElementHandle>,
    pub(crate) validators: Vec<(Arc<str>, NodeCallback)>,
    pub(crate) utils: Vec<(Arc<str>, NodeCallback)>,
    pub(crate) events: Vec<(Arc<str>, NodeCallback)>,
    pub(crate) attached: bool,
}

impl Node {
    /// Returns the token under which this node sits in its parent, if any.
    #[must_use]
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Returns the full path from this node's root.
    #[must_use]
    pub fn path(&self) -> &EntityPath {
        &self.path
    }

    /// Returns the parent id, if linked.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the node's variant and children, read-only.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the state payload, if any.
    ///
    /// Attached nodes hold none; it lives in the registry's state tree
    /// until the node is removed.
    #[must_use]
    pub fn state(&self) -> Option<&Value> {
        self.state.as_ref()
    }

    /// Returns the node-resident local state, if any.
    ///
    /// Local state never moves to a registry; it stays on the node
    /// through attach and remove, so callbacks on attached entities can
    /// keep per-node bookkeeping here.
    #[must_use]
    pub fn local_state(&self) -> Option<&Value> {
        self.local_state.as_ref()
    }

    /// Returns the static attributes, if any.
    #[must_use]
    pub fn attrs(&self) -> Option<&Value> {
        self.attrs.as_ref()
    }

    /// Returns the bound element handle, if any.
    #[must_use]
    pub fn element(&self) -> Option<ElementHandle> {
        self.element
    }

    /// Returns true if the node is attached to a registry.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Resolves a direct child by token.
    #[must_use]
    pub fn child(&self, token: &Token) -> Option<NodeId> {
        self.kind.child(token)
    }
}
