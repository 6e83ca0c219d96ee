//! Declarative node construction.
//!
//! A descriptor is a validated blueprint: shape checks happen while the
//! descriptor is built, so materializing one into a tree cannot fail on
//! shape. A leaf carries an element handle from construction; groups and
//! lists carry ordered child descriptors.

use std::sync::Arc;

use trellis_foundation::{Error, Result, Value};
use trellis_path::Token;

use crate::node::{ElementHandle, InitFn, NodeCallback};

/// A declarative blueprint for one node and its subtree.
///
/// ```
/// use trellis_tree::{ElementHandle, NodeDescriptor};
/// use trellis_foundation::Value;
///
/// let items = NodeDescriptor::list()
///     .with_item(NodeDescriptor::leaf(ElementHandle(2)))?;
/// let top = NodeDescriptor::group()
///     .with_state(Value::map([("open", Value::from(false))]))
///     .with_child("label", NodeDescriptor::leaf(ElementHandle(1)))?
///     .with_child("items", items)?;
/// # Ok::<(), trellis_foundation::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct NodeDescriptor {
    pub(crate) children: Option<DescriptorChildren>,
    pub(crate) state: Option<Value>,
    pub(crate) local_state: Option<Value>,
    pub(crate) attrs: Option<Value>,
    pub(crate) element: Option<ElementHandle>,
    pub(crate) validators: Vec<(Arc<str>, NodeCallback)>,
    pub(crate) utils: Vec<(Arc<str>, NodeCallback)>,
    pub(crate) events: Vec<(Arc<str>, NodeCallback)>,
    pub(crate) init: Option<InitFn>,
}

/// Ordered child blueprints, shaped by the parent variant.
#[derive(Debug, Clone)]
pub(crate) enum DescriptorChildren {
    Group(Vec<(Arc<str>, NodeDescriptor)>),
    List(Vec<NodeDescriptor>),
}

impl NodeDescriptor {
    fn empty(children: Option<DescriptorChildren>, element: Option<ElementHandle>) -> Self {
        Self {
            children,
            state: None,
            local_state: None,
            attrs: None,
            element,
            validators: Vec::new(),
            utils: Vec::new(),
            events: Vec::new(),
            init: None,
        }
    }

    /// Creates a leaf descriptor bound to an element handle.
    ///
    /// Leaves require an element; the constructor signature enforces it.
    #[must_use]
    pub fn leaf(element: ElementHandle) -> Self {
        Self::empty(None, Some(element))
    }

    /// Creates an empty group descriptor.
    #[must_use]
    pub fn group() -> Self {
        Self::empty(Some(DescriptorChildren::Group(Vec::new())), None)
    }

    /// Creates an empty list descriptor.
    #[must_use]
    pub fn list() -> Self {
        Self::empty(Some(DescriptorChildren::List(Vec::new())), None)
    }

    /// Returns the variant name this descriptor will materialize as.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match &self.children {
            None => "leaf",
            Some(DescriptorChildren::Group(_)) => "group",
            Some(DescriptorChildren::List(_)) => "list",
        }
    }

    /// Sets the initial state payload.
    #[must_use]
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the initial node-resident local state.
    ///
    /// Unlike the state payload, local state stays on the node when the
    /// entity is attached to a registry.
    #[must_use]
    pub fn with_local_state(mut self, state: Value) -> Self {
        self.local_state = Some(state);
        self
    }

    /// Sets the static attributes.
    #[must_use]
    pub fn with_attrs(mut self, attrs: Value) -> Self {
        self.attrs = Some(attrs);
        self
    }

    /// Binds an element handle to a group or list descriptor.
    #[must_use]
    pub fn with_element(mut self, element: ElementHandle) -> Self {
        self.element = Some(element);
        self
    }

    /// Adds a named child to a group descriptor.
    ///
    /// # Errors
    /// Fails if the key is not a valid identifier, the key is already
    /// used, or the descriptor is not a group.
    pub fn with_child(mut self, key: &str, child: NodeDescriptor) -> Result<Self> {
        let token = Token::key(key)?;
        let Some(key) = token.as_key().map(Arc::from) else {
            return Err(Error::invalid_key(key));
        };
        match &mut self.children {
            Some(DescriptorChildren::Group(entries)) => {
                if entries.iter().any(|(k, _)| *k == key) {
                    return Err(Error::invalid_descriptor(format!(
                        "duplicate child key \"{key}\""
                    )));
                }
                entries.push((key, child));
                Ok(self)
            }
            _ => Err(Error::invalid_descriptor(format!(
                "named children require a group descriptor, not a {}",
                self.kind_name()
            ))),
        }
    }

    /// Appends a positional child to a list descriptor.
    ///
    /// # Errors
    /// Fails if the descriptor is not a list.
    pub fn with_item(mut self, child: NodeDescriptor) -> Result<Self> {
        match &mut self.children {
            Some(DescriptorChildren::List(items)) => {
                items.push(child);
                Ok(self)
            }
            _ => Err(Error::invalid_descriptor(format!(
                "positional children require a list descriptor, not a {}",
                self.kind_name()
            ))),
        }
    }

    /// Registers a named validator, replacing any previous one.
    #[must_use]
    pub fn with_validator(mut self, name: &str, callback: NodeCallback) -> Self {
        register(&mut self.validators, name, callback);
        self
    }

    /// Registers a named utility, replacing any previous one.
    #[must_use]
    pub fn with_util(mut self, name: &str, callback: NodeCallback) -> Self {
        register(&mut self.utils, name, callback);
        self
    }

    /// Registers a named event handler, replacing any previous one.
    #[must_use]
    pub fn with_event(mut self, name: &str, callback: NodeCallback) -> Self {
        register(&mut self.events, name, callback);
        self
    }

    /// Sets the init hook, run after the node's subtree is fully linked.
    #[must_use]
    pub fn with_init(mut self, init: InitFn) -> Self {
        self.init = Some(init);
        self
    }
}

fn register(table: &mut Vec<(Arc<str>, NodeCallback)>, name: &str, callback: NodeCallback) {
    match table.iter_mut().find(|(n, _)| &**n == name) {
        Some((_, slot)) => *slot = callback,
        None => table.push((Arc::from(name), callback)),
    }
}
