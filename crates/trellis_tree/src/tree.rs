//! Generational arena of entity nodes.
//!
//! Nodes are stored in slots addressed by [`NodeId`]; each slot carries a
//! generation that is bumped on reuse, so ids held across a despawn fail
//! validation instead of aliasing a new node. All structural mutations
//! keep the location invariant: a node's recorded token, path, and parent
//! always agree with the containers that hold it.

use std::sync::Arc;

use trellis_foundation::{Error, NodeId, Result, Value};
use trellis_path::{EntityPath, IntoPath, Token};

use crate::descriptor::{DescriptorChildren, NodeDescriptor};
use crate::node::{ElementHandle, InitFn, Node, NodeCallback, NodeKind};

/// Either an existing node or a blueprint for a new one.
///
/// Operations that accept a child take this, so callers can pass a node
/// id or a descriptor interchangeably.
#[derive(Debug)]
pub enum NodeRef {
    /// An already-materialized node.
    Existing(NodeId),
    /// A blueprint materialized on use.
    Descriptor(NodeDescriptor),
}

impl From<NodeId> for NodeRef {
    fn from(id: NodeId) -> Self {
        Self::Existing(id)
    }
}

impl From<NodeDescriptor> for NodeRef {
    fn from(descriptor: NodeDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }
}

/// One storage slot; `node` is `None` while the slot sits on the free list.
#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// An arena of entity nodes with generational ids.
#[derive(Debug, Default)]
pub struct EntityTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl EntityTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if the tree holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns true if the id refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.validate(id).is_ok()
    }

    /// Checks that the id refers to a live node.
    ///
    /// # Errors
    /// Returns a node-not-found error for an unknown index and a
    /// stale-node error for a generation mismatch.
    pub fn validate(&self, id: NodeId) -> Result<()> {
        let Some(slot) = self.slots.get(id.index as usize) else {
            return Err(Error::node_not_found(id));
        };
        if slot.generation != id.generation {
            return Err(Error::stale_node(id));
        }
        if slot.node.is_none() {
            return Err(Error::node_not_found(id));
        }
        Ok(())
    }

    /// Returns a read-only view of a node.
    ///
    /// # Errors
    /// Fails for unknown or stale ids.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.validate(id)?;
        self.slots[id.index as usize]
            .node
            .as_ref()
            .ok_or_else(|| Error::node_not_found(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.validate(id)?;
        self.slots[id.index as usize]
            .node
            .as_mut()
            .ok_or_else(|| Error::node_not_found(id))
    }

    /// Iterates over all live node ids.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node
                .as_ref()
                .map(|_| NodeId::new(u32::try_from(index).unwrap_or(u32::MAX), slot.generation))
        })
    }

    /// Materializes a descriptor into a detached subtree and returns its
    /// top node.
    ///
    /// Init hooks run pre-order after the whole subtree is linked. If a
    /// hook fails the subtree is despawned, so a failed create leaves no
    /// partial nodes behind.
    ///
    /// # Errors
    /// Propagates the first failing init hook.
    pub fn create(&mut self, descriptor: NodeDescriptor) -> Result<NodeId> {
        let mut inits = Vec::new();
        let id = self.build(descriptor, None, None, &mut inits);
        self.update_paths(id)?;
        for (node, init) in inits {
            if let Err(err) = init(self, node) {
                self.despawn_subtree(id)?;
                return Err(err);
            }
        }
        Ok(id)
    }

    fn build(
        &mut self,
        descriptor: NodeDescriptor,
        parent: Option<NodeId>,
        token: Option<Token>,
        inits: &mut Vec<(NodeId, InitFn)>,
    ) -> NodeId {
        let NodeDescriptor {
            children,
            state,
            local_state,
            attrs,
            element,
            validators,
            utils,
            events,
            init,
        } = descriptor;

        let kind = match &children {
            None => NodeKind::Leaf,
            Some(DescriptorChildren::Group(_)) => NodeKind::Group {
                children: Vec::new(),
            },
            Some(DescriptorChildren::List(_)) => NodeKind::List {
                children: Vec::new(),
            },
        };
        let id = self.spawn(Node {
            token,
            path: EntityPath::new(),
            parent,
            kind,
            state,
            local_state,
            attrs,
            element,
            validators,
            utils,
            events,
            attached: false,
        });
        if let Some(init) = init {
            inits.push((id, init));
        }

        match children {
            None => {}
            Some(DescriptorChildren::Group(entries)) => {
                for (key, child_descriptor) in entries {
                    let child = self.build(
                        child_descriptor,
                        Some(id),
                        Some(Token::Key(key.clone())),
                        inits,
                    );
                    if let Some(Node {
                        kind: NodeKind::Group { children },
                        ..
                    }) = self.slots[id.index as usize].node.as_mut()
                    {
                        children.push((key, child));
                    }
                }
            }
            Some(DescriptorChildren::List(items)) => {
                for (index, child_descriptor) in items.into_iter().enumerate() {
                    let child =
                        self.build(child_descriptor, Some(id), Some(Token::Index(index)), inits);
                    if let Some(Node {
                        kind: NodeKind::List { children },
                        ..
                    }) = self.slots[id.index as usize].node.as_mut()
                    {
                        children.push(child);
                    }
                }
            }
        }
        id
    }

    /// Links a child under a parent container.
    ///
    /// For a group the token must be an unused key. For a list, `None`
    /// appends and `Some(Index(i))` inserts at `i`, shifting later
    /// siblings up and re-indexing them. An existing node must be
    /// unlinked and unattached.
    ///
    /// # Errors
    /// Fails on leaf parents, token/variant mismatches, duplicate keys,
    /// out-of-range indices, and already linked or attached nodes. All
    /// checks run before any mutation.
    pub fn add_entity(
        &mut self,
        parent: NodeId,
        entity: impl Into<NodeRef>,
        token: Option<Token>,
    ) -> Result<NodeId> {
        self.validate(parent)?;
        let parent_node = self.node(parent)?;
        let parent_path = parent_node.path.to_string();

        let token = match &parent_node.kind {
            NodeKind::Leaf => {
                return Err(Error::not_a_container("add entity", parent_path));
            }
            NodeKind::Group { children } => match token {
                Some(Token::Key(key)) => {
                    if children.iter().any(|(k, _)| *k == key) {
                        return Err(Error::duplicate_key(&*key, parent_path));
                    }
                    Token::Key(key)
                }
                _ => {
                    return Err(Error::token_mismatch(
                        "a property key when adding to a group",
                        parent_path,
                    ));
                }
            },
            NodeKind::List { children } => match token {
                None => Token::Index(children.len()),
                Some(Token::Index(index)) => {
                    if index > children.len() {
                        return Err(Error::index_out_of_bounds(index, children.len()));
                    }
                    Token::Index(index)
                }
                Some(_) => {
                    return Err(Error::token_mismatch(
                        "a list index when adding to a list",
                        parent_path,
                    ));
                }
            },
        };

        let child = match entity.into() {
            NodeRef::Existing(id) => {
                self.validate(id)?;
                let node = self.node(id)?;
                if node.parent.is_some() {
                    return Err(Error::already_linked(node.path.to_string()));
                }
                if node.attached {
                    return Err(Error::already_attached(node.path.to_string()));
                }
                id
            }
            NodeRef::Descriptor(descriptor) => self.create(descriptor)?,
        };

        self.link_child(parent, child, token)
    }

    fn link_child(&mut self, parent: NodeId, child: NodeId, token: Token) -> Result<NodeId> {
        {
            let node = self.node_mut(child)?;
            node.parent = Some(parent);
            node.token = Some(token.clone());
        }
        let reindex_from = {
            let parent_node = self.node_mut(parent)?;
            match (&mut parent_node.kind, &token) {
                (NodeKind::Group { children }, Token::Key(key)) => {
                    children.push((key.clone(), child));
                    None
                }
                (NodeKind::List { children }, Token::Index(index)) => {
                    children.insert(*index, child);
                    Some(*index)
                }
                _ => {
                    return Err(Error::internal(
                        "container and token variants diverged during link",
                    ));
                }
            }
        };
        match reindex_from {
            Some(index) => self.reindex_list(parent, index)?,
            None => self.update_paths(child)?,
        }
        Ok(child)
    }

    /// Unlinks a child and returns it as a standalone node.
    ///
    /// The removed node keeps its subtree and state; its token and parent
    /// are cleared and subtree paths recomputed. Later list siblings are
    /// re-indexed down.
    ///
    /// # Errors
    /// Fails on leaf parents, token/variant mismatches, and tokens that
    /// resolve no child.
    pub fn remove_entity(&mut self, parent: NodeId, token: &Token) -> Result<NodeId> {
        let id = self.unlink_child(parent, token)?;
        {
            let node = self.node_mut(id)?;
            node.parent = None;
            node.token = None;
        }
        self.update_paths(id)?;
        Ok(id)
    }

    /// Unlinks a child and discards its whole subtree.
    ///
    /// Slots are freed post-order; all ids into the subtree become stale.
    ///
    /// # Errors
    /// Same conditions as [`EntityTree::remove_entity`].
    pub fn delete_entity(&mut self, parent: NodeId, token: &Token) -> Result<()> {
        let id = self.unlink_child(parent, token)?;
        self.despawn_subtree(id)
    }

    fn unlink_child(&mut self, parent: NodeId, token: &Token) -> Result<NodeId> {
        self.validate(parent)?;
        let parent_path = self.node(parent)?.path.to_string();
        let (id, reindex_from) = {
            let parent_node = self.node_mut(parent)?;
            match &mut parent_node.kind {
                NodeKind::Leaf => {
                    return Err(Error::not_a_container("remove entity", parent_path));
                }
                NodeKind::Group { children } => {
                    let Token::Key(key) = token else {
                        return Err(Error::token_mismatch(
                            "a property key when removing from a group",
                            parent_path,
                        ));
                    };
                    let Some(position) = children.iter().position(|(k, _)| k == key) else {
                        return Err(Error::child_not_found(&**key, parent_path));
                    };
                    (children.remove(position).1, None)
                }
                NodeKind::List { children } => {
                    let Token::Index(index) = token else {
                        return Err(Error::token_mismatch(
                            "a list index when removing from a list",
                            parent_path,
                        ));
                    };
                    if *index >= children.len() {
                        return Err(Error::index_out_of_bounds(*index, children.len()));
                    }
                    (children.remove(*index), Some(*index))
                }
            }
        };
        if let Some(index) = reindex_from {
            self.reindex_list(parent, index)?;
        }
        Ok(id)
    }

    /// Resolves a path relative to a node.
    ///
    /// A leading parent-operator token ascends first; remaining tokens
    /// descend through children.
    ///
    /// # Errors
    /// An ascent past the topmost ancestor reports the zero-based step
    /// that failed. A descent failure names the last resolved node and
    /// the token that did not match.
    pub fn get_entity(&self, from: NodeId, path: impl IntoPath) -> Result<NodeId> {
        self.validate(from)?;
        let path = path.into_path()?;
        let tokens = path.tokens();

        let mut current = from;
        let mut start = 0;
        if let Some(Token::Parents(levels)) = tokens.first() {
            start = 1;
            for step in 0..*levels {
                current = self
                    .node(current)?
                    .parent
                    .ok_or_else(|| Error::parent_operator(step))?;
            }
        }
        for token in &tokens[start..] {
            current = self.step_into(current, token)?;
        }
        Ok(current)
    }

    fn step_into(&self, id: NodeId, token: &Token) -> Result<NodeId> {
        let node = self.node(id)?;
        if node.kind.is_leaf() {
            return Err(Error::no_children(node.path.to_string()));
        }
        node.kind
            .child(token)
            .ok_or_else(|| Error::child_not_found(token.to_string(), node.path.to_string()))
    }

    /// Visits each direct child in order with its token.
    ///
    /// Takes `&self`, so the visitor observes a consistent tree and
    /// cannot mutate it mid-iteration.
    ///
    /// # Errors
    /// Fails on leaf nodes and invalid ids.
    pub fn for_each_child<F>(&self, id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(NodeId, &Token),
    {
        let node = self.node(id)?;
        match &node.kind {
            NodeKind::Leaf => Err(Error::not_a_container(
                "iterate children",
                node.path.to_string(),
            )),
            NodeKind::Group { children } => {
                for (key, child) in children {
                    visit(*child, &Token::Key(key.clone()));
                }
                Ok(())
            }
            NodeKind::List { children } => {
                for (index, child) in children.iter().enumerate() {
                    visit(*child, &Token::Index(index));
                }
                Ok(())
            }
        }
    }

    /// Sets the state payload of a detached node.
    ///
    /// # Errors
    /// Fails if the node is attached; attached state lives in the
    /// registry's state tree.
    pub fn set_state(&mut self, id: NodeId, state: Value) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.attached {
            let path = node.path.to_string();
            return Err(Error::already_attached(path));
        }
        node.state = Some(state);
        Ok(())
    }

    /// Sets the node-resident local state.
    ///
    /// Works on attached and detached nodes alike; local state never
    /// moves into a registry's state tree.
    ///
    /// # Errors
    /// Fails for unknown or stale ids.
    pub fn set_local_state(&mut self, id: NodeId, state: Value) -> Result<()> {
        self.node_mut(id)?.local_state = Some(state);
        Ok(())
    }

    /// Binds an element handle to a node that has none.
    ///
    /// # Errors
    /// Fails if the node already has a bound element.
    pub fn set_element(&mut self, id: NodeId, element: ElementHandle) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.element.is_some() {
            let path = node.path.to_string();
            return Err(Error::element_bound(path));
        }
        node.element = Some(element);
        Ok(())
    }

    /// Invokes a named validator on a node.
    ///
    /// # Errors
    /// Fails if no validator is registered under the name; otherwise
    /// propagates the callback's result.
    pub fn call_validator(&mut self, id: NodeId, name: &str, args: &[Value]) -> Result<Value> {
        let node = self.node(id)?;
        let Some(callback) = lookup_callback(&node.validators, name) else {
            return Err(Error::callback_not_found(name, node.path.to_string()));
        };
        callback(self, id, args)
    }

    /// Invokes a named utility on a node.
    ///
    /// # Errors
    /// Fails if no utility is registered under the name; otherwise
    /// propagates the callback's result.
    pub fn call_util(&mut self, id: NodeId, name: &str, args: &[Value]) -> Result<Value> {
        let node = self.node(id)?;
        let Some(callback) = lookup_callback(&node.utils, name) else {
            return Err(Error::callback_not_found(name, node.path.to_string()));
        };
        callback(self, id, args)
    }

    /// Invokes a named event handler on a node.
    ///
    /// # Errors
    /// Fails if no event handler is registered under the name; otherwise
    /// propagates the callback's result.
    pub fn call_event(&mut self, id: NodeId, name: &str, args: &[Value]) -> Result<Value> {
        let node = self.node(id)?;
        let Some(callback) = lookup_callback(&node.events, name) else {
            return Err(Error::callback_not_found(name, node.path.to_string()));
        };
        callback(self, id, args)
    }

    fn spawn(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.node = Some(node);
            NodeId::new(index, slot.generation)
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 1,
                node: Some(node),
            });
            NodeId::new(index, 1)
        }
    }

    fn despawn(&mut self, id: NodeId) -> Result<()> {
        self.validate(id)?;
        let slot = &mut self.slots[id.index as usize];
        slot.generation += 1;
        slot.node = None;
        self.free.push(id.index);
        self.live -= 1;
        Ok(())
    }

    pub(crate) fn despawn_subtree(&mut self, id: NodeId) -> Result<()> {
        for child in self.child_ids(id)? {
            self.despawn_subtree(child)?;
        }
        self.despawn(id)
    }

    pub(crate) fn child_ids(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let node = self.node(id)?;
        Ok(match &node.kind {
            NodeKind::Leaf => Vec::new(),
            NodeKind::Group { children } => children.iter().map(|(_, id)| *id).collect(),
            NodeKind::List { children } => children.clone(),
        })
    }

    /// Re-tokens list children from `from` onward and recomputes their
    /// subtree paths.
    fn reindex_list(&mut self, parent: NodeId, from: usize) -> Result<()> {
        let tail: Vec<NodeId> = match &self.node(parent)?.kind {
            NodeKind::List { children } => children[from..].to_vec(),
            _ => {
                return Err(Error::internal("re-index target is not a list"));
            }
        };
        for (offset, id) in tail.into_iter().enumerate() {
            self.node_mut(id)?.token = Some(Token::Index(from + offset));
            self.update_paths(id)?;
        }
        Ok(())
    }

    /// Recomputes the recorded path of a node and its whole subtree.
    pub(crate) fn update_paths(&mut self, id: NodeId) -> Result<()> {
        let path = {
            let node = self.node(id)?;
            match (node.parent, &node.token) {
                (Some(parent), Some(token)) => self.node(parent)?.path.child(token)?,
                (None, Some(token)) => EntityPath::from(token.clone()),
                (None, None) => EntityPath::new(),
                (Some(_), None) => {
                    return Err(Error::internal("linked node has no token"));
                }
            }
        };
        self.node_mut(id)?.path = path;
        for child in self.child_ids(id)? {
            self.update_paths(child)?;
        }
        Ok(())
    }

    /// Gives a standalone node a root token, recomputing subtree paths.
    pub(crate) fn set_root_token(&mut self, id: NodeId, token: Token) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.parent.is_some() {
            return Err(Error::internal("root token set on a linked node"));
        }
        node.token = Some(token);
        self.update_paths(id)
    }

    /// Clears a root token, recomputing subtree paths.
    pub(crate) fn clear_root(&mut self, id: NodeId) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.parent.is_some() {
            return Err(Error::internal("root token cleared on a linked node"));
        }
        node.token = None;
        self.update_paths(id)
    }
}

fn lookup_callback(table: &[(Arc<str>, NodeCallback)], name: &str) -> Option<NodeCallback> {
    table
        .iter()
        .find(|(n, _)| &**n == name)
        .map(|(_, callback)| *callback)
}
