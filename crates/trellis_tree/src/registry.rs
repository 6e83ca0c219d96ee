//! The entity registry: root ownership plus the state protocol.
//!
//! Attaching an entity moves the state payload out of every node in its
//! subtree into a shadow state tree owned by the registry, mirroring the
//! entity hierarchy shape-for-shape. Removing the entity moves the state
//! back into the nodes. While attached, a node's state lives only in the
//! registry; the node itself holds none. Node-resident local state is
//! outside the protocol and stays put through both moves.

use std::sync::Arc;

use trellis_foundation::{Error, NodeId, Result, Value};
use trellis_path::{EntityPath, IntoPath, Token};

use crate::descriptor::NodeDescriptor;
use crate::node::NodeKind;
use crate::tree::{EntityTree, NodeRef};

/// State extracted from one attached node.
///
/// `state` is the node's payload; `children` mirrors the node's children
/// container, `None` for a leaf.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateRecord {
    pub(crate) state: Option<Value>,
    pub(crate) children: Option<StateChildren>,
}

impl StateRecord {
    /// Returns the extracted payload, if any.
    #[must_use]
    pub fn state(&self) -> Option<&Value> {
        self.state.as_ref()
    }

    /// Returns the mirrored children container, if any.
    #[must_use]
    pub fn children(&self) -> Option<&StateChildren> {
        self.children.as_ref()
    }

    /// Resolves a child record by token.
    #[must_use]
    pub fn child(&self, token: &Token) -> Option<&StateRecord> {
        match (&self.children, token) {
            (Some(StateChildren::Group(entries)), Token::Key(key)) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, record)| record),
            (Some(StateChildren::List(items)), Token::Index(index)) => items.get(*index),
            _ => None,
        }
    }

    pub(crate) fn child_mut(&mut self, token: &Token) -> Option<&mut StateRecord> {
        match (&mut self.children, token) {
            (Some(StateChildren::Group(entries)), Token::Key(key)) => entries
                .iter_mut()
                .find(|(k, _)| k == key)
                .map(|(_, record)| record),
            (Some(StateChildren::List(items)), Token::Index(index)) => items.get_mut(*index),
            _ => None,
        }
    }
}

/// Child state records, shaped like the entity's children container.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChildren {
    /// Records keyed by property name, in insertion order.
    Group(Vec<(Arc<str>, StateRecord)>),
    /// Records in list order.
    List(Vec<StateRecord>),
}

impl StateChildren {
    /// Returns the number of child records.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Group(entries) => entries.len(),
            Self::List(items) => items.len(),
        }
    }

    /// Returns true if there are no child records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An attached entity addressed by id or by path.
#[derive(Debug, Clone)]
pub enum Target {
    /// A node id, checked for attachment on use.
    Node(NodeId),
    /// A path resolved from a registry root.
    Path(EntityPath),
}

/// Conversion into a removal/lookup target.
pub trait IntoTarget {
    /// Converts into a target.
    ///
    /// # Errors
    /// Returns the syntax or validation error of the underlying form.
    fn into_target(self) -> Result<Target>;
}

impl IntoTarget for NodeId {
    fn into_target(self) -> Result<Target> {
        Ok(Target::Node(self))
    }
}

impl IntoTarget for EntityPath {
    fn into_target(self) -> Result<Target> {
        Ok(Target::Path(self))
    }
}

impl IntoTarget for &EntityPath {
    fn into_target(self) -> Result<Target> {
        Ok(Target::Path(self.clone()))
    }
}

impl IntoTarget for &str {
    fn into_target(self) -> Result<Target> {
        Ok(Target::Path(EntityPath::parse(self)?))
    }
}

impl IntoTarget for String {
    fn into_target(self) -> Result<Target> {
        Ok(Target::Path(EntityPath::parse(&self)?))
    }
}

impl IntoTarget for Vec<Token> {
    fn into_target(self) -> Result<Target> {
        Ok(Target::Path(EntityPath::from_tokens(self)?))
    }
}

/// Owns named root entities and the shadow state tree.
///
/// The registry owns its [`EntityTree`]; detached entities live in the
/// same arena until they are attached under a root key or below an
/// attached node.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    tree: EntityTree,
    roots: Vec<(Arc<str>, NodeId)>,
    state: Vec<(Arc<str>, StateRecord)>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the owned tree, read-only.
    #[must_use]
    pub fn tree(&self) -> &EntityTree {
        &self.tree
    }

    /// Returns the owned tree for detached composition.
    ///
    /// Structural edits below an attached node must go through the
    /// registry, or its state tree will diverge from the hierarchy.
    #[must_use]
    pub fn tree_mut(&mut self) -> &mut EntityTree {
        &mut self.tree
    }

    /// Materializes a descriptor as a detached entity in this registry's
    /// arena.
    ///
    /// # Errors
    /// Propagates a failing init hook; a failed create leaves nothing
    /// behind.
    pub fn create(&mut self, descriptor: NodeDescriptor) -> Result<NodeId> {
        self.tree.create(descriptor)
    }

    /// Returns the root entries in attach order.
    #[must_use]
    pub fn roots(&self) -> &[(Arc<str>, NodeId)] {
        &self.roots
    }

    /// Resolves a root entity by key.
    #[must_use]
    pub fn root(&self, key: &str) -> Option<NodeId> {
        self.roots
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, id)| *id)
    }

    /// Returns the shadow state roots in attach order.
    #[must_use]
    pub fn state_roots(&self) -> &[(Arc<str>, StateRecord)] {
        &self.state
    }

    /// Attaches an entity at a path.
    ///
    /// The path names the destination parent plus the new entity's own
    /// token, with one disambiguation rule: a trailing index token is
    /// traversal, so the whole path must resolve to an existing list and
    /// the entity is appended to it. Use
    /// [`EntityRegistry::add_entity_with`] to insert at an explicit
    /// position instead.
    ///
    /// An empty parent remainder attaches a new root under the final key.
    /// On success the entire subtree is marked attached and its state is
    /// extracted into the shadow state tree.
    ///
    /// # Errors
    /// Fails without mutating anything if the path does not resolve, the
    /// token collides or mismatches the container, or the entity is
    /// already linked or attached.
    pub fn add_entity(
        &mut self,
        entity: impl Into<NodeRef>,
        path: impl IntoPath,
    ) -> Result<NodeId> {
        let path = path.into_path()?;
        self.attach(entity.into(), path, None)
    }

    /// Attaches an entity under an explicit token.
    ///
    /// The whole path is traversal; `token` is the new entity's own
    /// token. An index token inserts at that position in a list, shifting
    /// later siblings up.
    ///
    /// # Errors
    /// Same conditions as [`EntityRegistry::add_entity`].
    pub fn add_entity_with(
        &mut self,
        entity: impl Into<NodeRef>,
        path: impl IntoPath,
        token: Token,
    ) -> Result<NodeId> {
        let path = path.into_path()?;
        self.attach(entity.into(), path, Some(token))
    }

    fn attach(&mut self, entity: NodeRef, path: EntityPath, token: Option<Token>) -> Result<NodeId> {
        let (traverse, own) = resolve_target(path, token)?;
        if !traverse.is_empty() {
            let parent = self.get_entity(traverse)?;
            return self.add_child(parent, entity, own);
        }
        let Some(own) = own else {
            return Err(Error::empty_path());
        };
        let Token::Key(key) = own else {
            return Err(Error::token_mismatch("a property key for a root entity", ""));
        };
        if self.root(&key).is_some() {
            return Err(Error::duplicate_key(&*key, ""));
        }

        let id = match entity {
            NodeRef::Existing(id) => {
                let node = self.tree.node(id)?;
                if node.parent().is_some() {
                    return Err(Error::already_linked(node.path().to_string()));
                }
                if node.is_attached() {
                    return Err(Error::already_attached(node.path().to_string()));
                }
                id
            }
            NodeRef::Descriptor(descriptor) => self.tree.create(descriptor)?,
        };
        self.tree.set_root_token(id, Token::Key(key.clone()))?;
        self.roots.push((key, id));
        self.set_attached(id, true)?;
        self.extract(id)?;
        Ok(id)
    }

    /// Attaches an entity directly under a resolved parent.
    ///
    /// Token semantics follow [`EntityTree::add_entity`]. If the parent
    /// is attached, the new subtree is attached and extracted too;
    /// otherwise this is plain detached composition.
    ///
    /// # Errors
    /// Same conditions as [`EntityTree::add_entity`].
    pub fn add_child(
        &mut self,
        parent: NodeId,
        entity: impl Into<NodeRef>,
        token: Option<Token>,
    ) -> Result<NodeId> {
        let attached = self.tree.node(parent)?.is_attached();
        let id = self.tree.add_entity(parent, entity, token)?;
        if attached {
            self.set_attached(id, true)?;
            self.extract(id)?;
        }
        Ok(id)
    }

    /// Detaches an attached entity, keeping it alive.
    ///
    /// The subtree's state records are removed from the shadow state tree
    /// and embedded back into the nodes, reversing extraction exactly.
    /// The returned id is a standalone entity ready for reattachment.
    ///
    /// # Errors
    /// Fails if the target does not resolve to an attached entity.
    pub fn remove_entity(&mut self, target: impl IntoTarget) -> Result<NodeId> {
        let id = self.locate(target)?;
        let (parent, token) = self.linkage(id)?;
        let record = self.detach_record(parent, &token)?;
        match parent {
            Some(parent_id) => {
                self.tree.remove_entity(parent_id, &token)?;
            }
            None => {
                self.unlink_root(&token)?;
                self.tree.clear_root(id)?;
            }
        }
        self.set_attached(id, false)?;
        self.embed(id, record)?;
        Ok(id)
    }

    /// Detaches an attached entity and discards it entirely.
    ///
    /// Both the subtree and its state records are dropped; every id into
    /// the subtree becomes stale.
    ///
    /// # Errors
    /// Fails if the target does not resolve to an attached entity.
    pub fn delete_entity(&mut self, target: impl IntoTarget) -> Result<()> {
        let id = self.locate(target)?;
        let (parent, token) = self.linkage(id)?;
        let _ = self.detach_record(parent, &token)?;
        match parent {
            Some(parent_id) => self.tree.delete_entity(parent_id, &token),
            None => {
                self.unlink_root(&token)?;
                self.tree.despawn_subtree(id)
            }
        }
    }

    /// Detaches a direct child of a parent, keeping it alive.
    ///
    /// For an attached parent this is state-preserving removal; for a
    /// detached parent it is plain unlinking.
    ///
    /// # Errors
    /// Fails if the token resolves no child of the parent.
    pub fn remove_child(&mut self, parent: NodeId, token: &Token) -> Result<NodeId> {
        if self.tree.node(parent)?.is_attached() {
            let child = self
                .tree
                .node(parent)?
                .child(token)
                .ok_or_else(|| self.no_such_child(parent, token))?;
            self.remove_entity(child)
        } else {
            self.tree.remove_entity(parent, token)
        }
    }

    /// Discards a direct child of a parent.
    ///
    /// # Errors
    /// Fails if the token resolves no child of the parent.
    pub fn delete_child(&mut self, parent: NodeId, token: &Token) -> Result<()> {
        if self.tree.node(parent)?.is_attached() {
            let child = self
                .tree
                .node(parent)?
                .child(token)
                .ok_or_else(|| self.no_such_child(parent, token))?;
            self.delete_entity(child)
        } else {
            self.tree.delete_entity(parent, token)
        }
    }

    /// Resolves an attached entity by path.
    ///
    /// The first token must be a property key naming a root; remaining
    /// tokens descend through the hierarchy. Parent operators have no
    /// meaning from the registry.
    ///
    /// # Errors
    /// Fails on an unknown root or an unresolved descent step; descent
    /// errors name the last resolved entity.
    pub fn get_entity(&self, path: impl IntoPath) -> Result<NodeId> {
        let path = path.into_path()?;
        let Some((first, rest)) = path.split_first() else {
            return Err(Error::empty_path());
        };
        let Token::Key(key) = first else {
            return Err(Error::invalid_tokens(
                "registry paths must start with a root key",
            ));
        };
        let root = self
            .root(key)
            .ok_or_else(|| Error::root_not_found(&**key))?;
        self.tree.get_entity(root, rest)
    }

    /// Resolves a state record by path.
    ///
    /// Walks the shadow state tree directly, without touching nodes.
    ///
    /// # Errors
    /// Fails on an unknown root or a token that resolves no record.
    pub fn get_state(&self, path: impl IntoPath) -> Result<&StateRecord> {
        let path = path.into_path()?;
        let Some((first, rest)) = path.split_first() else {
            return Err(Error::empty_path());
        };
        let Token::Key(key) = first else {
            return Err(Error::invalid_tokens(
                "registry paths must start with a root key",
            ));
        };
        let mut record = self
            .state
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, record)| record)
            .ok_or_else(|| Error::root_not_found(&**key))?;
        let mut resolved = first.to_string();
        for token in rest {
            record = record.child(token).ok_or_else(|| {
                Error::child_not_found(token.to_string(), resolved.clone())
            })?;
            if token.is_key() {
                resolved.push('.');
            }
            resolved.push_str(&token.to_string());
        }
        Ok(record)
    }

    /// Invokes a named validator on an attached entity.
    ///
    /// # Errors
    /// Fails if the target does not resolve or the validator is missing;
    /// otherwise propagates the callback's result.
    pub fn call_validator(
        &mut self,
        target: impl IntoTarget,
        name: &str,
        args: &[Value],
    ) -> Result<Value> {
        let id = self.locate(target)?;
        self.tree.call_validator(id, name, args)
    }

    /// Invokes a named utility on an attached entity.
    ///
    /// # Errors
    /// Fails if the target does not resolve or the utility is missing;
    /// otherwise propagates the callback's result.
    pub fn call_util(
        &mut self,
        target: impl IntoTarget,
        name: &str,
        args: &[Value],
    ) -> Result<Value> {
        let id = self.locate(target)?;
        self.tree.call_util(id, name, args)
    }

    /// Invokes a named event handler on an attached entity.
    ///
    /// # Errors
    /// Fails if the target does not resolve or the handler is missing;
    /// otherwise propagates the callback's result.
    pub fn call_event(
        &mut self,
        target: impl IntoTarget,
        name: &str,
        args: &[Value],
    ) -> Result<Value> {
        let id = self.locate(target)?;
        self.tree.call_event(id, name, args)
    }

    fn locate(&self, target: impl IntoTarget) -> Result<NodeId> {
        match target.into_target()? {
            Target::Node(id) => {
                if !self.tree.node(id)?.is_attached() {
                    return Err(Error::not_attached(id));
                }
                Ok(id)
            }
            Target::Path(path) => self.get_entity(path),
        }
    }

    fn linkage(&self, id: NodeId) -> Result<(Option<NodeId>, Token)> {
        let node = self.tree.node(id)?;
        let token = node
            .token()
            .cloned()
            .ok_or_else(|| Error::internal("attached entity has no token"))?;
        Ok((node.parent(), token))
    }

    fn unlink_root(&mut self, token: &Token) -> Result<()> {
        let Token::Key(key) = token else {
            return Err(Error::internal("root entity without a key token"));
        };
        let Some(position) = self.roots.iter().position(|(k, _)| k == key) else {
            return Err(Error::root_not_found(&**key));
        };
        self.roots.remove(position);
        Ok(())
    }

    fn set_attached(&mut self, id: NodeId, attached: bool) -> Result<()> {
        self.tree.node_mut(id)?.attached = attached;
        for child in self.tree.child_ids(id)? {
            self.set_attached(child, attached)?;
        }
        Ok(())
    }

    /// Moves state out of the subtree into the shadow state tree.
    fn extract(&mut self, id: NodeId) -> Result<()> {
        let (parent, token) = {
            let node = self.tree.node(id)?;
            (node.parent(), node.token().cloned())
        };
        let record = self.drain_state(id)?;
        let Some(parent_id) = parent else {
            let Some(Token::Key(key)) = token else {
                return Err(Error::internal("root entity without a key token"));
            };
            self.state.push((key, record));
            return Ok(());
        };

        let parent_path = self.tree.node(parent_id)?.path().clone();
        let parent_record = self.state_record_mut(&parent_path)?;
        match (&mut parent_record.children, token) {
            (Some(StateChildren::Group(entries)), Some(Token::Key(key))) => {
                entries.push((key, record));
                Ok(())
            }
            (Some(StateChildren::List(items)), Some(Token::Index(index))) => {
                if index > items.len() {
                    return Err(Error::internal("state list diverged from the hierarchy"));
                }
                items.insert(index, record);
                Ok(())
            }
            _ => Err(Error::internal("state container diverged from the hierarchy")),
        }
    }

    fn drain_state(&mut self, id: NodeId) -> Result<StateRecord> {
        let shape = match self.tree.node(id)?.kind() {
            NodeKind::Leaf => None,
            NodeKind::Group { children } => Some(StateChildren::Group(
                children
                    .iter()
                    .map(|(key, _)| (key.clone(), StateRecord::default()))
                    .collect(),
            )),
            NodeKind::List { children } => Some(StateChildren::List(vec![
                StateRecord::default();
                children.len()
            ])),
        };
        let state = self.tree.node_mut(id)?.state.take();
        let children = match shape {
            None => None,
            Some(StateChildren::Group(mut entries)) => {
                let ids = self.tree.child_ids(id)?;
                for (slot, child) in entries.iter_mut().zip(ids) {
                    slot.1 = self.drain_state(child)?;
                }
                Some(StateChildren::Group(entries))
            }
            Some(StateChildren::List(mut items)) => {
                let ids = self.tree.child_ids(id)?;
                for (slot, child) in items.iter_mut().zip(ids) {
                    *slot = self.drain_state(child)?;
                }
                Some(StateChildren::List(items))
            }
        };
        Ok(StateRecord { state, children })
    }

    /// Moves state from a detached record back into the subtree.
    fn embed(&mut self, id: NodeId, record: StateRecord) -> Result<()> {
        let StateRecord { state, children } = record;
        self.tree.node_mut(id)?.state = state;
        match children {
            None => Ok(()),
            Some(StateChildren::Group(entries)) => {
                for (key, child_record) in entries {
                    let child = self
                        .tree
                        .node(id)?
                        .child(&Token::Key(key.clone()))
                        .ok_or_else(|| {
                            Error::internal(format!("no child \"{key}\" to embed state into"))
                        })?;
                    self.embed(child, child_record)?;
                }
                Ok(())
            }
            Some(StateChildren::List(items)) => {
                let ids = self.tree.child_ids(id)?;
                if ids.len() != items.len() {
                    return Err(Error::internal("state list diverged from the hierarchy"));
                }
                for (child, child_record) in ids.into_iter().zip(items) {
                    self.embed(child, child_record)?;
                }
                Ok(())
            }
        }
    }

    /// Removes the record for the entity linked at `token` under `parent`.
    fn detach_record(&mut self, parent: Option<NodeId>, token: &Token) -> Result<StateRecord> {
        let Some(parent_id) = parent else {
            let Token::Key(key) = token else {
                return Err(Error::internal("root entity without a key token"));
            };
            let Some(position) = self.state.iter().position(|(k, _)| k == key) else {
                return Err(Error::internal("state record missing for root entity"));
            };
            return Ok(self.state.remove(position).1);
        };

        let parent_path = self.tree.node(parent_id)?.path().clone();
        let parent_record = self.state_record_mut(&parent_path)?;
        match (&mut parent_record.children, token) {
            (Some(StateChildren::Group(entries)), Token::Key(key)) => {
                let Some(position) = entries.iter().position(|(k, _)| k == key) else {
                    return Err(Error::internal("state record missing for child entity"));
                };
                Ok(entries.remove(position).1)
            }
            (Some(StateChildren::List(items)), Token::Index(index)) => {
                if *index >= items.len() {
                    return Err(Error::internal("state list diverged from the hierarchy"));
                }
                Ok(items.remove(*index))
            }
            _ => Err(Error::internal("state container diverged from the hierarchy")),
        }
    }

    fn state_record_mut(&mut self, path: &EntityPath) -> Result<&mut StateRecord> {
        let Some((first, rest)) = path.split_first() else {
            return Err(Error::empty_path());
        };
        let Token::Key(key) = first else {
            return Err(Error::invalid_tokens(
                "registry paths must start with a root key",
            ));
        };
        let mut record = self
            .state
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, record)| record)
            .ok_or_else(|| Error::root_not_found(&**key))?;
        for token in rest {
            record = record.child_mut(token).ok_or_else(|| {
                Error::internal(format!("state record missing for token {token}"))
            })?;
        }
        Ok(record)
    }

    fn no_such_child(&self, parent: NodeId, token: &Token) -> Error {
        let path = self
            .tree
            .node(parent)
            .map(|node| node.path().to_string())
            .unwrap_or_default();
        Error::child_not_found(token.to_string(), path)
    }
}

/// Splits an attach path into traversal tokens and the new entity's own
/// token. A trailing index token stays in the traversal: the path names
/// an existing list and the entity is appended to it.
fn resolve_target(path: EntityPath, token: Option<Token>) -> Result<(EntityPath, Option<Token>)> {
    if let Some(token) = token {
        return Ok((path, Some(token)));
    }
    match path.split_last() {
        None | Some((Token::Index(_), _)) => Ok((path, None)),
        Some((last, init)) => {
            let own = last.clone();
            let traverse = EntityPath::from_tokens(init.to_vec())?;
            Ok((traverse, Some(own)))
        }
    }
}
