//! Entity hierarchy engine and state registry for Trellis.
//!
//! This crate provides:
//! - [`EntityTree`] - An arena of [`Node`]s maintaining parent/child/path
//!   invariants under insertion, removal, and re-indexing
//! - [`NodeDescriptor`] - Declarative node construction
//! - [`EntityRegistry`] - Root ownership plus the two-way extract/embed
//!   protocol that moves state between nodes and the shadow state tree

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod descriptor;
mod node;
mod registry;
mod tree;

pub use descriptor::NodeDescriptor;
pub use node::{ElementHandle, InitFn, Node, NodeCallback, NodeKind};
pub use registry::{EntityRegistry, IntoTarget, StateChildren, StateRecord, Target};
pub use tree::{EntityTree, NodeRef};
