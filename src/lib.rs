//! Trellis - Entity tree composition
//!
//! This crate re-exports all layers of the Trellis system for convenient
//! access. For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: trellis_tree       — Hierarchy engine, descriptors, registry
//! Layer 1: trellis_path       — Token grammar, tokenizer, path algebra
//! Layer 0: trellis_foundation — Core types (Value, NodeId, Error)
//! ```

pub use trellis_foundation as foundation;
pub use trellis_path as path;
pub use trellis_tree as tree;
