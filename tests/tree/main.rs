//! Integration tests for Layer 2: Tree
//!
//! Tests for descriptor materialization, hierarchy maintenance, and
//! relative traversal.

mod traversal;
