//! Cross-layer integration tests for Trellis
//!
//! Tests that drive paths, the hierarchy engine, and the registry
//! together through realistic lifecycles.

mod lifecycle;
