//! Integration tests for Layer 2: Registry
//!
//! Tests for attachment, the extract/embed state protocol, and shadow
//! state lookup.

mod attachment;
mod state_protocol;
