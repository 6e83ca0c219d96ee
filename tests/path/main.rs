//! Integration tests for Layer 1: Path
//!
//! Tests for the token grammar, tokenizer, and path algebra.

mod path_algebra;
mod tokenizer;
