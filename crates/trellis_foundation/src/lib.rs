//! Core types, payload values, and errors for Trellis.
//!
//! This crate provides:
//! - [`Value`] - The opaque payload type for entity state and attributes
//! - [`NodeId`] - Generational node identifiers
//! - [`Error`] - Rich error types grouped into four classes
//! - [`Result`] - The crate-wide result alias

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod node;
mod value;

pub use error::{Error, ErrorClass, ErrorKind};
pub use node::NodeId;
pub use value::Value;

/// Result type alias using the Trellis error type.
pub type Result<T> = std::result::Result<T, Error>;
