//! Path-addressing grammar and engine for Trellis.
//!
//! A path identifies a location in an entity tree as an ordered sequence
//! of [`Token`]s: property keys, non-negative indices, and an optional
//! leading parent-operator. [`EntityPath`] parses, validates, composes,
//! and stringifies these sequences.
//!
//! ```
//! use trellis_path::EntityPath;
//!
//! let path = EntityPath::parse("top.items[2].label").unwrap();
//! assert_eq!(path.to_string(), "top.items[2].label");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod path;
mod token;
mod tokenizer;

pub use path::{EntityPath, IntoPath, PathPart};
pub use token::Token;
