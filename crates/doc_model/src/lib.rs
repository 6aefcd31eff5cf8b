//! Document Model - Core document tree structure and types
//!
//! This crate provides the host document model: an arena tree of named
//! elements and text with stable node IDs, change tracking, a schema
//! registry and the post-fixer loop that runs after every change batch.

mod node;
mod node_id;
mod tree;
mod error;
mod selection;
pub mod schema;
pub mod postfixer;

pub use node::*;
pub use node_id::*;
pub use tree::*;
pub use error::*;
pub use selection::*;
pub use schema::*;
pub use postfixer::*;
