//! View Model - external view representation and conversion
//!
//! This crate holds the element tree the document is exchanged as, reads and
//! writes it as markup, and dispatches per-node converters between the view
//! and the document model.

mod view;
mod markup;
mod conversion;
mod error;

pub use view::*;
pub use markup::*;
pub use conversion::*;
pub use error::*;
