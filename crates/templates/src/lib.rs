//! Templates - structured, reusable blocks for the editor
//!
//! Each configured template is a fragment of markup. At startup the
//! fragment is turned into a tree of [`ElementDescriptor`]s, one per
//! element, held by a [`TemplateRegistry`]. The descriptors drive
//! everything else:
//! - conversion between view elements and model elements, both directions
//! - the integrity post-fixer that keeps inserted instances in shape
//! - the `template` command that inserts a fresh instance
//!
//! [`TemplatePlugin`] installs all of it into an [`edit_engine::EditingEngine`].

mod config;
mod descriptor;
mod registry;
mod conversion;
mod postfixer;
mod command;
mod plugin;
mod error;

pub use config::*;
pub use descriptor::*;
pub use registry::*;
pub use conversion::*;
pub use postfixer::*;
pub use command::*;
pub use plugin::*;
pub use error::*;
