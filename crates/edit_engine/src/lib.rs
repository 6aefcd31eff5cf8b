//! Edit Engine - Commands, change batches and the data pipeline
//!
//! This crate hosts the editing loop: commands and external edits are
//! applied to a draft tree, repaired by the registered post-fixers and then
//! committed as one unit.

mod command;
mod executor;
mod error;

pub use command::*;
pub use executor::*;
pub use error::*;
