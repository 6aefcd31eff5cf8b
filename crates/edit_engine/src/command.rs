//! Command system for document editing

use doc_model::{DocumentTree, Schema, Selection};

/// Result of applying a command
#[derive(Debug)]
pub struct CommandResult {
    /// The new document tree after the command
    pub tree: DocumentTree,
    /// The new selection after the command
    pub selection: Selection,
}

/// Trait for all editing commands.
///
/// Commands work on a copy of the tree; the engine only adopts the copy once
/// the post-fixers have settled, so a failing command changes nothing.
pub trait Command: std::fmt::Debug + Send + Sync {
    /// Apply this command to a document
    fn apply(
        &self,
        tree: &DocumentTree,
        selection: &Selection,
        schema: &Schema,
    ) -> crate::Result<CommandResult>;

    /// Get a display name for this command
    fn display_name(&self) -> &str;
}

/// Builds a command from the single argument of a named command invocation
pub type CommandFactory = Box<dyn Fn(&str) -> Box<dyn Command> + Send + Sync>;
