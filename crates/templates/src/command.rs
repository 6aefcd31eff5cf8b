//! The `template` command: inserts a fresh template instance

use crate::{materialize, TemplateError, TemplateRegistry};
use doc_model::{DocumentTree, Position, Schema, Selection};
use edit_engine::{Command, CommandResult, EditError};
use std::sync::Arc;

/// Name the command is registered under
pub const COMMAND_NAME: &str = "template";

/// Find where an element named `name` can be inserted for a caret at `focus`.
///
/// Starts at the focus and climbs the ancestors until one admits the
/// element. Climbing out of a node places the insertion after it, or before
/// it when the caret sits at offset 0. Object elements are never left.
pub fn find_insertion_position(
    tree: &DocumentTree,
    schema: &Schema,
    focus: Position,
    name: &str,
) -> Option<Position> {
    if !focus.is_valid(tree) {
        return None;
    }

    let mut position = focus;
    loop {
        let parent_name = tree.name(position.node_id)?;
        if schema.check_child(parent_name, name) {
            return Some(position);
        }
        if schema.is_object(parent_name) {
            return None;
        }

        let parent = tree.parent(position.node_id)?;
        let index = tree.index_in_parent(position.node_id)?;
        let offset = if position.offset == 0 { index } else { index + 1 };
        position = Position::new(parent, offset);
    }
}

/// Insert the template named `target` at the selection focus
#[derive(Debug, Clone)]
pub struct InsertTemplate {
    registry: Arc<TemplateRegistry>,
    target: String,
}

impl InsertTemplate {
    pub fn new(registry: Arc<TemplateRegistry>, target: impl Into<String>) -> Self {
        Self {
            registry,
            target: target.into(),
        }
    }
}

impl Command for InsertTemplate {
    fn apply(
        &self,
        tree: &DocumentTree,
        selection: &Selection,
        schema: &Schema,
    ) -> edit_engine::Result<CommandResult> {
        let root = self.registry.root_of(&self.target).ok_or_else(|| {
            EditError::command_failed(COMMAND_NAME, TemplateError::UnknownTemplate(self.target.clone()))
        })?;
        let position = find_insertion_position(tree, schema, selection.focus, root.name())
            .ok_or_else(|| {
                EditError::command_failed(COMMAND_NAME, TemplateError::InvalidPosition(self.target.clone()))
            })?;

        let mut new_tree = tree.clone();
        let instance = materialize(&self.registry, &mut new_tree, root)?;
        new_tree.insert_child(position.node_id, position.offset, instance)?;
        tracing::debug!(
            template = %self.target,
            parent = %position.node_id,
            offset = position.offset,
            "template inserted"
        );

        Ok(CommandResult {
            tree: new_tree,
            selection: Selection::collapsed(Position::new(position.node_id, position.offset + 1)),
        })
    }

    fn display_name(&self) -> &str {
        "Insert Template"
    }
}
