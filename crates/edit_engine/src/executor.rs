//! Command execution engine

use crate::{Command, CommandFactory, EditError, Result};
use doc_model::{DocumentTree, PostFixers, Position, Schema, Selection};
use std::collections::HashMap;
use view_model::{parse_markup, to_markup, Conversion, DowncastMode, ViewNode};

/// The main editing engine that manages document state and command execution.
///
/// Every mutation, whether a command, an external change batch or loading
/// data, is applied to a draft tree and followed by the post-fixer loop. The
/// draft replaces the document only when both succeed.
pub struct EditingEngine {
    /// Current document tree
    tree: DocumentTree,
    /// Current selection
    selection: Selection,
    schema: Schema,
    conversion: Conversion,
    post_fixers: PostFixers,
    commands: HashMap<String, CommandFactory>,
}

impl EditingEngine {
    /// Create a new editing engine with an empty document
    pub fn new() -> Self {
        Self::with_tree(DocumentTree::new())
    }

    /// Create an editing engine with a specific document tree
    pub fn with_tree(tree: DocumentTree) -> Self {
        let selection = Selection::at_start_of(tree.root_id());
        Self {
            tree,
            selection,
            schema: Schema::new(),
            conversion: Conversion::new(),
            post_fixers: PostFixers::new(),
            commands: HashMap::new(),
        }
    }

    /// Get the current document tree
    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    /// Get the current selection
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Set the selection; both ends must point into the current tree
    pub fn set_selection(&mut self, selection: Selection) -> Result<()> {
        if !selection.anchor.is_valid(&self.tree) || !selection.focus.is_valid(&self.tree) {
            return Err(EditError::InvalidCommand(format!(
                "Selection does not fit the document: {selection:?}"
            )));
        }
        self.selection = selection;
        Ok(())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    pub fn conversion(&self) -> &Conversion {
        &self.conversion
    }

    pub fn conversion_mut(&mut self) -> &mut Conversion {
        &mut self.conversion
    }

    pub fn post_fixers_mut(&mut self) -> &mut PostFixers {
        &mut self.post_fixers
    }

    /// Register a named command
    pub fn register_command(&mut self, name: impl Into<String>, factory: CommandFactory) {
        let name = name.into();
        tracing::debug!(command = %name, "command registered");
        self.commands.insert(name, factory);
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Execute a command
    pub fn execute(&mut self, command: &dyn Command) -> Result<()> {
        tracing::debug!(command = command.display_name(), "executing command");
        let mut result = command.apply(&self.tree, &self.selection, &self.schema)?;
        self.post_fixers.run(&mut result.tree)?;
        self.commit(result.tree, result.selection);
        Ok(())
    }

    /// Execute a registered command by name with its single argument
    pub fn execute_named(&mut self, name: &str, argument: &str) -> Result<()> {
        let factory = self
            .commands
            .get(name)
            .ok_or_else(|| EditError::UnknownCommand(name.to_string()))?;
        let command = factory(argument);
        self.execute(command.as_ref())
    }

    /// Apply an external batch of edits, then let the post-fixers repair it
    pub fn change<T, F>(&mut self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut DocumentTree) -> doc_model::Result<T>,
    {
        let mut draft = self.tree.clone();
        let output = edit(&mut draft)?;
        self.post_fixers.run(&mut draft)?;
        let selection = self.selection;
        self.commit(draft, selection);
        Ok(output)
    }

    /// Replace the document with the given markup
    pub fn set_data(&mut self, markup: &str) -> Result<()> {
        let nodes = parse_markup(markup)?;
        let mut draft = DocumentTree::new();
        let root = draft.root_id();
        self.conversion.upcast(&nodes, &mut draft, &self.schema, root)?;
        self.post_fixers.run(&mut draft)?;
        tracing::debug!(nodes = draft.node_count(), "document data loaded");
        self.commit(draft, Selection::at_start_of(root));
        Ok(())
    }

    /// Serialize the document as persisted markup
    pub fn get_data(&self) -> String {
        to_markup(&self.conversion.downcast(&self.tree, self.tree.root_id(), DowncastMode::Data))
    }

    /// The view shown while editing
    pub fn editing_view(&self) -> Vec<ViewNode> {
        self.conversion
            .downcast(&self.tree, self.tree.root_id(), DowncastMode::Editing)
    }

    fn commit(&mut self, tree: DocumentTree, selection: Selection) {
        self.tree = tree;
        self.selection = if selection.anchor.is_valid(&self.tree) && selection.focus.is_valid(&self.tree) {
            selection
        } else {
            Selection::collapsed(Position::end_of(&self.tree, self.tree.root_id()))
        };
    }
}

impl Default for EditingEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandResult;
    use doc_model::{ChangeSet, PostFixer, PARAGRAPH_NAME};
    use std::collections::BTreeMap;

    /// Inserts an empty paragraph at a fixed position
    #[derive(Debug)]
    struct InsertParagraph {
        position: Position,
    }

    impl InsertParagraph {
        fn new(position: Position) -> Self {
            Self { position }
        }
    }

    impl Command for InsertParagraph {
        fn apply(&self, tree: &DocumentTree, _selection: &Selection, schema: &Schema) -> Result<CommandResult> {
            let parent = self.position.node_id;
            let parent_name = tree
                .name(parent)
                .ok_or_else(|| EditError::InvalidCommand(format!("Unknown node {parent}")))?;
            if !schema.check_child(parent_name, PARAGRAPH_NAME) {
                return Err(EditError::InvalidCommand(format!(
                    "A paragraph is not allowed in '{parent_name}'"
                )));
            }

            let mut new_tree = tree.clone();
            let paragraph = new_tree.create_element(PARAGRAPH_NAME, BTreeMap::new());
            new_tree.insert_child(parent, self.position.offset, paragraph)?;
            Ok(CommandResult {
                tree: new_tree,
                selection: Selection::at_start_of(paragraph),
            })
        }

        fn display_name(&self) -> &str {
            "Insert Paragraph"
        }
    }

    /// Gives every paragraph an `id` attribute
    struct IdFixer;

    impl PostFixer for IdFixer {
        fn name(&self) -> &str {
            "ids"
        }

        fn fix(&self, tree: &mut DocumentTree, changed: &ChangeSet) -> ChangeSet {
            let mut touched = ChangeSet::new();
            for id in changed.iter() {
                let missing = tree.get(id).is_some_and(|node| node.attribute("id").is_none());
                if missing && tree.set_attribute(id, "id", "p").is_ok() {
                    touched.insert(id);
                }
            }
            touched
        }
    }

    fn engine_with_fixer() -> EditingEngine {
        let mut engine = EditingEngine::new();
        engine.post_fixers_mut().register(
            Some([PARAGRAPH_NAME.to_string()].into_iter().collect()),
            Box::new(IdFixer),
        );
        engine
    }

    #[test]
    fn test_set_and_get_data() {
        let mut engine = EditingEngine::new();
        engine.set_data("<p>One</p><p>Two</p>").unwrap();
        assert_eq!(engine.get_data(), "<p>One</p><p>Two</p>");

        // inline markup without a converter is unwrapped, its spacing is not
        engine.set_data("<p>Hello <b>big</b> world</p>").unwrap();
        assert_eq!(engine.get_data(), "<p>Hello big world</p>");
    }

    #[test]
    fn test_set_data_rejects_malformed_markup() {
        let mut engine = EditingEngine::new();
        engine.set_data("<p>kept</p>").unwrap();
        assert!(matches!(engine.set_data("<p>broken"), Err(EditError::View(_))));
        assert_eq!(engine.get_data(), "<p>kept</p>");
    }

    #[test]
    fn test_execute_runs_post_fixers() {
        let mut engine = engine_with_fixer();
        let root = engine.tree().root_id();
        engine
            .execute(&InsertParagraph::new(Position::start_of(root)))
            .unwrap();

        let paragraph = engine.tree().children(root)[0];
        assert_eq!(engine.tree().get(paragraph).unwrap().attribute("id"), Some("p"));
        assert_eq!(engine.selection(), Selection::at_start_of(paragraph));
        assert!(engine.tree().changes().is_empty());
    }

    #[test]
    fn test_failed_command_changes_nothing() {
        let mut engine = engine_with_fixer();
        engine.set_data("<p>a</p>").unwrap();
        let root = engine.tree().root_id();
        let paragraph = engine.tree().children(root)[0];
        let before = engine.get_data();

        let result = engine.execute(&InsertParagraph::new(Position::start_of(paragraph)));
        assert!(matches!(result, Err(EditError::InvalidCommand(_))));
        let result = engine.execute(&InsertParagraph::new(Position::new(root, 5)));
        assert!(matches!(result, Err(EditError::DocModel(_))));
        assert_eq!(engine.get_data(), before);
    }

    #[test]
    fn test_named_commands() {
        let mut engine = EditingEngine::new();
        engine.register_command(
            "paragraph",
            Box::new(|_argument: &str| {
                Box::new(InsertParagraph::new(Position::start_of(doc_model::NodeId::new())))
                    as Box<dyn Command>
            }),
        );
        assert!(engine.has_command("paragraph"));
        assert!(matches!(
            engine.execute_named("missing", ""),
            Err(EditError::UnknownCommand(_))
        ));
        // the factory points at a node that does not exist
        assert!(engine.execute_named("paragraph", "").is_err());
    }

    #[test]
    fn test_change_is_atomic_on_error() {
        let mut engine = EditingEngine::new();
        engine.set_data("<p>a</p>").unwrap();
        let root = engine.tree().root_id();

        let result: Result<()> = engine.change(|tree| {
            let first = tree.children(root)[0];
            tree.remove(first)?;
            tree.insert_child(root, 10, first)
        });
        assert!(result.is_err());
        assert_eq!(engine.get_data(), "<p>a</p>");
    }

    #[test]
    fn test_change_resets_stale_selection() {
        let mut engine = EditingEngine::new();
        engine.set_data("<p>a</p>").unwrap();
        let root = engine.tree().root_id();
        let paragraph = engine.tree().children(root)[0];
        engine.set_selection(Selection::at_start_of(paragraph)).unwrap();

        engine.change(|tree| tree.remove(paragraph)).unwrap();
        assert_eq!(engine.selection(), Selection::at_start_of(root));
    }
}
