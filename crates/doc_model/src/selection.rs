//! Selection model - caret and range positions

use crate::{DocumentTree, NodeId};
use serde::{Deserialize, Serialize};

/// A position in the document tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// The element containing this position
    pub node_id: NodeId,
    /// Child index within the element
    pub offset: usize,
}

impl Position {
    /// Create a new position
    pub fn new(node_id: NodeId, offset: usize) -> Self {
        Self { node_id, offset }
    }

    /// Create a position at the start of a node
    pub fn start_of(node_id: NodeId) -> Self {
        Self { node_id, offset: 0 }
    }

    /// Create a position after the last child of a node
    pub fn end_of(tree: &DocumentTree, node_id: NodeId) -> Self {
        Self {
            node_id,
            offset: tree.children(node_id).len(),
        }
    }

    /// Check the position refers to an existing element and an offset in range
    pub fn is_valid(&self, tree: &DocumentTree) -> bool {
        tree.get(self.node_id)
            .is_some_and(|node| node.is_element() && self.offset <= node.children().len())
    }
}

/// A selection in the document
///
/// A selection has an anchor (where the selection started) and a focus
/// (where the selection ends / where the caret is). When anchor == focus,
/// the selection is collapsed (just a caret).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Where the selection started
    pub anchor: Position,
    /// Where the selection ends (caret position)
    pub focus: Position,
}

impl Selection {
    /// Create a new selection
    pub fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    /// Create a collapsed selection (caret only)
    pub fn collapsed(position: Position) -> Self {
        Self {
            anchor: position,
            focus: position,
        }
    }

    /// Create a selection at the start of a node
    pub fn at_start_of(node_id: NodeId) -> Self {
        Self::collapsed(Position::start_of(node_id))
    }

    /// Check if this selection is collapsed (just a caret)
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_collapsed_selection() {
        let id = NodeId::new();
        let selection = Selection::at_start_of(id);
        assert!(selection.is_collapsed());
        assert_eq!(selection.focus, Position::new(id, 0));
    }

    #[test]
    fn test_position_validity() {
        let mut tree = DocumentTree::new();
        let root = tree.root_id();
        let para = tree.create_element("paragraph", BTreeMap::new());
        tree.append_child(root, para).unwrap();

        assert!(Position::end_of(&tree, root).is_valid(&tree));
        assert!(!Position::new(root, 2).is_valid(&tree));
        assert!(!Position::start_of(NodeId::new()).is_valid(&tree));
    }
}
