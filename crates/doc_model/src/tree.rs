//! Document tree storage, mutation primitives and change tracking

use crate::{DocModelError, ModelNode, NodeId, Result, ROOT_NAME};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Insertion-ordered set of node ids touched by a batch of mutations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    order: Vec<NodeId>,
    seen: HashSet<NodeId>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a node, returns false if it was already recorded
    pub fn insert(&mut self, id: NodeId) -> bool {
        if self.seen.insert(id) {
            self.order.push(id);
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, id: NodeId) -> bool {
        if self.seen.remove(&id) {
            self.order.retain(|&other| other != id);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.seen.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }
}

impl Extend<NodeId> for ChangeSet {
    fn extend<I: IntoIterator<Item = NodeId>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}

impl FromIterator<NodeId> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// The complete document tree structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTree {
    root: NodeId,
    nodes: HashMap<NodeId, ModelNode>,
    #[serde(skip)]
    changes: ChangeSet,
}

impl DocumentTree {
    /// Create a new tree holding only the `$root` element
    pub fn new() -> Self {
        let root = ModelNode::element(ROOT_NAME, BTreeMap::new());
        let root_id = root.id();
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);
        Self {
            root: root_id,
            nodes,
            changes: ChangeSet::new(),
        }
    }

    /// Get the document root ID
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&ModelNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Name of a node, `$text` for text nodes
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).map(ModelNode::name)
    }

    /// Child IDs of a node, empty for unknown nodes
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(ModelNode::children).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(ModelNode::parent)
    }

    /// Total number of nodes in the arena, detached ones included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// Ancestors of a node, nearest first
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            result.push(ancestor);
            current = self.parent(ancestor);
        }
        result
    }

    /// All descendants of a node in document order (pre-order), excluding the node itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        result
    }

    /// Whether the node is connected to the document root
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).last() == Some(&self.root)
    }

    /// Create a detached element. It becomes part of the document once inserted.
    pub fn create_element(
        &mut self,
        name: impl Into<String>,
        attributes: BTreeMap<String, String>,
    ) -> NodeId {
        let node = ModelNode::element(name, attributes);
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Create a detached text node
    pub fn create_text(&mut self, data: impl Into<String>) -> NodeId {
        let node = ModelNode::text(data);
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Insert a detached node into `parent` at `index`
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        if child == self.root {
            return Err(DocModelError::InvalidOperation(
                "The root cannot be inserted".into(),
            ));
        }
        if child == parent || self.ancestors(parent).contains(&child) {
            return Err(DocModelError::TreeStructureError(format!(
                "Inserting {child} into {parent} would create a cycle"
            )));
        }

        let child_node = self
            .nodes
            .get(&child)
            .ok_or(DocModelError::NodeNotFound(child.as_uuid()))?;
        if child_node.parent.is_some() {
            return Err(DocModelError::InvalidOperation(format!(
                "Node {child} is already attached"
            )));
        }

        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(DocModelError::NodeNotFound(parent.as_uuid()))?;
        if !parent_node.is_element() {
            return Err(DocModelError::InvalidOperation(
                "Text nodes cannot have children".into(),
            ));
        }
        if index > parent_node.children.len() {
            return Err(DocModelError::InvalidPosition {
                node_id: parent.as_uuid(),
                offset: index,
            });
        }
        parent_node.children.insert(index, child);

        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = Some(parent);
        }

        self.changes.insert(parent);
        self.changes.insert(child);
        Ok(())
    }

    /// Append a detached node as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Detach a node from its parent, keeping its subtree in the arena
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(DocModelError::NodeNotFound(id.as_uuid()))?;
        let Some(parent) = node.parent.take() else {
            return Ok(());
        };

        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.retain(|&child| child != id);
        }
        self.changes.remove(id);
        self.changes.insert(parent);
        Ok(())
    }

    /// Move an attached or detached node to `index` within `parent`.
    /// `index` counts the parent's children without the moved node.
    /// A rejected move leaves the node where it was.
    pub fn move_to(&mut self, id: NodeId, parent: NodeId, index: usize) -> Result<()> {
        if id == self.root {
            return Err(DocModelError::InvalidOperation(
                "The root cannot be moved".into(),
            ));
        }
        if id == parent || self.ancestors(parent).contains(&id) {
            return Err(DocModelError::TreeStructureError(format!(
                "Moving {id} into {parent} would create a cycle"
            )));
        }
        let parent_node = self
            .nodes
            .get(&parent)
            .ok_or(DocModelError::NodeNotFound(parent.as_uuid()))?;
        let available = parent_node.children.len() - usize::from(self.parent(id) == Some(parent));
        if !parent_node.is_element() || index > available {
            return Err(DocModelError::InvalidPosition {
                node_id: parent.as_uuid(),
                offset: index,
            });
        }

        self.detach(id)?;
        self.insert_child(parent, index, id)
    }

    /// Remove a node and its whole subtree from the document
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(DocModelError::InvalidOperation(
                "The root cannot be removed".into(),
            ));
        }
        self.detach(id)?;

        let mut doomed = self.descendants(id);
        doomed.push(id);
        for node in doomed {
            self.nodes.remove(&node);
            self.changes.remove(node);
        }
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(DocModelError::NodeNotFound(id.as_uuid()))?;
        node.attributes.insert(key.into(), value.into());
        self.changes.insert(id);
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, key: &str) -> Result<Option<String>> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(DocModelError::NodeNotFound(id.as_uuid()))?;
        let previous = node.attributes.remove(key);
        if previous.is_some() {
            self.changes.insert(id);
        }
        Ok(previous)
    }

    /// Nodes touched since the last call to [`take_changes`](Self::take_changes)
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Drain the recorded changes
    pub fn take_changes(&mut self) -> ChangeSet {
        std::mem::take(&mut self.changes)
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}
