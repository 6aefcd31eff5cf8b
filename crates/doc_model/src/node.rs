//! Model nodes stored in the document tree

use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the document root element
pub const ROOT_NAME: &str = "$root";

/// Name reported for text nodes
pub const TEXT_NAME: &str = "$text";

/// What a model node holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A named element; the name is the schema item it belongs to
    Element { name: String },
    /// A run of text
    Text { data: String },
}

/// A single node of the document tree.
///
/// Nodes live in the [`DocumentTree`](crate::DocumentTree) arena and refer
/// to each other by [`NodeId`]. Only the tree mutates the links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelNode {
    pub(crate) id: NodeId,
    pub(crate) kind: NodeKind,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl ModelNode {
    pub(crate) fn element(name: impl Into<String>, attributes: BTreeMap<String, String>) -> Self {
        Self {
            id: NodeId::new(),
            kind: NodeKind::Element { name: name.into() },
            attributes,
            children: Vec::new(),
            parent: None,
        }
    }

    pub(crate) fn text(data: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            kind: NodeKind::Text { data: data.into() },
            attributes: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// Get the unique ID of this node
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The element name, or `$text` for text nodes
    pub fn name(&self) -> &str {
        match &self.kind {
            NodeKind::Element { name } => name,
            NodeKind::Text { .. } => TEXT_NAME,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    /// Text content for text nodes
    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { data } => Some(data),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Get the IDs of child nodes
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Get the ID of the parent node (None for the root and detached nodes)
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// A detached element description produced by converters and commands
/// before it is materialized in a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
}

impl ModelElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
