//! Integrity post-fixer: keeps template nodes in their declared shape
//!
//! A template node whose descriptor has children must hold exactly one
//! child per descriptor child, in descriptor order. Anything else inside it
//! is removed, missing children are materialized, misplaced ones are moved.
//! A nested template node found outside its parent template is removed.
//! Each node is fully corrected before the next one is looked at.

use crate::{ElementDescriptor, RepairSkipped, TemplateRegistry};
use doc_model::{ChangeSet, DocumentTree, NodeId, PostFixer};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Create a detached model subtree mirroring a descriptor and its descendants.
///
/// Allowed attributes start at their declared values. The result already
/// has the full required shape, so it never needs repairing itself.
pub fn materialize(
    registry: &TemplateRegistry,
    tree: &mut DocumentTree,
    descriptor: &ElementDescriptor,
) -> doc_model::Result<NodeId> {
    let attributes: BTreeMap<String, String> = descriptor
        .allowed_attributes()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    let node = tree.create_element(descriptor.name(), attributes);

    for (index, &child_id) in descriptor.children().iter().enumerate() {
        let Some(child) = registry.get(child_id) else {
            report_skipped(descriptor, index);
            continue;
        };
        let child_node = materialize(registry, tree, child)?;
        tree.append_child(node, child_node)?;
    }
    Ok(node)
}

fn report_skipped(descriptor: &ElementDescriptor, index: usize) {
    let skipped = RepairSkipped {
        parent: descriptor.name().to_string(),
        child: index,
    };
    tracing::warn!(%skipped, "missing child descriptor");
}

/// The post-fixer registered for template element names
pub struct IntegrityPostfixer {
    registry: Arc<TemplateRegistry>,
}

impl IntegrityPostfixer {
    pub fn new(registry: Arc<TemplateRegistry>) -> Self {
        Self { registry }
    }

    /// Repair every changed template node and its template subtree.
    ///
    /// Returns the nodes that were modified or inserted; an empty set means
    /// the tree was already consistent.
    pub fn repair(&self, tree: &mut DocumentTree, changed: &ChangeSet) -> ChangeSet {
        let mut touched = ChangeSet::new();
        for id in changed.iter() {
            // an earlier repair in this pass may have removed it
            if !tree.contains(id) {
                continue;
            }
            if self.is_misplaced(tree, id) {
                self.remove_misplaced(tree, id, &mut touched);
            } else {
                self.repair_node(tree, id, &mut touched);
            }
        }
        touched
    }

    /// A nested template node attached anywhere but under its parent template
    fn is_misplaced(&self, tree: &DocumentTree, node: NodeId) -> bool {
        let Some(descriptor) = tree.name(node).and_then(|name| self.registry.lookup_by_name(name)) else {
            return false;
        };
        let Some(expected) = descriptor.parent().and_then(|id| self.registry.get(id)) else {
            return false;
        };
        match tree.parent(node) {
            Some(parent) => tree.name(parent) != Some(expected.name()),
            None => false,
        }
    }

    fn remove_misplaced(&self, tree: &mut DocumentTree, node: NodeId, touched: &mut ChangeSet) {
        let parent = tree.parent(node);
        let name = tree.name(node).unwrap_or_default().to_string();
        match tree.remove(node) {
            Ok(()) => {
                tracing::debug!(element = %name, "removed template element outside its template");
                if let Some(parent) = parent {
                    touched.insert(parent);
                }
            }
            Err(err) => tracing::warn!(element = %name, %err, "could not remove misplaced element"),
        }
    }

    fn repair_node(&self, tree: &mut DocumentTree, node: NodeId, touched: &mut ChangeSet) {
        let registry: &TemplateRegistry = &self.registry;
        let Some(descriptor) = tree.name(node).and_then(|name| registry.lookup_by_name(name)) else {
            return;
        };
        if descriptor.children().is_empty() {
            return;
        }

        let mut required: Vec<&ElementDescriptor> = Vec::with_capacity(descriptor.children().len());
        for (index, &child_id) in descriptor.children().iter().enumerate() {
            match registry.get(child_id) {
                Some(child) => required.push(child),
                None => report_skipped(descriptor, index),
            }
        }

        // Closed shape: only the first child of each required kind may stay
        let mut kept = HashSet::new();
        let extraneous: Vec<NodeId> = tree
            .children(node)
            .iter()
            .copied()
            .filter(|&child| {
                let name = tree.name(child).unwrap_or_default();
                let wanted = required.iter().any(|d| d.name() == name);
                !(wanted && kept.insert(name.to_string()))
            })
            .collect();
        for child in extraneous {
            match tree.remove(child) {
                Ok(()) => {
                    tracing::debug!(template = descriptor.name(), "removed extraneous child");
                    touched.insert(node);
                }
                Err(err) => tracing::warn!(template = descriptor.name(), %err, "could not remove child"),
            }
        }

        // Order and presence
        for (index, child_descriptor) in required.iter().enumerate() {
            let current = tree.children(node).get(index).copied();
            if current.and_then(|child| tree.name(child)) == Some(child_descriptor.name()) {
                continue;
            }

            let existing = tree
                .children(node)
                .iter()
                .copied()
                .find(|&child| tree.name(child) == Some(child_descriptor.name()));
            let result = match existing {
                Some(child) => tree.move_to(child, node, index),
                None => materialize(registry, tree, child_descriptor).and_then(|fresh| {
                    touched.insert(fresh);
                    tree.insert_child(node, index, fresh)
                }),
            };
            match result {
                Ok(()) => {
                    tracing::debug!(
                        template = descriptor.name(),
                        child = child_descriptor.name(),
                        "restored required child"
                    );
                    touched.insert(node);
                }
                Err(err) => tracing::warn!(
                    template = descriptor.name(),
                    child = child_descriptor.name(),
                    %err,
                    "could not restore required child"
                ),
            }
        }

        for child in tree.children(node).to_vec() {
            self.repair_node(tree, child, touched);
        }
    }
}

impl PostFixer for IntegrityPostfixer {
    fn name(&self) -> &str {
        "template-integrity"
    }

    fn fix(&self, tree: &mut DocumentTree, changed: &ChangeSet) -> ChangeSet {
        self.repair(tree, changed)
    }
}
