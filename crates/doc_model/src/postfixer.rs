//! Post-fixers: repair passes run after every batch of document changes
//!
//! After a batch, the recorded [`ChangeSet`] is handed to every registered
//! fixer. Whatever the fixers mutate is recorded again and fed into the next
//! pass, until one pass leaves the tree untouched.

use crate::{ChangeSet, DocModelError, DocumentTree, Result};
use std::collections::HashSet;

/// Default upper bound on fixed-point passes
pub const DEFAULT_MAX_PASSES: usize = 32;

/// A repair pass over changed nodes
pub trait PostFixer: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Repair the changed nodes, returning the nodes that were touched.
    /// An empty result means the tree was left as is.
    fn fix(&self, tree: &mut DocumentTree, changed: &ChangeSet) -> ChangeSet;
}

struct Registration {
    types: Option<HashSet<String>>,
    fixer: Box<dyn PostFixer>,
}

/// Registered post-fixers and the fixed-point driver
pub struct PostFixers {
    registrations: Vec<Registration>,
    max_passes: usize,
}

impl PostFixers {
    pub fn new() -> Self {
        Self::with_max_passes(DEFAULT_MAX_PASSES)
    }

    pub fn with_max_passes(max_passes: usize) -> Self {
        Self {
            registrations: Vec::new(),
            max_passes,
        }
    }

    /// Register a fixer. With `types`, it only receives changed nodes with one of those names.
    pub fn register(&mut self, types: Option<HashSet<String>>, fixer: Box<dyn PostFixer>) {
        tracing::debug!(fixer = fixer.name(), "post-fixer registered");
        self.registrations.push(Registration { types, fixer });
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Drain the tree's changes and run fixers until a pass touches nothing.
    /// Returns the number of passes that saw changes.
    pub fn run(&self, tree: &mut DocumentTree) -> Result<usize> {
        let mut passes = 0;
        loop {
            let changes = tree.take_changes();
            if changes.is_empty() {
                return Ok(passes);
            }
            if passes >= self.max_passes {
                tracing::warn!(passes, "post-fixers did not converge");
                return Err(DocModelError::PostFixerDidNotConverge { passes });
            }
            passes += 1;

            let mut touched_any = false;
            for registration in &self.registrations {
                let relevant: ChangeSet = changes
                    .iter()
                    .filter(|&id| match (&registration.types, tree.name(id)) {
                        (_, None) => false,
                        (None, Some(_)) => true,
                        (Some(types), Some(name)) => types.contains(name),
                    })
                    .collect();
                if relevant.is_empty() {
                    continue;
                }

                let touched = registration.fixer.fix(tree, &relevant);
                if !touched.is_empty() {
                    tracing::debug!(
                        fixer = registration.fixer.name(),
                        pass = passes,
                        touched = touched.len(),
                        "post-fixer touched nodes"
                    );
                    touched_any = true;
                }
            }

            if !touched_any {
                tree.take_changes();
                return Ok(passes);
            }
        }
    }
}

impl Default for PostFixers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Makes sure every `box` element carries a `marker` attribute
    struct MarkerFixer;

    impl PostFixer for MarkerFixer {
        fn name(&self) -> &str {
            "marker"
        }

        fn fix(&self, tree: &mut DocumentTree, changed: &ChangeSet) -> ChangeSet {
            let mut touched = ChangeSet::new();
            for id in changed.iter() {
                let missing = tree.get(id).is_some_and(|node| node.attribute("marker").is_none());
                if missing && tree.set_attribute(id, "marker", "yes").is_ok() {
                    touched.insert(id);
                }
            }
            touched
        }
    }

    /// Never settles
    struct FlipFixer;

    impl PostFixer for FlipFixer {
        fn name(&self) -> &str {
            "flip"
        }

        fn fix(&self, tree: &mut DocumentTree, changed: &ChangeSet) -> ChangeSet {
            let mut touched = ChangeSet::new();
            for id in changed.iter() {
                let next = match tree.get(id).and_then(|node| node.attribute("state")) {
                    Some("on") => "off",
                    _ => "on",
                };
                if tree.set_attribute(id, "state", next).is_ok() {
                    touched.insert(id);
                }
            }
            touched
        }
    }

    fn tree_with_box() -> (DocumentTree, crate::NodeId) {
        let mut tree = DocumentTree::new();
        let root = tree.root_id();
        let node = tree.create_element("box", BTreeMap::new());
        tree.append_child(root, node).unwrap();
        (tree, node)
    }

    #[test]
    fn test_run_reaches_fixed_point() {
        let (mut tree, node) = tree_with_box();
        let mut fixers = PostFixers::new();
        fixers.register(Some(HashSet::from(["box".to_string()])), Box::new(MarkerFixer));

        let passes = fixers.run(&mut tree).unwrap();
        assert_eq!(passes, 2);
        assert_eq!(tree.get(node).unwrap().attribute("marker"), Some("yes"));
        assert!(tree.changes().is_empty());

        assert_eq!(fixers.run(&mut tree).unwrap(), 0);
    }

    #[test]
    fn test_type_filter_skips_other_nodes() {
        let (mut tree, node) = tree_with_box();
        let mut fixers = PostFixers::new();
        fixers.register(Some(HashSet::from(["other".to_string()])), Box::new(MarkerFixer));

        assert_eq!(fixers.run(&mut tree).unwrap(), 1);
        assert_eq!(tree.get(node).unwrap().attribute("marker"), None);
    }

    #[test]
    fn test_non_converging_fixer_is_reported() {
        let (mut tree, _) = tree_with_box();
        let mut fixers = PostFixers::with_max_passes(4);
        fixers.register(None, Box::new(FlipFixer));

        let result = fixers.run(&mut tree);
        assert!(matches!(result, Err(DocModelError::PostFixerDidNotConverge { passes: 4 })));
    }
}
