//! Schema registry describing where model elements may appear
//!
//! Items are registered by name once, at editor setup. Rules can be
//! inherited from other items:
//! - `allow_where`: the item is allowed wherever the named items are allowed
//! - `allow_content_of`: the item accepts the children the named items accept

use crate::{DocModelError, Result, ROOT_NAME, TEXT_NAME};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Abstract item standing for any block element
pub const BLOCK_NAME: &str = "$block";

/// Name of the built-in paragraph element
pub const PARAGRAPH_NAME: &str = "paragraph";

/// Definition passed to [`Schema::register`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaItemDefinition {
    /// Self-contained unit, selected and removed as a whole
    pub is_object: bool,
    pub is_block: bool,
    /// Parents this item may be a direct child of
    pub allow_in: Vec<String>,
    pub allow_where: Vec<String>,
    pub allow_content_of: Vec<String>,
    pub allow_attributes: Vec<String>,
}

impl SchemaItemDefinition {
    pub fn allowed_in(mut self, parent: impl Into<String>) -> Self {
        self.allow_in.push(parent.into());
        self
    }

    pub fn allowed_where(mut self, item: impl Into<String>) -> Self {
        self.allow_where.push(item.into());
        self
    }

    pub fn with_content_of(mut self, item: impl Into<String>) -> Self {
        self.allow_content_of.push(item.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.allow_attributes.push(attribute.into());
        self
    }

    pub fn object(mut self) -> Self {
        self.is_object = true;
        self
    }

    pub fn block(mut self) -> Self {
        self.is_block = true;
        self
    }
}

/// Registry of schema items
#[derive(Debug, Clone)]
pub struct Schema {
    items: HashMap<String, SchemaItemDefinition>,
}

impl Schema {
    /// Create a schema with the built-in `$root`, `$block`, `$text` and `paragraph` items
    pub fn new() -> Self {
        let mut items = HashMap::new();
        items.insert(ROOT_NAME.to_string(), SchemaItemDefinition::default());
        items.insert(
            BLOCK_NAME.to_string(),
            SchemaItemDefinition::default().allowed_in(ROOT_NAME).block(),
        );
        items.insert(
            TEXT_NAME.to_string(),
            SchemaItemDefinition::default().allowed_in(BLOCK_NAME),
        );
        items.insert(
            PARAGRAPH_NAME.to_string(),
            SchemaItemDefinition::default()
                .allowed_where(BLOCK_NAME)
                .with_content_of(BLOCK_NAME)
                .block(),
        );
        Self { items }
    }

    /// Register a new item; names are registered once
    pub fn register(&mut self, name: impl Into<String>, definition: SchemaItemDefinition) -> Result<()> {
        let name = name.into();
        if self.items.contains_key(&name) {
            return Err(DocModelError::DuplicateSchemaItem(name));
        }
        tracing::debug!(item = %name, "schema item registered");
        self.items.insert(name, definition);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn item(&self, name: &str) -> Option<&SchemaItemDefinition> {
        self.items.get(name)
    }

    pub fn is_object(&self, name: &str) -> bool {
        self.items.get(name).is_some_and(|item| item.is_object)
    }

    pub fn is_block(&self, name: &str) -> bool {
        self.items.get(name).is_some_and(|item| item.is_block)
    }

    /// Check whether `child` may be a direct child of `parent`
    pub fn check_child(&self, parent: &str, child: &str) -> bool {
        if !self.items.contains_key(parent) {
            return false;
        }
        let parents = self.resolve_chain(child, |item| &item.allow_where);
        let parent_chain = self.resolve_chain(parent, |item| &item.allow_content_of);

        parents.iter().any(|name| {
            self.items
                .get(name.as_str())
                .is_some_and(|item| item.allow_in.iter().any(|p| parent_chain.contains(p)))
        })
    }

    /// Check whether `attribute` is allowed on `item`, honouring `allow_where` inheritance
    pub fn check_attribute(&self, item: &str, attribute: &str) -> bool {
        self.resolve_chain(item, |definition| &definition.allow_where)
            .iter()
            .any(|name| {
                self.items
                    .get(name.as_str())
                    .is_some_and(|definition| definition.allow_attributes.iter().any(|a| a == attribute))
            })
    }

    /// The item itself plus everything reachable through `link`, cycle safe
    fn resolve_chain<'a, F>(&'a self, start: &str, link: F) -> HashSet<String>
    where
        F: Fn(&'a SchemaItemDefinition) -> &'a Vec<String>,
    {
        let mut seen = HashSet::new();
        let mut stack = vec![start.to_string()];
        while let Some(name) = stack.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(item) = self.items.get(name.as_str()) {
                stack.extend(link(item).iter().cloned());
            }
        }
        seen
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
