//! Model/view conversion dispatchers
//!
//! Converters only make per-node decisions. The dispatcher walks the trees,
//! asks the registered converters in priority order and builds the result.

use crate::{Result, ViewElement, ViewNode};
use doc_model::{
    DocumentTree, ModelElement, ModelNode, NodeId, NodeKind, Schema, PARAGRAPH_NAME, TEXT_NAME,
};
use std::collections::BTreeMap;

/// Converter priority; higher priorities are asked first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Lowest,
    Low,
    Normal,
    High,
    Highest,
}

/// Which view a downcast produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DowncastMode {
    /// Persisted output, as returned by `get_data`
    Data,
    /// The view shown while editing
    Editing,
}

/// Where an upcast element would be placed
#[derive(Clone, Copy)]
pub struct UpcastContext<'a> {
    /// Name of the model element receiving the result
    pub parent: &'a str,
    pub schema: &'a Schema,
}

impl<'a> UpcastContext<'a> {
    pub fn new(parent: &'a str, schema: &'a Schema) -> Self {
        Self { parent, schema }
    }

    /// Whether a model element with this name may be created here
    pub fn allows(&self, name: &str) -> bool {
        self.schema.check_child(self.parent, name)
    }
}

/// Decides whether a view element becomes a model element.
///
/// A converter with several candidates for one element should pick one the
/// context allows; the dispatcher drops results the context rejects.
pub trait ElementUpcaster: Send + Sync {
    fn upcast(&self, element: &ViewElement, context: &UpcastContext<'_>) -> Option<ModelElement>;
}

/// Decides how a model element is rendered. Children are filled in by the dispatcher.
pub trait ElementDowncaster: Send + Sync {
    fn downcast(&self, node: &ModelNode, mode: DowncastMode) -> Option<ViewElement>;
}

struct Entry<T: ?Sized> {
    priority: Priority,
    handler: Box<T>,
}

/// Keeps entries ordered by descending priority; among equal priorities
/// the most recently registered entry comes first.
fn insert_ordered<T: ?Sized>(entries: &mut Vec<Entry<T>>, priority: Priority, handler: Box<T>) {
    let index = entries
        .iter()
        .position(|entry| entry.priority <= priority)
        .unwrap_or(entries.len());
    entries.insert(index, Entry { priority, handler });
}

/// Registered converters for every direction
pub struct Conversion {
    upcasters: Vec<Entry<dyn ElementUpcaster>>,
    data_downcasters: Vec<Entry<dyn ElementDowncaster>>,
    editing_downcasters: Vec<Entry<dyn ElementDowncaster>>,
}

impl Conversion {
    /// Create a dispatcher with the built-in paragraph converters
    pub fn new() -> Self {
        let mut conversion = Self {
            upcasters: Vec::new(),
            data_downcasters: Vec::new(),
            editing_downcasters: Vec::new(),
        };
        conversion.register_upcaster(Priority::Low, Box::new(ParagraphConverter));
        conversion.register_downcaster(DowncastMode::Data, Priority::Low, Box::new(ParagraphConverter));
        conversion.register_downcaster(DowncastMode::Editing, Priority::Low, Box::new(ParagraphConverter));
        conversion
    }

    pub fn register_upcaster(&mut self, priority: Priority, handler: Box<dyn ElementUpcaster>) {
        insert_ordered(&mut self.upcasters, priority, handler);
    }

    pub fn register_downcaster(
        &mut self,
        mode: DowncastMode,
        priority: Priority,
        handler: Box<dyn ElementDowncaster>,
    ) {
        let entries = match mode {
            DowncastMode::Data => &mut self.data_downcasters,
            DowncastMode::Editing => &mut self.editing_downcasters,
        };
        insert_ordered(entries, priority, handler);
    }

    /// First upcaster result the context allows
    pub fn match_view(&self, element: &ViewElement, context: &UpcastContext<'_>) -> Option<ModelElement> {
        self.upcasters.iter().find_map(|entry| {
            entry
                .handler
                .upcast(element, context)
                .filter(|model| context.allows(&model.name))
        })
    }

    /// First downcaster accepting the node
    pub fn match_model(&self, node: &ModelNode, mode: DowncastMode) -> Option<ViewElement> {
        let entries = match mode {
            DowncastMode::Data => &self.data_downcasters,
            DowncastMode::Editing => &self.editing_downcasters,
        };
        entries
            .iter()
            .find_map(|entry| entry.handler.downcast(node, mode))
    }

    /// Convert view nodes and append the result to `parent`.
    ///
    /// Elements nobody converts, or that the schema does not allow at this
    /// point, are unwrapped: their children are converted into `parent`.
    pub fn upcast(
        &self,
        nodes: &[ViewNode],
        tree: &mut DocumentTree,
        schema: &Schema,
        parent: NodeId,
    ) -> Result<()> {
        for node in nodes {
            match node {
                ViewNode::Text(text) => self.upcast_text(text, tree, schema, parent)?,
                ViewNode::Element(element) => self.upcast_element(element, tree, schema, parent)?,
            }
        }
        Ok(())
    }

    fn upcast_element(
        &self,
        element: &ViewElement,
        tree: &mut DocumentTree,
        schema: &Schema,
        parent: NodeId,
    ) -> Result<()> {
        let parent_name = tree.name(parent).unwrap_or_default().to_string();
        let context = UpcastContext::new(&parent_name, schema);
        match self.match_view(element, &context) {
            Some(model) => {
                let attributes: BTreeMap<String, String> = model
                    .attributes
                    .into_iter()
                    .filter(|(key, _)| schema.check_attribute(&model.name, key))
                    .collect();
                let id = tree.create_element(model.name, attributes);
                tree.append_child(parent, id)?;
                self.upcast(&element.children, tree, schema, id)
            }
            None => {
                tracing::debug!(
                    element = %element.name,
                    parent = %parent_name,
                    "no converter for element here, unwrapping"
                );
                self.upcast(&element.children, tree, schema, parent)
            }
        }
    }

    fn upcast_text(
        &self,
        text: &str,
        tree: &mut DocumentTree,
        schema: &Schema,
        parent: NodeId,
    ) -> Result<()> {
        let parent_name = tree.name(parent).unwrap_or_default().to_string();
        if schema.check_child(&parent_name, TEXT_NAME) {
            let id = tree.create_text(text);
            tree.append_child(parent, id)?;
        } else if schema.check_child(&parent_name, PARAGRAPH_NAME) {
            let paragraph = tree.create_element(PARAGRAPH_NAME, BTreeMap::new());
            tree.append_child(parent, paragraph)?;
            let id = tree.create_text(text);
            tree.append_child(paragraph, id)?;
        } else {
            tracing::debug!(parent = %parent_name, "text not allowed here, dropped");
        }
        Ok(())
    }

    /// Convert a model node to view nodes. Unconverted elements are unwrapped,
    /// so downcasting the root yields the document fragment.
    pub fn downcast(&self, tree: &DocumentTree, node: NodeId, mode: DowncastMode) -> Vec<ViewNode> {
        let Some(model) = tree.get(node) else {
            return Vec::new();
        };

        match model.kind() {
            NodeKind::Text { data } => vec![ViewNode::Text(data.clone())],
            NodeKind::Element { .. } => {
                let children: Vec<ViewNode> = model
                    .children()
                    .iter()
                    .flat_map(|&child| self.downcast(tree, child, mode))
                    .collect();
                match self.match_model(model, mode) {
                    Some(mut element) => {
                        element.children.extend(children);
                        vec![ViewNode::Element(element)]
                    }
                    None => children,
                }
            }
        }
    }
}

impl Default for Conversion {
    fn default() -> Self {
        Self::new()
    }
}

/// `paragraph` <-> `<p>`
struct ParagraphConverter;

impl ElementUpcaster for ParagraphConverter {
    fn upcast(&self, element: &ViewElement, _context: &UpcastContext<'_>) -> Option<ModelElement> {
        (element.name == "p").then(|| ModelElement::new(PARAGRAPH_NAME))
    }
}

impl ElementDowncaster for ParagraphConverter {
    fn downcast(&self, node: &ModelNode, _mode: DowncastMode) -> Option<ViewElement> {
        (node.name() == PARAGRAPH_NAME).then(|| ViewElement::new("p"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_markup, to_markup};
    use doc_model::{SchemaItemDefinition, ROOT_NAME};

    struct SectionConverter;

    impl ElementUpcaster for SectionConverter {
        fn upcast(&self, element: &ViewElement, _context: &UpcastContext<'_>) -> Option<ModelElement> {
            (element.name == "section").then(|| ModelElement::new("section").with_attribute("data-x", "1"))
        }
    }

    impl ElementDowncaster for SectionConverter {
        fn downcast(&self, node: &ModelNode, mode: DowncastMode) -> Option<ViewElement> {
            if node.name() != "section" {
                return None;
            }
            let element = ViewElement::new("section");
            Some(match mode {
                DowncastMode::Data => element,
                DowncastMode::Editing => element.with_attribute("contenteditable", "false"),
            })
        }
    }

    struct NamedUpcaster(&'static str);

    impl ElementUpcaster for NamedUpcaster {
        fn upcast(&self, _element: &ViewElement, _context: &UpcastContext<'_>) -> Option<ModelElement> {
            Some(ModelElement::new(self.0))
        }
    }

    fn schema_with_section() -> Schema {
        let mut schema = Schema::new();
        schema
            .register(
                "section",
                SchemaItemDefinition::default()
                    .allowed_in(ROOT_NAME)
                    .with_content_of(ROOT_NAME),
            )
            .unwrap();
        schema
    }

    fn upcast_markup(conversion: &Conversion, schema: &Schema, markup: &str) -> DocumentTree {
        let mut tree = DocumentTree::new();
        let root = tree.root_id();
        let nodes = parse_markup(markup).unwrap();
        conversion.upcast(&nodes, &mut tree, schema, root).unwrap();
        tree
    }

    #[test]
    fn test_paragraph_roundtrip() {
        let conversion = Conversion::new();
        let schema = Schema::new();
        let tree = upcast_markup(&conversion, &schema, "<p>Hello</p><p>World</p>");

        assert_eq!(tree.children(tree.root_id()).len(), 2);
        let view = conversion.downcast(&tree, tree.root_id(), DowncastMode::Data);
        assert_eq!(to_markup(&view), "<p>Hello</p><p>World</p>");
    }

    #[test]
    fn test_unknown_elements_are_unwrapped() {
        let conversion = Conversion::new();
        let schema = Schema::new();
        let tree = upcast_markup(&conversion, &schema, "<article><p>Inside</p></article>");

        let view = conversion.downcast(&tree, tree.root_id(), DowncastMode::Data);
        assert_eq!(to_markup(&view), "<p>Inside</p>");
    }

    #[test]
    fn test_bare_text_is_wrapped_in_paragraph() {
        let conversion = Conversion::new();
        let schema = Schema::new();
        let tree = upcast_markup(&conversion, &schema, "loose text");

        let root_children = tree.children(tree.root_id());
        assert_eq!(root_children.len(), 1);
        assert_eq!(tree.name(root_children[0]), Some(PARAGRAPH_NAME));
    }

    #[test]
    fn test_registered_converters_and_attribute_filtering() {
        let mut conversion = Conversion::new();
        conversion.register_upcaster(Priority::Normal, Box::new(SectionConverter));
        conversion.register_downcaster(DowncastMode::Data, Priority::Normal, Box::new(SectionConverter));
        conversion.register_downcaster(DowncastMode::Editing, Priority::Normal, Box::new(SectionConverter));
        let schema = schema_with_section();

        let tree = upcast_markup(&conversion, &schema, "<section><p>a</p></section>");
        let section = tree.children(tree.root_id())[0];
        assert_eq!(tree.name(section), Some("section"));
        // data-x is not allowed by the schema
        assert!(tree.get(section).unwrap().attributes().is_empty());

        let data = conversion.downcast(&tree, tree.root_id(), DowncastMode::Data);
        assert_eq!(to_markup(&data), "<section><p>a</p></section>");
        let editing = conversion.downcast(&tree, tree.root_id(), DowncastMode::Editing);
        assert_eq!(
            to_markup(&editing),
            r#"<section contenteditable="false"><p>a</p></section>"#
        );
    }

    #[test]
    fn test_disallowed_element_is_unwrapped() {
        let mut conversion = Conversion::new();
        conversion.register_upcaster(Priority::Normal, Box::new(SectionConverter));
        let schema = schema_with_section();

        let tree = upcast_markup(&conversion, &schema, "<p><section>x</section></p>");
        let paragraph = tree.children(tree.root_id())[0];
        let text = tree.children(paragraph)[0];
        assert_eq!(tree.get(text).unwrap().text_content(), Some("x"));
    }

    #[test]
    fn test_priority_and_registration_order() {
        let mut conversion = Conversion::new();
        conversion.register_upcaster(Priority::Normal, Box::new(NamedUpcaster("first")));
        conversion.register_upcaster(Priority::Normal, Box::new(NamedUpcaster("second")));
        conversion.register_upcaster(Priority::Lowest, Box::new(NamedUpcaster("fallback")));
        let mut schema = Schema::new();
        for name in ["first", "second", "fallback"] {
            schema
                .register(name, SchemaItemDefinition::default().allowed_in(ROOT_NAME))
                .unwrap();
        }

        let context = UpcastContext::new(ROOT_NAME, &schema);
        let matched = conversion.match_view(&ViewElement::new("p"), &context).unwrap();
        assert_eq!(matched.name, "second");
    }

    #[test]
    fn test_rejected_result_falls_through_to_next_converter() {
        let mut conversion = Conversion::new();
        conversion.register_upcaster(Priority::Lowest, Box::new(NamedUpcaster("fallback")));
        conversion.register_upcaster(Priority::Normal, Box::new(NamedUpcaster("inner")));
        let mut schema = Schema::new();
        schema
            .register("fallback", SchemaItemDefinition::default().allowed_in(ROOT_NAME))
            .unwrap();
        schema
            .register("inner", SchemaItemDefinition::default().allowed_in("fallback"))
            .unwrap();

        let at_root = UpcastContext::new(ROOT_NAME, &schema);
        assert_eq!(conversion.match_view(&ViewElement::new("div"), &at_root).unwrap().name, "fallback");
        let in_fallback = UpcastContext::new("fallback", &schema);
        assert_eq!(conversion.match_view(&ViewElement::new("div"), &in_fallback).unwrap().name, "inner");
    }
}
