//! Conversion rules between template view elements and model elements
//!
//! Both directions make a decision for a single node only; the host
//! dispatcher walks the trees and fills in children.

use crate::{ElementDescriptor, TemplateRegistry, CLASS_ATTRIBUTE};
use doc_model::{ModelElement, ModelNode};
use std::collections::BTreeSet;
use std::sync::Arc;
use view_model::{DowncastMode, ElementDowncaster, ElementUpcaster, UpcastContext, ViewElement};

/// Class added to template roots in the editing view
pub const WIDGET_CLASS: &str = "ck-widget";

/// Find the descriptor for a view element and build the model element.
///
/// Descriptors are scanned in registration order and the last one that
/// matches wins. Only descriptors whose type is in `type_filter` and that the
/// schema admits at the context's parent take part.
pub fn upcast<'a>(
    registry: &'a TemplateRegistry,
    element: &ViewElement,
    type_filter: &BTreeSet<String>,
    context: &UpcastContext<'_>,
) -> Option<(&'a ElementDescriptor, ModelElement)> {
    let descriptor = registry
        .descriptors()
        .filter(|descriptor| {
            type_filter.contains(descriptor.element_type())
                && descriptor.matches(element)
                && context.allows(descriptor.name())
        })
        .last()?;

    let mut model = ModelElement::new(descriptor.name());
    for (key, _) in descriptor.allowed_attributes() {
        if let Some(value) = element.attribute(key) {
            model.attributes.insert(key.to_string(), value.to_string());
        }
    }
    tracing::debug!(descriptor = descriptor.name(), tag = %element.name, "template element upcast");
    Some((descriptor, model))
}

/// Build the view element for a template model node.
///
/// The identity classes are always emitted; allowed attributes are copied
/// from the model node. In the editing view, template roots become
/// non-editable widgets and leaf elements nested in a template become
/// editable regions.
pub fn downcast(
    registry: &TemplateRegistry,
    node: &ModelNode,
    type_filter: &BTreeSet<String>,
    mode: DowncastMode,
) -> Option<ViewElement> {
    let descriptor = registry.lookup_by_name(node.name())?;
    if !type_filter.contains(descriptor.element_type()) {
        return None;
    }

    let mut element = ViewElement::new(descriptor.tag());
    let classes = descriptor.classes();
    if !classes.is_empty() {
        element
            .attributes
            .insert(CLASS_ATTRIBUTE.to_string(), classes.join(" "));
    }
    for (key, value) in node.attributes() {
        if descriptor.allows_attribute(key) {
            element.attributes.insert(key.clone(), value.clone());
        }
    }

    if mode == DowncastMode::Editing {
        if descriptor.is_root() {
            element.add_class(WIDGET_CLASS);
            element
                .attributes
                .insert("contenteditable".to_string(), "false".to_string());
        } else if descriptor.children().is_empty() {
            element
                .attributes
                .insert("contenteditable".to_string(), "true".to_string());
        }
    }
    Some(element)
}

/// Upcaster registered with the host conversion
pub struct TemplateUpcaster {
    registry: Arc<TemplateRegistry>,
    type_filter: BTreeSet<String>,
}

impl TemplateUpcaster {
    pub fn new(registry: Arc<TemplateRegistry>, type_filter: BTreeSet<String>) -> Self {
        Self { registry, type_filter }
    }
}

impl ElementUpcaster for TemplateUpcaster {
    fn upcast(&self, element: &ViewElement, context: &UpcastContext<'_>) -> Option<ModelElement> {
        upcast(&self.registry, element, &self.type_filter, context).map(|(_, model)| model)
    }
}

/// Downcaster registered with the host conversion, for either view
pub struct TemplateDowncaster {
    registry: Arc<TemplateRegistry>,
    type_filter: BTreeSet<String>,
}

impl TemplateDowncaster {
    pub fn new(registry: Arc<TemplateRegistry>, type_filter: BTreeSet<String>) -> Self {
        Self { registry, type_filter }
    }
}

impl ElementDowncaster for TemplateDowncaster {
    fn downcast(&self, node: &ModelNode, mode: DowncastMode) -> Option<ViewElement> {
        downcast(&self.registry, node, &self.type_filter, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{register_schema, TemplateConfig, TemplateDefinition};
    use doc_model::{DocumentTree, Schema, ROOT_NAME};

    fn registry() -> TemplateRegistry {
        let config = TemplateConfig::new()
            .with_template(
                "note",
                TemplateDefinition::new(
                    r#"<aside class="note" data-level="info"><div class="note-body"></div></aside>"#,
                ),
            )
            .with_template(
                "alert",
                TemplateDefinition::new(r#"<aside class="note alert" ck-type="alert"></aside>"#),
            )
            .with_template("box", TemplateDefinition::new(r#"<div class="box"></div>"#))
            .with_template("bigbox", TemplateDefinition::new(r#"<div class="box"></div>"#));
        TemplateRegistry::build(&config).unwrap()
    }

    fn schema(registry: &TemplateRegistry) -> Schema {
        let mut schema = Schema::new();
        register_schema(registry, &mut schema).unwrap();
        schema
    }

    fn all_types(registry: &TemplateRegistry) -> BTreeSet<String> {
        registry.all_types()
    }

    fn only(element_type: &str) -> BTreeSet<String> {
        BTreeSet::from([element_type.to_string()])
    }

    #[test]
    fn test_upcast_copies_allowed_attributes() {
        let registry = registry();
        let schema = schema(&registry);
        let at_root = UpcastContext::new(ROOT_NAME, &schema);
        let view = ViewElement::new("aside")
            .with_attribute("class", "note")
            .with_attribute("data-level", "warn")
            .with_attribute("style", "color: red");

        let (descriptor, model) = upcast(&registry, &view, &only("element"), &at_root).unwrap();
        assert_eq!(descriptor.name(), "tpl__note");
        assert_eq!(model.name, "tpl__note");
        assert_eq!(model.attributes.get("data-level").map(String::as_str), Some("warn"));
        assert!(!model.attributes.contains_key("style"));
        assert!(!model.attributes.contains_key("class"));
    }

    #[test]
    fn test_upcast_respects_type_filter() {
        let registry = registry();
        let schema = schema(&registry);
        let at_root = UpcastContext::new(ROOT_NAME, &schema);
        let view = ViewElement::new("aside").with_attribute("class", "note alert");

        // both note and alert match; alert was registered later
        let (descriptor, _) = upcast(&registry, &view, &all_types(&registry), &at_root).unwrap();
        assert_eq!(descriptor.name(), "tpl__alert");

        let (descriptor, _) = upcast(&registry, &view, &only("element"), &at_root).unwrap();
        assert_eq!(descriptor.name(), "tpl__note");

        assert!(upcast(&registry, &view, &only("other"), &at_root).is_none());
    }

    #[test]
    fn test_last_registered_match_wins() {
        let registry = registry();
        let schema = schema(&registry);
        let at_root = UpcastContext::new(ROOT_NAME, &schema);
        let view = ViewElement::new("div").with_attribute("class", "box");
        let (descriptor, _) = upcast(&registry, &view, &only("element"), &at_root).unwrap();
        assert_eq!(descriptor.name(), "tpl__bigbox");
    }

    #[test]
    fn test_last_match_is_chosen_among_descriptors_allowed_here() {
        let config = TemplateConfig::new().with_template(
            "box",
            TemplateDefinition::new(r#"<div class="a b"><div class="a"></div></div>"#),
        );
        let registry = TemplateRegistry::build(&config).unwrap();
        let schema = schema(&registry);
        let outer = ViewElement::new("div").with_attribute("class", "a b");
        let inner = ViewElement::new("div").with_attribute("class", "a");
        let types = all_types(&registry);

        // the nested descriptor matches the outer element too, but only the
        // template root may sit in the document root
        let at_root = UpcastContext::new(ROOT_NAME, &schema);
        let (descriptor, _) = upcast(&registry, &outer, &types, &at_root).unwrap();
        assert_eq!(descriptor.name(), "tpl__box");

        let in_box = UpcastContext::new("tpl__box", &schema);
        let (descriptor, _) = upcast(&registry, &inner, &types, &in_box).unwrap();
        assert_eq!(descriptor.name(), "tpl__box__0");
        let (descriptor, _) = upcast(&registry, &outer, &types, &in_box).unwrap();
        assert_eq!(descriptor.name(), "tpl__box__0");

        assert!(upcast(&registry, &inner, &types, &at_root).is_none());
    }

    #[test]
    fn test_upcast_without_match() {
        let registry = registry();
        let schema = schema(&registry);
        let at_root = UpcastContext::new(ROOT_NAME, &schema);
        let view = ViewElement::new("div").with_attribute("class", "unrelated");
        assert!(upcast(&registry, &view, &all_types(&registry), &at_root).is_none());
    }
    #[test]
    fn test_downcast_data_and_editing() {
        let registry = registry();
        let mut tree = DocumentTree::new();
        let mut attributes = std::collections::BTreeMap::new();
        attributes.insert("data-level".to_string(), "warn".to_string());
        attributes.insert("unrelated".to_string(), "x".to_string());
        let note = tree.create_element("tpl__note", attributes);
        let body = tree.create_element("tpl__note__0", Default::default());
        let types = all_types(&registry);

        let data = downcast(&registry, tree.get(note).unwrap(), &types, DowncastMode::Data).unwrap();
        assert_eq!(data.name, "aside");
        assert_eq!(data.attribute("class"), Some("note"));
        assert_eq!(data.attribute("data-level"), Some("warn"));
        assert_eq!(data.attribute("unrelated"), None);
        assert_eq!(data.attribute("contenteditable"), None);

        let editing = downcast(&registry, tree.get(note).unwrap(), &types, DowncastMode::Editing).unwrap();
        assert_eq!(editing.attribute("contenteditable"), Some("false"));
        assert!(editing.has_class(WIDGET_CLASS));

        let body_view = downcast(&registry, tree.get(body).unwrap(), &types, DowncastMode::Editing).unwrap();
        assert_eq!(body_view.attribute("class"), Some("note-body"));
        assert_eq!(body_view.attribute("contenteditable"), Some("true"));
    }

    #[test]
    fn test_downcast_ignores_foreign_nodes_and_filtered_types() {
        let registry = registry();
        let mut tree = DocumentTree::new();
        let paragraph = tree.create_element("paragraph", Default::default());
        let alert = tree.create_element("tpl__alert", Default::default());

        assert!(downcast(&registry, tree.get(paragraph).unwrap(), &all_types(&registry), DowncastMode::Data).is_none());
        assert!(downcast(&registry, tree.get(alert).unwrap(), &only("element"), DowncastMode::Data).is_none());
        assert!(downcast(&registry, tree.get(alert).unwrap(), &only("alert"), DowncastMode::Data).is_some());
    }
}
