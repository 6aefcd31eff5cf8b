//! Template registry: builds and indexes the descriptor arena
//!
//! Descriptors are created once from the configuration by a recursive walk
//! over each parsed template and are never mutated afterwards. The arena is
//! stored in registration order (definition order, then pre-order within a
//! template), which is the order used for matching.

use crate::{
    DescriptorId, ElementDescriptor, TemplateConfig, TemplateError, TemplateResult, DEFAULT_TYPE,
    NAME_PREFIX, TYPE_ATTRIBUTE,
};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};
use view_model::{parse_markup, ViewElement, ViewNode};

/// A registered template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInfo {
    pub name: String,
    pub label: String,
    pub root: DescriptorId,
}

/// Owner of every descriptor, with lookup tables built at construction time
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    descriptors: Vec<ElementDescriptor>,
    by_name: HashMap<String, DescriptorId>,
    by_type: IndexMap<String, Vec<DescriptorId>>,
    templates: IndexMap<String, TemplateInfo>,
}

impl TemplateRegistry {
    /// Build the registry from configured definitions.
    ///
    /// Fails on markup that does not parse, on definitions without exactly
    /// one root element and on generated name collisions. No registry is
    /// produced on failure.
    pub fn build(config: &TemplateConfig) -> TemplateResult<Self> {
        let mut registry = Self::default();

        for (name, definition) in &config.templates {
            if name.trim().is_empty() {
                return Err(TemplateError::Configuration(
                    "template names cannot be empty".into(),
                ));
            }

            let nodes = parse_markup(&definition.template).map_err(|err| {
                TemplateError::Configuration(format!("template '{name}': {err}"))
            })?;
            let root = single_root(name, &nodes)?;
            let root_id = registry.add_descriptor(name, root, None, format!("{NAME_PREFIX}{name}"))?;

            let label = if definition.label.is_empty() {
                name.clone()
            } else {
                definition.label.clone()
            };
            registry.templates.insert(
                name.clone(),
                TemplateInfo {
                    name: name.clone(),
                    label,
                    root: root_id,
                },
            );
        }

        tracing::info!(
            templates = registry.templates.len(),
            descriptors = registry.descriptors.len(),
            "template registry built"
        );
        Ok(registry)
    }

    fn add_descriptor(
        &mut self,
        template: &str,
        element: &ViewElement,
        parent: Option<DescriptorId>,
        name: String,
    ) -> TemplateResult<DescriptorId> {
        if self.by_name.contains_key(&name) {
            return Err(TemplateError::NameCollision(name));
        }

        let id = DescriptorId(self.descriptors.len());
        let mut attributes = element.attributes.clone();
        let element_type = attributes
            .remove(TYPE_ATTRIBUTE)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TYPE.to_string());

        self.descriptors.push(ElementDescriptor {
            id,
            name: name.clone(),
            template: template.to_string(),
            tag: element.name.clone(),
            attributes,
            element_type: element_type.clone(),
            parent,
            children: Vec::new(),
        });
        self.by_name.insert(name.clone(), id);
        self.by_type.entry(element_type).or_default().push(id);

        for (index, child) in element.child_elements().enumerate() {
            let child_id = self.add_descriptor(template, child, Some(id), format!("{name}__{index}"))?;
            self.descriptors[id.0].children.push(child_id);
        }
        Ok(id)
    }

    /// Descriptor behind a handle
    pub fn get(&self, id: DescriptorId) -> Option<&ElementDescriptor> {
        self.descriptors.get(id.0)
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&ElementDescriptor> {
        self.by_name.get(name).and_then(|&id| self.get(id))
    }

    /// Descriptors of one type, in registration order
    pub fn lookup_by_type(&self, element_type: &str) -> Vec<&ElementDescriptor> {
        self.by_type
            .get(element_type)
            .map(|ids| ids.iter().filter_map(|&id| self.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn all_types(&self) -> BTreeSet<String> {
        self.by_type.keys().cloned().collect()
    }

    /// Every descriptor in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &ElementDescriptor> {
        self.descriptors.iter()
    }

    pub fn template(&self, name: &str) -> Option<&TemplateInfo> {
        self.templates.get(name)
    }

    /// Root descriptor of a template definition
    pub fn root_of(&self, template: &str) -> Option<&ElementDescriptor> {
        self.templates.get(template).and_then(|info| self.get(info.root))
    }

    pub fn templates(&self) -> impl Iterator<Item = &TemplateInfo> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Simulates descriptors vanishing after construction
    #[cfg(test)]
    pub(crate) fn truncate_for_test(&mut self, len: usize) {
        self.descriptors.truncate(len);
    }
}

fn single_root<'a>(name: &str, nodes: &'a [ViewNode]) -> TemplateResult<&'a ViewElement> {
    let mut elements = nodes.iter().filter_map(ViewNode::as_element);
    match (elements.next(), elements.next()) {
        (Some(root), None) => Ok(root),
        (None, _) => Err(TemplateError::Configuration(format!(
            "template '{name}' has no root element"
        ))),
        (Some(_), Some(_)) => Err(TemplateError::Configuration(format!(
            "template '{name}' has more than one root element"
        ))),
    }
}
