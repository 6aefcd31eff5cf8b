//! Element descriptors: the structural definition of one template node

use std::collections::BTreeMap;
use view_model::ViewElement;

/// Prefix of every generated descriptor name
pub const NAME_PREFIX: &str = "tpl__";

/// Type given to descriptors that do not declare one
pub const DEFAULT_TYPE: &str = "element";

/// Markup attribute declaring a descriptor's type; it is not kept as a view attribute
pub const TYPE_ATTRIBUTE: &str = "ck-type";

/// Attribute holding the identity classes of a descriptor
pub const CLASS_ATTRIBUTE: &str = "class";

/// Handle of a descriptor inside the registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(pub(crate) usize);

impl DescriptorId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Immutable description of one template element.
///
/// `name` doubles as the model element name. The parent link and children
/// are handles into the owning [`TemplateRegistry`](crate::TemplateRegistry);
/// the order of `children` is the required order of the model children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDescriptor {
    pub(crate) id: DescriptorId,
    pub(crate) name: String,
    pub(crate) template: String,
    pub(crate) tag: String,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) element_type: String,
    pub(crate) parent: Option<DescriptorId>,
    pub(crate) children: Vec<DescriptorId>,
}

impl ElementDescriptor {
    pub fn id(&self) -> DescriptorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the template definition this descriptor was built from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Element name in the view
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Declared attributes, `class` included
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    pub fn parent(&self) -> Option<DescriptorId> {
        self.parent
    }

    pub fn children(&self) -> &[DescriptorId] {
        &self.children
    }

    /// Template roots have no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Identity classes
    pub fn classes(&self) -> Vec<&str> {
        self.attributes
            .get(CLASS_ATTRIBUTE)
            .map(|value| value.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Attributes carried between model and view, with their default values
    pub fn allowed_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .filter(|(key, _)| key.as_str() != CLASS_ATTRIBUTE)
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn allows_attribute(&self, key: &str) -> bool {
        key != CLASS_ATTRIBUTE && self.attributes.contains_key(key)
    }

    /// Same tag and every identity class present
    pub fn matches(&self, element: &ViewElement) -> bool {
        if element.name != self.tag {
            return false;
        }
        let classes = element.classes();
        self.classes().iter().all(|class| classes.contains(class))
    }
}
