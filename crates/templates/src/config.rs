//! Template configuration
//!
//! Templates are configured as an ordered JSON object:
//!
//! ```json
//! {
//!   "simple": { "label": "Simple box", "template": "<div class=\"simple\"></div>" }
//! }
//! ```
//!
//! The order of the entries is the registration order of the descriptors.

use crate::{TemplateError, TemplateResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single configured template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    /// Human readable name; the template name is used when empty
    #[serde(default)]
    pub label: String,
    /// Raw markup of the template
    pub template: String,
}

impl TemplateDefinition {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            label: String::new(),
            template: template.into(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Template name to definition, in definition order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateConfig {
    pub templates: IndexMap<String, TemplateDefinition>,
}

impl TemplateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition, replacing any previous one with the same name
    pub fn with_template(mut self, name: impl Into<String>, definition: TemplateDefinition) -> Self {
        self.templates.insert(name.into(), definition);
        self
    }

    pub fn from_json_str(json: &str) -> TemplateResult<Self> {
        serde_json::from_str(json).map_err(|err| TemplateError::Configuration(err.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> TemplateResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            TemplateError::Configuration(format!("{}: {}", path.display(), err))
        })?;
        Self::from_json_str(&content)
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
