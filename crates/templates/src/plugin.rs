//! Wiring of the template machinery into an editing engine

use crate::{
    ElementDescriptor, InsertTemplate, IntegrityPostfixer, TemplateConfig, TemplateDowncaster,
    TemplateError, TemplateRegistry, TemplateResult, TemplateUpcaster, COMMAND_NAME,
};
use doc_model::{Schema, SchemaItemDefinition, ROOT_NAME};
use edit_engine::{Command, EditError, EditingEngine};
use std::collections::HashSet;
use std::sync::Arc;
use view_model::{DowncastMode, Priority};

/// Register one schema item per descriptor.
///
/// Roots are objects allowed in the document root; nested descriptors are
/// allowed in their parent only. Leaves below a root accept whatever the
/// document root accepts.
pub fn register_schema(registry: &TemplateRegistry, schema: &mut Schema) -> doc_model::Result<()> {
    for descriptor in registry.descriptors() {
        let mut item = SchemaItemDefinition::default();
        match descriptor.parent().and_then(|parent| registry.get(parent)) {
            Some(parent) => {
                item = item.allowed_in(parent.name());
                if descriptor.children().is_empty() {
                    item = item.with_content_of(ROOT_NAME);
                }
            }
            None => item = item.allowed_in(ROOT_NAME).object(),
        }
        for (key, _) in descriptor.allowed_attributes() {
            item = item.with_attribute(key);
        }
        schema.register(descriptor.name(), item)?;
    }
    Ok(())
}

/// The template feature: a built registry plus its installation into an engine
#[derive(Debug, Clone)]
pub struct TemplatePlugin {
    registry: Arc<TemplateRegistry>,
}

impl TemplatePlugin {
    /// Build the registry; configuration errors surface here, before any engine is touched
    pub fn new(config: &TemplateConfig) -> TemplateResult<Self> {
        Ok(Self::from_registry(TemplateRegistry::build(config)?))
    }

    pub fn from_registry(registry: TemplateRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Install schema items, converters, the integrity post-fixer and the command
    pub fn install(&self, engine: &mut EditingEngine) -> TemplateResult<()> {
        register_schema(&self.registry, engine.schema_mut()).map_err(EditError::from)?;

        let types = self.registry.all_types();
        engine.conversion_mut().register_upcaster(
            Priority::Normal,
            Box::new(TemplateUpcaster::new(Arc::clone(&self.registry), types.clone())),
        );
        for mode in [DowncastMode::Data, DowncastMode::Editing] {
            engine.conversion_mut().register_downcaster(
                mode,
                Priority::Normal,
                Box::new(TemplateDowncaster::new(Arc::clone(&self.registry), types.clone())),
            );
        }

        let names: HashSet<String> = self
            .registry
            .descriptors()
            .map(|descriptor| descriptor.name().to_string())
            .collect();
        engine.post_fixers_mut().register(
            Some(names),
            Box::new(IntegrityPostfixer::new(Arc::clone(&self.registry))),
        );

        let registry = Arc::clone(&self.registry);
        engine.register_command(
            COMMAND_NAME,
            Box::new(move |target: &str| {
                Box::new(InsertTemplate::new(Arc::clone(&registry), target)) as Box<dyn Command>
            }),
        );

        tracing::info!(
            templates = self.registry.templates().count(),
            descriptors = self.registry.len(),
            "template plugin installed"
        );
        Ok(())
    }

    /// Descriptor for a model element name
    pub fn element_info(&self, name: &str) -> Option<&ElementDescriptor> {
        self.registry.lookup_by_name(name)
    }

    pub fn elements_by_type(&self, element_type: &str) -> Vec<&ElementDescriptor> {
        self.registry.lookup_by_type(element_type)
    }

    /// Run the `template` command on an engine the plugin was installed into
    pub fn insert_template(&self, engine: &mut EditingEngine, name: &str) -> TemplateResult<()> {
        engine
            .execute_named(COMMAND_NAME, name)
            .map_err(TemplateError::from_edit)
    }
}
