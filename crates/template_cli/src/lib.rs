//! Template CLI - validate configurations and normalize documents
//!
//! Every action builds the template registry from a JSON configuration.
//! Document actions install it into a fresh editing engine, so loading,
//! repairing and serializing go through the same pipeline as the editor.

mod args;

pub use args::*;

use anyhow::{Context, Result};
use doc_model::{Position, Selection};
use edit_engine::EditingEngine;
use std::io::Write;
use std::path::Path;
use templates::{TemplateConfig, TemplatePlugin};
use view_model::to_markup;

/// Run one action, writing its report to `out`
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    match &cli.action {
        Action::Check { config } => check(config, out),
        Action::List {
            config,
            element_type,
        } => list(config, element_type.as_deref(), out),
        Action::Normalize {
            config,
            input,
            output,
            editing,
        } => {
            let (engine, _) = load_document(config, Some(input))?;
            let markup = if *editing {
                to_markup(&engine.editing_view())
            } else {
                engine.get_data()
            };
            match output {
                Some(path) => std::fs::write(path, markup)
                    .with_context(|| format!("failed to write {}", path.display())),
                None => Ok(writeln!(out, "{markup}")?),
            }
        }
        Action::Insert {
            config,
            template,
            input,
        } => {
            let (mut engine, plugin) = load_document(config, input.as_deref())?;
            let root = engine.tree().root_id();
            let end = Position::end_of(engine.tree(), root);
            engine.set_selection(Selection::collapsed(end))?;
            plugin.insert_template(&mut engine, template)?;
            writeln!(out, "{}", engine.get_data())?;
            Ok(())
        }
    }
}

fn load_plugin(path: &Path) -> Result<TemplatePlugin> {
    let config = TemplateConfig::from_path(path)?;
    let plugin = TemplatePlugin::new(&config)
        .with_context(|| format!("invalid configuration {}", path.display()))?;
    Ok(plugin)
}

fn load_document(config: &Path, input: Option<&Path>) -> Result<(EditingEngine, TemplatePlugin)> {
    let plugin = load_plugin(config)?;
    let mut engine = EditingEngine::new();
    plugin.install(&mut engine)?;

    if let Some(input) = input {
        let markup = std::fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?;
        engine
            .set_data(&markup)
            .with_context(|| format!("failed to load {}", input.display()))?;
        tracing::info!(input = %input.display(), nodes = engine.tree().node_count(), "document loaded");
    }
    Ok((engine, plugin))
}

fn check(config: &Path, out: &mut impl Write) -> Result<()> {
    let plugin = load_plugin(config)?;
    let registry = plugin.registry();
    for info in registry.templates() {
        let size = registry
            .descriptors()
            .filter(|descriptor| descriptor.template() == info.name)
            .count();
        writeln!(out, "{}: {} ({} elements)", info.name, info.label, size)?;
    }
    writeln!(
        out,
        "{} templates, {} elements",
        registry.templates().count(),
        registry.len()
    )?;
    Ok(())
}

fn list(config: &Path, element_type: Option<&str>, out: &mut impl Write) -> Result<()> {
    let plugin = load_plugin(config)?;
    let descriptors = match element_type {
        Some(element_type) => plugin.elements_by_type(element_type),
        None => plugin.registry().descriptors().collect(),
    };
    for descriptor in descriptors {
        writeln!(
            out,
            "{}\t<{}>\t{}\t{}",
            descriptor.name(),
            descriptor.tag(),
            descriptor.element_type(),
            descriptor.children().len()
        )?;
    }
    Ok(())
}
