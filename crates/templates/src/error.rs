//! Error types for template operations

use thiserror::Error;

/// Errors that can occur while configuring or inserting templates
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Malformed template definition or unreadable configuration
    #[error("Invalid template configuration: {0}")]
    Configuration(String),

    /// Two descriptors would share a generated name
    #[error("Template element name collision: {0}")]
    NameCollision(String),

    /// The command was invoked with a name that is not registered
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    /// No valid insertion point for the current selection
    #[error("Cannot insert template '{0}' at the current selection")]
    InvalidPosition(String),

    /// Failure reported by the editing engine
    #[error("Edit error: {0}")]
    Edit(#[from] edit_engine::EditError),
}

impl TemplateError {
    /// Recover a template error that travelled through the editing engine
    /// as a failed command; other errors are wrapped unchanged.
    pub fn from_edit(error: edit_engine::EditError) -> Self {
        match error {
            edit_engine::EditError::CommandFailed { command, source } => {
                match source.downcast::<TemplateError>() {
                    Ok(template_error) => *template_error,
                    Err(source) => {
                        TemplateError::Edit(edit_engine::EditError::CommandFailed { command, source })
                    }
                }
            }
            other => TemplateError::Edit(other),
        }
    }
}

/// A descriptor child that no longer resolves; repair skips it and carries on
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Repair of '{parent}' skipped missing child descriptor #{child}")]
pub struct RepairSkipped {
    pub parent: String,
    pub child: usize,
}

/// Result type for template operations
pub type TemplateResult<T> = std::result::Result<T, TemplateError>;
