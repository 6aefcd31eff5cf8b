//! Error types for editing operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Command '{command}' failed: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    #[error("View error: {0}")]
    View(#[from] view_model::ViewError),
}

impl EditError {
    /// Wrap an error raised by a command's own logic
    pub fn command_failed(
        command: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, EditError>;
