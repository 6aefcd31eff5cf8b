//! Error types for document model operations

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DocModelError {
    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),

    #[error("Invalid position: node {node_id}, offset {offset}")]
    InvalidPosition { node_id: Uuid, offset: usize },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Tree structure error: {0}")]
    TreeStructureError(String),

    #[error("Schema item already registered: {0}")]
    DuplicateSchemaItem(String),

    #[error("Post-fixers did not converge after {passes} passes")]
    PostFixerDidNotConverge { passes: usize },
}

pub type Result<T> = std::result::Result<T, DocModelError>;
