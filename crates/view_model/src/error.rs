//! Error types for view and conversion operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Malformed markup: {0}")]
    Malformed(String),

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),
}

pub type Result<T> = std::result::Result<T, ViewError>;
