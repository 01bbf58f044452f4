//! Error types for the grafito CLI.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid JSON value: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Graph error: {0}")]
    Graph(#[from] grafito_core::GraphError),
}

pub type Result<T> = std::result::Result<T, CliError>;
