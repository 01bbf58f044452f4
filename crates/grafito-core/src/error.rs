use thiserror::Error;

use crate::types::{EdgeId, NodeId, Owner};

/// Top-level error type for the Grafito graph store.
///
/// Every variant except [`GraphError::StoreUnavailable`] leaves the handle
/// usable: the failed operation has been rolled back in full.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    #[error("Property owner not found: {0}")]
    OwnerNotFound(Owner),

    #[error("Property not found: {key} on {owner}")]
    PropertyNotFound { owner: Owner, key: String },

    #[error("Unsupported property value: {0}")]
    UnsupportedValueType(String),

    #[error("Corrupt property value {value:?}: {reason}")]
    CorruptPropertyValue { value: String, reason: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GraphError {
    /// Whether the handle must be reopened after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<config::ConfigError> for GraphError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
