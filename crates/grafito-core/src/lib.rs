//! grafito-core: Shared types, value encoding, configuration, and error handling.
//!
//! This crate provides the foundational types used by the Grafito graph store:
//! - Node and edge identifiers, records, and property owners
//! - `PropertyValue` and its self-describing text encoding
//! - Store configuration
//! - The common error type

pub mod config;
pub mod error;
pub mod types;
pub mod value;

pub use config::{StoreConfig, Synchronous};
pub use error::{GraphError, Result};
pub use types::{Direction, Edge, EdgeId, GraphStats, Neighbor, Node, NodeId, Owner};
pub use value::{Properties, PropertyValue};
