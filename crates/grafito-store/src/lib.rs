//! Grafito Store: an embedded property graph on SQLite.
//!
//! Nodes, directed labeled edges, and key/value properties on the graph,
//! nodes, and edges are kept in one SQLite file. Referential integrity and
//! cascade deletion are enforced by the schema's foreign keys; properties are
//! stored entity-attribute-value style, one row per key.
//!
//! [`GraphDb`] is the public handle. [`StoreClient`] exposes the same
//! building blocks without implicit transaction scoping.

pub mod client;
pub mod entities;
pub mod graph;
pub mod properties;
pub mod queries;

pub use client::StoreClient;
pub use graph::GraphDb;
pub use queries::{EdgeQuery, NodeQuery};

pub use grafito_core::{
    Direction, Edge, EdgeId, GraphError, GraphStats, Neighbor, Node, NodeId, Owner, Properties,
    PropertyValue, Result, StoreConfig,
};
