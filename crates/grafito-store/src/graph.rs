//! The public graph handle.
//!
//! Every call runs in a transaction scope: it begins one, or joins the scope
//! already open on this handle (see [`GraphDb::transaction`]). A failure
//! rolls back everything the call did before the error reaches the caller.
//! Read-only calls begin deferred and take no write lock.

use std::path::Path;

use grafito_core::{
    Direction, Edge, EdgeId, GraphStats, Neighbor, Node, NodeId, Owner, Properties,
    PropertyValue, Result, StoreConfig,
};

use crate::client::StoreClient;
use crate::queries::{EdgeQuery, NodeQuery};

/// An open property-graph store.
///
/// Closing consumes the handle, so no operation can reach a closed store.
/// Dropping the handle closes it as well.
pub struct GraphDb {
    client: StoreClient,
}

impl GraphDb {
    // ── Lifecycle ────────────────────────────────────────────────

    /// Open (or create) the store file at `path` with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(&StoreConfig::with_path(path.as_ref()))
    }

    pub fn open_with(config: &StoreConfig) -> Result<Self> {
        Ok(Self {
            client: StoreClient::open(config)?,
        })
    }

    /// A private, non-persistent store.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            client: StoreClient::open_in_memory()?,
        })
    }

    /// Flush and close the backing file, reporting any failure.
    pub fn close(self) -> Result<()> {
        self.client.close()
    }

    pub fn path(&self) -> Option<&Path> {
        self.client.path()
    }

    /// Run `f` as one atomic unit. Graph calls made on the handle inside `f`
    /// join this transaction; it commits only if `f` returns `Ok`.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.client.transaction(|_| f(self))
    }

    fn scoped<T>(&self, f: impl FnOnce(&StoreClient) -> Result<T>) -> Result<T> {
        self.client.transaction(f)
    }

    fn reading<T>(&self, f: impl FnOnce(&StoreClient) -> Result<T>) -> Result<T> {
        self.client.read_transaction(f)
    }

    // ── Entities ─────────────────────────────────────────────────

    /// Create a node, optionally with initial properties, atomically.
    pub fn create_node(&self, label: &str, properties: Option<&Properties>) -> Result<NodeId> {
        self.scoped(|c| {
            let node_id = c.create_node(label)?;
            if let Some(props) = properties {
                c.set_properties(Owner::Node(node_id), props)?;
            }
            Ok(node_id)
        })
    }

    /// Create an edge between two existing nodes, optionally with initial
    /// properties, atomically.
    pub fn create_edge(
        &self,
        label: &str,
        source_id: NodeId,
        target_id: NodeId,
        properties: Option<&Properties>,
    ) -> Result<EdgeId> {
        self.scoped(|c| {
            let edge_id = c.create_edge(label, source_id, target_id)?;
            if let Some(props) = properties {
                c.set_properties(Owner::Edge(edge_id), props)?;
            }
            Ok(edge_id)
        })
    }

    /// Delete a node, its incident edges, and all their properties.
    pub fn delete_node(&self, node_id: NodeId) -> Result<()> {
        self.scoped(|c| c.delete_node(node_id))
    }

    pub fn delete_edge(&self, edge_id: EdgeId) -> Result<()> {
        self.scoped(|c| c.delete_edge(edge_id))
    }

    pub fn node_exists(&self, node_id: NodeId) -> Result<bool> {
        self.reading(|c| c.node_exists(node_id))
    }

    pub fn edge_exists(&self, edge_id: EdgeId) -> Result<bool> {
        self.reading(|c| c.edge_exists(edge_id))
    }

    pub fn get_node(&self, node_id: NodeId) -> Result<Node> {
        self.reading(|c| c.get_node(node_id))
    }

    pub fn get_edge(&self, edge_id: EdgeId) -> Result<Edge> {
        self.reading(|c| c.get_edge(edge_id))
    }

    // ── Queries ──────────────────────────────────────────────────

    pub fn nodes_by_label(&self, label: &str) -> Result<Vec<NodeId>> {
        self.reading(|c| c.nodes_by_label(label))
    }

    pub fn edges_by_label(&self, label: &str) -> Result<Vec<EdgeId>> {
        self.reading(|c| c.edges_by_label(label))
    }

    pub fn neighbors(&self, node_id: NodeId, direction: Direction) -> Result<Vec<Neighbor>> {
        self.reading(|c| c.neighbors(node_id, direction))
    }

    pub fn find_nodes(&self, query: &NodeQuery) -> Result<Vec<Node>> {
        self.reading(|c| c.find_nodes(query))
    }

    pub fn find_edges(&self, query: &EdgeQuery) -> Result<Vec<Edge>> {
        self.reading(|c| c.find_edges(query))
    }

    pub fn stats(&self) -> Result<GraphStats> {
        self.reading(|c| {
            Ok(GraphStats {
                nodes: c.count_nodes()?,
                edges: c.count_edges()?,
                graph_properties: c.count_graph_properties()?,
            })
        })
    }

    // ── Properties (any scope) ───────────────────────────────────

    pub fn get_property(&self, owner: Owner, key: &str) -> Result<PropertyValue> {
        self.reading(|c| c.get_property(owner, key))
    }

    pub fn set_property(
        &self,
        owner: Owner,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        let value = value.into();
        self.scoped(|c| c.set_property(owner, key, &value))
    }

    pub fn delete_property(&self, owner: Owner, key: &str) -> Result<()> {
        self.scoped(|c| c.delete_property(owner, key))
    }

    pub fn properties(&self, owner: Owner) -> Result<Properties> {
        self.reading(|c| c.all_properties(owner))
    }

    pub fn set_properties(&self, owner: Owner, properties: &Properties) -> Result<()> {
        self.scoped(|c| c.set_properties(owner, properties))
    }

    pub fn remove_properties<S: AsRef<str>>(&self, owner: Owner, keys: &[S]) -> Result<usize> {
        self.scoped(|c| c.remove_properties(owner, keys))
    }

    // ── Node Properties ──────────────────────────────────────────

    pub fn get_node_property(&self, node_id: NodeId, key: &str) -> Result<PropertyValue> {
        self.get_property(Owner::Node(node_id), key)
    }

    pub fn set_node_property(
        &self,
        node_id: NodeId,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        self.set_property(Owner::Node(node_id), key, value)
    }

    pub fn delete_node_property(&self, node_id: NodeId, key: &str) -> Result<()> {
        self.delete_property(Owner::Node(node_id), key)
    }

    pub fn node_properties(&self, node_id: NodeId) -> Result<Properties> {
        self.properties(Owner::Node(node_id))
    }

    pub fn set_node_properties(&self, node_id: NodeId, properties: &Properties) -> Result<()> {
        self.set_properties(Owner::Node(node_id), properties)
    }

    pub fn remove_node_properties<S: AsRef<str>>(
        &self,
        node_id: NodeId,
        keys: &[S],
    ) -> Result<usize> {
        self.remove_properties(Owner::Node(node_id), keys)
    }

    // ── Edge Properties ──────────────────────────────────────────

    pub fn get_edge_property(&self, edge_id: EdgeId, key: &str) -> Result<PropertyValue> {
        self.get_property(Owner::Edge(edge_id), key)
    }

    pub fn set_edge_property(
        &self,
        edge_id: EdgeId,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        self.set_property(Owner::Edge(edge_id), key, value)
    }

    pub fn delete_edge_property(&self, edge_id: EdgeId, key: &str) -> Result<()> {
        self.delete_property(Owner::Edge(edge_id), key)
    }

    pub fn edge_properties(&self, edge_id: EdgeId) -> Result<Properties> {
        self.properties(Owner::Edge(edge_id))
    }

    pub fn set_edge_properties(&self, edge_id: EdgeId, properties: &Properties) -> Result<()> {
        self.set_properties(Owner::Edge(edge_id), properties)
    }

    pub fn remove_edge_properties<S: AsRef<str>>(
        &self,
        edge_id: EdgeId,
        keys: &[S],
    ) -> Result<usize> {
        self.remove_properties(Owner::Edge(edge_id), keys)
    }

    // ── Graph Properties ─────────────────────────────────────────

    pub fn get_graph_property(&self, key: &str) -> Result<PropertyValue> {
        self.get_property(Owner::Graph, key)
    }

    pub fn set_graph_property(&self, key: &str, value: impl Into<PropertyValue>) -> Result<()> {
        self.set_property(Owner::Graph, key, value)
    }

    pub fn delete_graph_property(&self, key: &str) -> Result<()> {
        self.delete_property(Owner::Graph, key)
    }

    pub fn graph_properties(&self) -> Result<Properties> {
        self.properties(Owner::Graph)
    }

    pub fn set_graph_properties(&self, properties: &Properties) -> Result<()> {
        self.set_properties(Owner::Graph, properties)
    }

    pub fn remove_graph_properties<S: AsRef<str>>(&self, keys: &[S]) -> Result<usize> {
        self.remove_properties(Owner::Graph, keys)
    }
}
