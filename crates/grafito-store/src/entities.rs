//! Node and edge identity: creation, existence, deletion, and lookups.
//!
//! These methods run in whatever transaction scope the caller holds.
//! Deletion is a single `DELETE` on the owning row; the schema's
//! `ON DELETE CASCADE` keys remove incident edges and dependent properties.

use rusqlite::params;

use grafito_core::{Direction, EdgeId, GraphError, Neighbor, NodeId, Result};

use crate::client::StoreClient;

impl StoreClient {
    // ── Creation ─────────────────────────────────────────────────

    /// Insert a node and return its newly allocated id.
    pub fn create_node(&self, label: &str) -> Result<NodeId> {
        validate_label(label)?;
        self.execute("INSERT INTO nodes (label) VALUES (?1)", [label])?;

        let node_id = NodeId(self.last_insert_rowid());
        tracing::debug!(%node_id, label, "Node created");
        Ok(node_id)
    }

    /// Insert an edge between two existing nodes.
    pub fn create_edge(&self, label: &str, source: NodeId, target: NodeId) -> Result<EdgeId> {
        validate_label(label)?;
        for endpoint in [source, target] {
            if !self.node_exists(endpoint)? {
                return Err(GraphError::NodeNotFound(endpoint));
            }
        }

        self.execute(
            "INSERT INTO edges (source_id, target_id, label) VALUES (?1, ?2, ?3)",
            params![source.0, target.0, label],
        )?;

        let edge_id = EdgeId(self.last_insert_rowid());
        tracing::debug!(%edge_id, %source, %target, label, "Edge created");
        Ok(edge_id)
    }

    // ── Existence ────────────────────────────────────────────────

    pub fn node_exists(&self, node_id: NodeId) -> Result<bool> {
        let found = self.query_one(
            "SELECT 1 FROM nodes WHERE node_id = ?1",
            [node_id.0],
            |_| Ok(()),
        )?;
        Ok(found.is_some())
    }

    pub fn edge_exists(&self, edge_id: EdgeId) -> Result<bool> {
        let found = self.query_one(
            "SELECT 1 FROM edges WHERE edge_id = ?1",
            [edge_id.0],
            |_| Ok(()),
        )?;
        Ok(found.is_some())
    }

    /// Label of a node.
    pub fn node_label(&self, node_id: NodeId) -> Result<String> {
        self.query_one(
            "SELECT label FROM nodes WHERE node_id = ?1",
            [node_id.0],
            |row| row.get(0),
        )?
        .ok_or(GraphError::NodeNotFound(node_id))
    }

    /// Source and target of an edge.
    pub fn edge_endpoints(&self, edge_id: EdgeId) -> Result<(NodeId, NodeId)> {
        self.query_one(
            "SELECT source_id, target_id FROM edges WHERE edge_id = ?1",
            [edge_id.0],
            |row| Ok((NodeId(row.get(0)?), NodeId(row.get(1)?))),
        )?
        .ok_or(GraphError::EdgeNotFound(edge_id))
    }

    // ── Deletion ─────────────────────────────────────────────────

    /// Delete a node together with its incident edges and all their properties.
    pub fn delete_node(&self, node_id: NodeId) -> Result<()> {
        let removed = self.execute("DELETE FROM nodes WHERE node_id = ?1", [node_id.0])?;
        if removed == 0 {
            return Err(GraphError::NodeNotFound(node_id));
        }
        tracing::debug!(%node_id, "Node deleted");
        Ok(())
    }

    /// Delete an edge and its properties.
    pub fn delete_edge(&self, edge_id: EdgeId) -> Result<()> {
        let removed = self.execute("DELETE FROM edges WHERE edge_id = ?1", [edge_id.0])?;
        if removed == 0 {
            return Err(GraphError::EdgeNotFound(edge_id));
        }
        tracing::debug!(%edge_id, "Edge deleted");
        Ok(())
    }

    // ── Index Lookups ────────────────────────────────────────────

    /// Ids of all nodes carrying `label`, in allocation order.
    pub fn nodes_by_label(&self, label: &str) -> Result<Vec<NodeId>> {
        self.query(
            "SELECT node_id FROM nodes WHERE label = ?1 ORDER BY node_id",
            [label],
            |row| Ok(NodeId(row.get(0)?)),
        )
    }

    /// Ids of all edges carrying `label`, in allocation order.
    pub fn edges_by_label(&self, label: &str) -> Result<Vec<EdgeId>> {
        self.query(
            "SELECT edge_id FROM edges WHERE label = ?1 ORDER BY edge_id",
            [label],
            |row| Ok(EdgeId(row.get(0)?)),
        )
    }

    /// Edges incident to `node_id` in the given direction, each paired with
    /// the node at its other end.
    ///
    /// A self-loop is reported once per direction, so twice for
    /// [`Direction::Both`].
    pub fn neighbors(&self, node_id: NodeId, direction: Direction) -> Result<Vec<Neighbor>> {
        if !self.node_exists(node_id)? {
            return Err(GraphError::NodeNotFound(node_id));
        }

        let mut neighbors = Vec::new();
        if matches!(direction, Direction::Outgoing | Direction::Both) {
            neighbors.extend(self.query(
                "SELECT edge_id, target_id FROM edges WHERE source_id = ?1 ORDER BY edge_id",
                [node_id.0],
                map_neighbor,
            )?);
        }
        if matches!(direction, Direction::Incoming | Direction::Both) {
            neighbors.extend(self.query(
                "SELECT edge_id, source_id FROM edges WHERE target_id = ?1 ORDER BY edge_id",
                [node_id.0],
                map_neighbor,
            )?);
        }
        Ok(neighbors)
    }

    // ── Counts ───────────────────────────────────────────────────

    pub fn count_nodes(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM nodes")
    }

    pub fn count_edges(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM edges")
    }

    pub(crate) fn count(&self, sql: &str) -> Result<u64> {
        let n: i64 = self.query_one(sql, [], |row| row.get(0))?.unwrap_or(0);
        Ok(n.max(0) as u64)
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(GraphError::InvalidArgument(
            "Label must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn map_neighbor(row: &rusqlite::Row<'_>) -> rusqlite::Result<Neighbor> {
    Ok(Neighbor {
        edge_id: EdgeId(row.get(0)?),
        node_id: NodeId(row.get(1)?),
    })
}
