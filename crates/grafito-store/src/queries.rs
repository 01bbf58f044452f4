//! Record reconstruction and filtered search over nodes and edges.
//!
//! Matching ids are selected by a subquery and joined against the property
//! table in one pass, so a result set costs a single round trip regardless
//! of its size.

use rusqlite::params_from_iter;
use rusqlite::types::Value;

use grafito_core::value::{decode, encode};
use grafito_core::{Edge, EdgeId, GraphError, Node, NodeId, Properties, PropertyValue, Result};

use crate::client::StoreClient;

/// Criteria for [`StoreClient::find_nodes`]. All given criteria must match.
#[derive(Debug, Clone, Default)]
pub struct NodeQuery {
    pub label: Option<String>,
    /// Each key must be present with exactly this value.
    pub properties: Properties,
}

impl NodeQuery {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Criteria for [`StoreClient::find_edges`]. All given criteria must match.
#[derive(Debug, Clone, Default)]
pub struct EdgeQuery {
    pub source_id: Option<NodeId>,
    pub target_id: Option<NodeId>,
    pub label: Option<String>,
    pub properties: Properties,
}

impl EdgeQuery {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn from_node(mut self, source_id: NodeId) -> Self {
        self.source_id = Some(source_id);
        self
    }

    pub fn to_node(mut self, target_id: NodeId) -> Self {
        self.target_id = Some(target_id);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Raw joined row: entity columns plus an optional property pair.
struct JoinedRow<E> {
    entity: E,
    key: Option<String>,
    value: Option<String>,
}

impl StoreClient {
    // ── Single Record Lookups ────────────────────────────────────

    /// A node with all of its properties.
    pub fn get_node(&self, node_id: NodeId) -> Result<Node> {
        self.fetch_nodes("?", vec![Value::Integer(node_id.0)])?
            .pop()
            .ok_or(GraphError::NodeNotFound(node_id))
    }

    /// An edge with all of its properties.
    pub fn get_edge(&self, edge_id: EdgeId) -> Result<Edge> {
        self.fetch_edges("?", vec![Value::Integer(edge_id.0)])?
            .pop()
            .ok_or(GraphError::EdgeNotFound(edge_id))
    }

    // ── Search ───────────────────────────────────────────────────

    /// Nodes matching every criterion in `query`, ordered by id.
    pub fn find_nodes(&self, query: &NodeQuery) -> Result<Vec<Node>> {
        if query.label.is_none() && query.properties.is_empty() {
            return Err(GraphError::InvalidArgument(
                "Node search needs a label or at least one property".to_string(),
            ));
        }

        let mut params = Vec::new();
        let id_sql = if query.properties.is_empty() {
            params.push(Value::Text(query.label.clone().unwrap_or_default()));
            "SELECT node_id FROM nodes WHERE label = ?".to_string()
        } else {
            let (matches, having) = property_match(&query.properties, "np", &mut params)?;
            let label_filter = match &query.label {
                Some(label) => {
                    params.push(Value::Text(label.clone()));
                    " AND n.label = ?"
                }
                None => "",
            };
            params.push(having);
            format!(
                "SELECT np.node_id FROM node_properties AS np
                 JOIN nodes AS n ON n.node_id = np.node_id
                 WHERE ({matches}){label_filter}
                 GROUP BY np.node_id HAVING COUNT(*) = ?"
            )
        };

        self.fetch_nodes(&id_sql, params)
    }

    /// Edges matching every criterion in `query`, ordered by id.
    pub fn find_edges(&self, query: &EdgeQuery) -> Result<Vec<Edge>> {
        if query.source_id.is_none()
            && query.target_id.is_none()
            && query.label.is_none()
            && query.properties.is_empty()
        {
            return Err(GraphError::InvalidArgument(
                "Edge search needs at least one criterion".to_string(),
            ));
        }

        let mut params = Vec::new();
        let mut conditions = Vec::new();

        let prop_sql = if query.properties.is_empty() {
            None
        } else {
            Some(property_match(&query.properties, "ep", &mut params)?)
        };
        if let Some((matches, _)) = &prop_sql {
            conditions.push(format!("({matches})"));
        }
        if let Some(source_id) = query.source_id {
            conditions.push("e.source_id = ?".to_string());
            params.push(Value::Integer(source_id.0));
        }
        if let Some(target_id) = query.target_id {
            conditions.push("e.target_id = ?".to_string());
            params.push(Value::Integer(target_id.0));
        }
        if let Some(label) = &query.label {
            conditions.push("e.label = ?".to_string());
            params.push(Value::Text(label.clone()));
        }
        let where_sql = conditions.join(" AND ");

        let id_sql = match prop_sql {
            Some((_, having)) => {
                params.push(having);
                format!(
                    "SELECT ep.edge_id FROM edge_properties AS ep
                     JOIN edges AS e ON e.edge_id = ep.edge_id
                     WHERE {where_sql}
                     GROUP BY ep.edge_id HAVING COUNT(*) = ?"
                )
            }
            None => format!("SELECT e.edge_id FROM edges AS e WHERE {where_sql}"),
        };

        self.fetch_edges(&id_sql, params)
    }

    // ── Reconstruction ───────────────────────────────────────────

    fn fetch_nodes(&self, id_sql: &str, params: Vec<Value>) -> Result<Vec<Node>> {
        let sql = format!(
            "SELECT n.node_id, n.label, p.key, p.value
             FROM nodes AS n
             LEFT JOIN node_properties AS p ON p.node_id = n.node_id
             WHERE n.node_id IN ({id_sql})
             ORDER BY n.node_id, p.key"
        );
        let rows = self.query(&sql, params_from_iter(params), |row| {
            Ok(JoinedRow {
                entity: Node {
                    id: NodeId(row.get(0)?),
                    label: row.get(1)?,
                    properties: Properties::new(),
                },
                key: row.get(2)?,
                value: row.get(3)?,
            })
        })?;

        fold_rows(rows, |a, b| a.id == b.id, |node| &mut node.properties)
    }

    fn fetch_edges(&self, id_sql: &str, params: Vec<Value>) -> Result<Vec<Edge>> {
        let sql = format!(
            "SELECT e.edge_id, e.source_id, e.target_id, e.label, p.key, p.value
             FROM edges AS e
             LEFT JOIN edge_properties AS p ON p.edge_id = e.edge_id
             WHERE e.edge_id IN ({id_sql})
             ORDER BY e.edge_id, p.key"
        );
        let rows = self.query(&sql, params_from_iter(params), |row| {
            Ok(JoinedRow {
                entity: Edge {
                    id: EdgeId(row.get(0)?),
                    source_id: NodeId(row.get(1)?),
                    target_id: NodeId(row.get(2)?),
                    label: row.get(3)?,
                    properties: Properties::new(),
                },
                key: row.get(4)?,
                value: row.get(5)?,
            })
        })?;

        fold_rows(rows, |a, b| a.id == b.id, |edge| &mut edge.properties)
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Build `(key = ? AND value = ?) OR ...` over the property alias, pushing
/// its parameters. Returns the clause and the match count for `HAVING`.
fn property_match(
    properties: &Properties,
    alias: &str,
    params: &mut Vec<Value>,
) -> Result<(String, Value)> {
    let mut clauses = Vec::with_capacity(properties.len());
    for (key, value) in properties {
        clauses.push(format!("({alias}.key = ? AND {alias}.value = ?)"));
        params.push(Value::Text(key.clone()));
        params.push(Value::Text(encode(value)?));
    }
    Ok((clauses.join(" OR "), Value::Integer(properties.len() as i64)))
}

/// Collapse ordered joined rows into one entity per id.
fn fold_rows<E>(
    rows: Vec<JoinedRow<E>>,
    same: impl Fn(&E, &E) -> bool,
    props: impl Fn(&mut E) -> &mut Properties,
) -> Result<Vec<E>> {
    let mut out: Vec<E> = Vec::new();
    for JoinedRow { entity, key, value } in rows {
        if !out.last().is_some_and(|last| same(last, &entity)) {
            out.push(entity);
        }
        let Some(current) = out.last_mut() else {
            continue;
        };
        if let (Some(key), Some(text)) = (key, value) {
            props(current).insert(key, decode(&text)?);
        }
    }
    Ok(out)
}
