//! Command implementations, kept separate from argument parsing so they can
//! be driven against an in-memory store.

use grafito_core::{Direction, Edge, GraphStats, Neighbor, Node, NodeId, Properties, PropertyValue};
use grafito_store::{EdgeQuery, GraphDb, NodeQuery};

use crate::error::Result;

pub fn stats(db: &GraphDb) -> Result<GraphStats> {
    Ok(db.stats()?)
}

/// Every node carrying `label`, with its properties.
pub fn nodes(db: &GraphDb, label: &str) -> Result<Vec<Node>> {
    Ok(db.find_nodes(&NodeQuery::label(label))?)
}

/// Every edge carrying `label`, with its properties.
pub fn edges(db: &GraphDb, label: &str) -> Result<Vec<Edge>> {
    Ok(db.find_edges(&EdgeQuery::label(label))?)
}

pub fn neighbors(db: &GraphDb, node_id: NodeId, direction: Direction) -> Result<Vec<Neighbor>> {
    Ok(db.neighbors(node_id, direction)?)
}

pub fn graph_props(db: &GraphDb) -> Result<Properties> {
    Ok(db.graph_properties()?)
}

/// Parse `json` and store it as graph property `key`. Returns the stored value.
pub fn set_graph_prop(db: &GraphDb, key: &str, json: &str) -> Result<PropertyValue> {
    let raw: serde_json::Value = serde_json::from_str(json)?;
    let value = PropertyValue::from_serialize(&raw)?;
    db.set_graph_property(key, value.clone())?;
    tracing::info!(key, kind = value.type_name(), "Graph property set");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use grafito_core::GraphError;

    fn seeded() -> GraphDb {
        let db = GraphDb::open_in_memory().unwrap();
        let mut name = Properties::new();
        name.insert("name".to_string(), "Kevin Flynn".into());
        let kevin = db.create_node("Person", Some(&name)).unwrap();
        let clu = db.create_node("Program", None).unwrap();
        db.create_edge("CREATED", kevin, clu, None).unwrap();
        db
    }

    #[test]
    fn test_stats_counts() {
        let db = seeded();
        let s = stats(&db).unwrap();
        assert_eq!((s.nodes, s.edges, s.graph_properties), (2, 1, 0));
    }

    #[test]
    fn test_nodes_and_edges_by_label() {
        let db = seeded();
        let people = nodes(&db, "Person").unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].properties["name"], PropertyValue::from("Kevin Flynn"));

        let created = edges(&db, "CREATED").unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].source_id, people[0].id);
        assert!(nodes(&db, "ISO").unwrap().is_empty());
    }

    #[test]
    fn test_neighbors_of_missing_node() {
        let db = seeded();
        let err = neighbors(&db, NodeId(42), Direction::Both).unwrap_err();
        assert!(matches!(err, CliError::Graph(GraphError::NodeNotFound(_))));
    }

    #[test]
    fn test_set_graph_prop_from_json() {
        let db = seeded();
        let stored = set_graph_prop(&db, "version", r#"{"major": 2, "tag": "legacy"}"#).unwrap();
        assert_eq!(stored.type_name(), "map");
        assert_eq!(graph_props(&db).unwrap()["version"], stored);

        set_graph_prop(&db, "ratio", "1.0").unwrap();
        assert_eq!(
            db.get_graph_property("ratio").unwrap(),
            PropertyValue::Float(1.0)
        );
    }

    #[test]
    fn test_set_graph_prop_rejects_bad_json() {
        let db = seeded();
        let err = set_graph_prop(&db, "version", "{not json").unwrap_err();
        assert!(matches!(err, CliError::InvalidJson(_)));
        assert!(graph_props(&db).unwrap().is_empty());
    }
}
