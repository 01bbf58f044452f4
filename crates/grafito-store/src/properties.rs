//! Entity-attribute-value property storage for the graph, nodes, and edges.
//!
//! Each owner scope has its own table so that foreign-key cascades stay per
//! owner type. Values pass through the codec in `grafito_core::value`.

use rusqlite::params_from_iter;
use rusqlite::types::Value;

use grafito_core::value::{decode, encode};
use grafito_core::{GraphError, Owner, Properties, PropertyValue, Result};

use crate::client::StoreClient;

/// Table layout of one property scope.
struct PropertyTable {
    table: &'static str,
    /// Owner column and id; `None` for graph-level properties.
    owner: Option<(&'static str, i64)>,
}

impl PropertyTable {
    fn of(owner: Owner) -> Self {
        match owner {
            Owner::Graph => Self {
                table: "graph_properties",
                owner: None,
            },
            Owner::Node(id) => Self {
                table: "node_properties",
                owner: Some(("node_id", id.0)),
            },
            Owner::Edge(id) => Self {
                table: "edge_properties",
                owner: Some(("edge_id", id.0)),
            },
        }
    }

    /// Primary-key columns, also the upsert conflict target.
    fn key_columns(&self) -> String {
        match self.owner {
            Some((col, _)) => format!("{col}, key"),
            None => "key".to_string(),
        }
    }

    /// `WHERE` condition selecting the owner's rows, followed by `extra`.
    fn filter(&self, extra: Option<&str>) -> String {
        match (self.owner, extra) {
            (Some((col, _)), Some(extra)) => format!("{col} = ? AND {extra}"),
            (Some((col, _)), None) => format!("{col} = ?"),
            (None, Some(extra)) => extra.to_string(),
            (None, None) => "1 = 1".to_string(),
        }
    }

    /// Positional parameters: the owner id (if any) followed by `rest`.
    fn params(&self, rest: impl IntoIterator<Item = Value>) -> Vec<Value> {
        self.owner
            .map(|(_, id)| Value::Integer(id))
            .into_iter()
            .chain(rest)
            .collect()
    }
}

impl StoreClient {
    fn ensure_owner(&self, owner: Owner) -> Result<()> {
        let exists = match owner {
            Owner::Graph => true,
            Owner::Node(id) => self.node_exists(id)?,
            Owner::Edge(id) => self.edge_exists(id)?,
        };
        if exists {
            Ok(())
        } else {
            Err(GraphError::OwnerNotFound(owner))
        }
    }

    /// Value stored under `key` for `owner`.
    pub fn get_property(&self, owner: Owner, key: &str) -> Result<PropertyValue> {
        let t = PropertyTable::of(owner);
        let sql = format!(
            "SELECT value FROM {} WHERE {}",
            t.table,
            t.filter(Some("key = ?"))
        );
        let text: Option<String> = self.query_one(
            &sql,
            params_from_iter(t.params([Value::Text(key.to_string())])),
            |row| row.get(0),
        )?;

        match text {
            Some(text) => decode(&text),
            None => {
                self.ensure_owner(owner)?;
                Err(GraphError::PropertyNotFound {
                    owner,
                    key: key.to_string(),
                })
            }
        }
    }

    /// Insert or replace the value stored under `key` for `owner`.
    pub fn set_property(&self, owner: Owner, key: &str, value: &PropertyValue) -> Result<()> {
        self.ensure_owner(owner)?;
        let text = encode(value)?;
        self.upsert(&PropertyTable::of(owner), key, text)?;
        tracing::trace!(%owner, key, "Property set");
        Ok(())
    }

    /// Insert or replace several properties as one unit.
    ///
    /// Every value is encoded before anything is written, and the writes
    /// share one transaction scope, so either all keys are stored or none.
    pub fn set_properties(&self, owner: Owner, properties: &Properties) -> Result<()> {
        self.ensure_owner(owner)?;
        let encoded = properties
            .iter()
            .map(|(key, value)| encode(value).map(|text| (key.as_str(), text)))
            .collect::<Result<Vec<_>>>()?;

        let t = PropertyTable::of(owner);
        self.transaction(|client| {
            for (key, text) in encoded {
                client.upsert(&t, key, text)?;
            }
            Ok(())
        })?;
        tracing::trace!(%owner, count = properties.len(), "Properties set");
        Ok(())
    }

    fn upsert(&self, t: &PropertyTable, key: &str, text: String) -> Result<()> {
        let columns = t.key_columns();
        let placeholders = vec!["?"; t.owner.map_or(2, |_| 3)].join(", ");
        let sql = format!(
            "INSERT INTO {table} ({columns}, value) VALUES ({placeholders})
             ON CONFLICT ({columns}) DO UPDATE SET value = excluded.value",
            table = t.table,
        );
        self.execute(
            &sql,
            params_from_iter(t.params([Value::Text(key.to_string()), Value::Text(text)])),
        )?;
        Ok(())
    }

    /// Remove the value stored under `key` for `owner`.
    pub fn delete_property(&self, owner: Owner, key: &str) -> Result<()> {
        let t = PropertyTable::of(owner);
        let sql = format!("DELETE FROM {} WHERE {}", t.table, t.filter(Some("key = ?")));
        let removed = self.execute(
            &sql,
            params_from_iter(t.params([Value::Text(key.to_string())])),
        )?;

        if removed == 0 {
            self.ensure_owner(owner)?;
            return Err(GraphError::PropertyNotFound {
                owner,
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Remove whichever of `keys` exist for `owner`; returns how many were removed.
    pub fn remove_properties<S: AsRef<str>>(&self, owner: Owner, keys: &[S]) -> Result<usize> {
        self.ensure_owner(owner)?;
        if keys.is_empty() {
            return Ok(0);
        }

        let t = PropertyTable::of(owner);
        let sql = format!("DELETE FROM {} WHERE {}", t.table, t.filter(Some("key = ?")));
        self.transaction(|client| {
            let mut removed = 0;
            for key in keys {
                removed += client.execute(
                    &sql,
                    params_from_iter(t.params([Value::Text(key.as_ref().to_string())])),
                )?;
            }
            Ok(removed)
        })
    }

    /// Every property of `owner`, decoded.
    pub fn all_properties(&self, owner: Owner) -> Result<Properties> {
        self.ensure_owner(owner)?;

        let t = PropertyTable::of(owner);
        let sql = format!(
            "SELECT key, value FROM {} WHERE {} ORDER BY key",
            t.table,
            t.filter(None)
        );
        let rows: Vec<(String, String)> = self.query(
            &sql,
            params_from_iter(t.params([])),
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        rows.into_iter()
            .map(|(key, text)| decode(&text).map(|value| (key, value)))
            .collect()
    }

    pub fn count_graph_properties(&self) -> Result<u64> {
        self.count("SELECT COUNT(*) FROM graph_properties")
    }
}

#[cfg(test)]
mod tests {
    use grafito_core::{EdgeId, NodeId};

    use super::*;

    fn store() -> StoreClient {
        StoreClient::open_in_memory().unwrap()
    }

    fn props(pairs: &[(&str, PropertyValue)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn set_then_get_each_scope() {
        let store = store();
        let clu = store.create_node("Program").unwrap();
        let kevin = store.create_node("Person").unwrap();
        let created = store.create_edge("CREATED", kevin, clu).unwrap();

        for owner in [Owner::Graph, Owner::Node(clu), Owner::Edge(created)] {
            store
                .set_property(owner, "version", &PropertyValue::Float(2.0))
                .unwrap();
            assert_eq!(
                store.get_property(owner, "version").unwrap(),
                PropertyValue::Float(2.0)
            );
        }
    }

    #[test]
    fn set_overwrites_existing_key() {
        let store = store();
        let n = store.create_node("User").unwrap();
        store.set_property(Owner::Node(n), "k", &1.into()).unwrap();
        store.set_property(Owner::Node(n), "k", &2.into()).unwrap();

        let all = store.all_properties(Owner::Node(n)).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["k"], PropertyValue::Int(2));
    }

    #[test]
    fn missing_property_and_missing_owner() {
        let store = store();
        let n = store.create_node("User").unwrap();

        assert!(matches!(
            store.get_property(Owner::Node(n), "absent"),
            Err(GraphError::PropertyNotFound { .. })
        ));
        assert!(matches!(
            store.get_property(Owner::Graph, "absent"),
            Err(GraphError::PropertyNotFound { .. })
        ));
        assert!(matches!(
            store.get_property(Owner::Node(NodeId(42)), "absent"),
            Err(GraphError::OwnerNotFound(Owner::Node(NodeId(42))))
        ));
        assert!(matches!(
            store.set_property(Owner::Edge(EdgeId(42)), "k", &PropertyValue::Null),
            Err(GraphError::OwnerNotFound(Owner::Edge(EdgeId(42))))
        ));
        assert!(matches!(
            store.all_properties(Owner::Node(NodeId(42))),
            Err(GraphError::OwnerNotFound(_))
        ));
    }

    #[test]
    fn delete_property_removes_only_that_key() {
        let store = store();
        let clu = store.create_node("Program").unwrap();
        let owner = Owner::Node(clu);
        store
            .set_properties(
                owner,
                &props(&[("name", "CLU".into()), ("purpose", "Perfection".into())]),
            )
            .unwrap();

        store.delete_property(owner, "purpose").unwrap();
        assert_eq!(
            store.all_properties(owner).unwrap(),
            props(&[("name", "CLU".into())])
        );
        assert!(matches!(
            store.delete_property(owner, "purpose"),
            Err(GraphError::PropertyNotFound { .. })
        ));
    }

    #[test]
    fn set_properties_is_all_or_nothing() {
        let store = store();
        let n = store.create_node("Program").unwrap();
        let owner = Owner::Node(n);

        let err = store
            .set_properties(
                owner,
                &props(&[
                    ("name", "CLU".into()),
                    ("score", PropertyValue::Float(f64::NAN)),
                ]),
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::UnsupportedValueType(_)));
        assert!(store.all_properties(owner).unwrap().is_empty());
    }

    #[test]
    fn remove_properties_ignores_absent_keys() {
        let store = store();
        store
            .set_properties(
                Owner::Graph,
                &props(&[("version", "2.0".into()), ("status", "Active".into())]),
            )
            .unwrap();

        let removed = store
            .remove_properties(Owner::Graph, &["version", "never-set"])
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(
            store.all_properties(Owner::Graph).unwrap(),
            props(&[("status", "Active".into())])
        );
        assert_eq!(store.remove_properties::<&str>(Owner::Graph, &[]).unwrap(), 0);
    }

    #[test]
    fn remove_properties_checks_owner_even_without_keys() {
        let store = store();
        let gone = Owner::Node(NodeId(42));
        assert!(matches!(
            store.remove_properties::<&str>(gone, &[]),
            Err(GraphError::OwnerNotFound(_))
        ));
        assert!(matches!(
            store.remove_properties(gone, &["name"]),
            Err(GraphError::OwnerNotFound(_))
        ));
    }

    #[test]
    fn scopes_do_not_share_keys() {
        let store = store();
        let n = store.create_node("User").unwrap();
        let m = store.create_node("User").unwrap();
        let e = store.create_edge("KNOWS", n, m).unwrap();

        store.set_property(Owner::Graph, "name", &"grid".into()).unwrap();
        store.set_property(Owner::Node(n), "name", &"flynn".into()).unwrap();
        store.set_property(Owner::Edge(e), "name", &"bond".into()).unwrap();

        assert_eq!(store.get_property(Owner::Graph, "name").unwrap(), PropertyValue::from("grid"));
        assert_eq!(store.get_property(Owner::Node(n), "name").unwrap(), PropertyValue::from("flynn"));
        assert_eq!(store.get_property(Owner::Edge(e), "name").unwrap(), PropertyValue::from("bond"));
        assert!(store.all_properties(Owner::Node(m)).unwrap().is_empty());
    }

    #[test]
    fn tampered_value_is_corrupt() {
        let store = store();
        store
            .execute(
                "INSERT INTO graph_properties (key, value) VALUES ('motd', 'not json')",
                [],
            )
            .unwrap();
        assert!(matches!(
            store.get_property(Owner::Graph, "motd"),
            Err(GraphError::CorruptPropertyValue { .. })
        ));
    }

    #[test]
    fn properties_cascade_with_owner() {
        let store = store();
        let n = store.create_node("User").unwrap();
        store.set_property(Owner::Node(n), "k", &1.into()).unwrap();
        store.delete_node(n).unwrap();

        let rows = store.count("SELECT COUNT(*) FROM node_properties").unwrap();
        assert_eq!(rows, 0);
    }
}
