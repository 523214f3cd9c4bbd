//! Utility functions for Neo4j operations

use covgraph_core::errors::GraphError;
use neo4rs::{BoltMap, BoltType};
use serde_json::Value;

/// Convert one JSON property value to a Bolt value.
///
/// Null yields `None`: Neo4j does not store null properties. Nested arrays
/// and objects are stored as their JSON text.
pub fn json_to_bolt(value: &Value) -> Option<BoltType> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(BoltType::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(BoltType::from(i)),
            None => n.as_f64().map(BoltType::from),
        },
        Value::String(s) => Some(BoltType::from(s.as_str())),
        Value::Array(_) | Value::Object(_) => Some(BoltType::from(value.to_string())),
    }
}

/// Convert a node's JSON properties to the `$props` map parameter
pub fn props_to_bolt(props: &Value) -> Result<BoltMap, GraphError> {
    let map = match props {
        Value::Object(map) => map,
        Value::Null => return Ok(BoltMap::new()),
        _ => {
            return Err(GraphError::DatabaseError(
                "Expected JSON object for properties".to_string(),
            ))
        }
    };

    let mut bolt = BoltMap::new();
    for (key, value) in map {
        if let Some(value) = json_to_bolt(value) {
            bolt.put(key.as_str().into(), value);
        }
    }
    Ok(bolt)
}

/// Sanitize a label name for Cypher
pub fn sanitize_label(label: &str) -> Result<&str, GraphError> {
    // Check for valid label characters (alphanumeric, underscore)
    if label.chars().all(|c| c.is_alphanumeric() || c == '_') && !label.is_empty() {
        Ok(label)
    } else {
        Err(GraphError::QueryFailed(format!("Invalid label name: {}", label)))
    }
}
