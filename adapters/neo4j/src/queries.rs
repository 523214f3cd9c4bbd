//! Cypher queries for Neo4j operations
//!
//! Labels and relationship types cannot be query parameters, so the
//! statements that need them are rendered per kind.

use crate::utils::sanitize_label;
use covgraph_core::errors::GraphError;
use covgraph_core::types::{EdgeKind, NodeKind};

/// Delete every node and relationship
pub const DELETE_ALL: &str = "MATCH (n) DETACH DELETE n";

/// Connection probe
pub const PING: &str = "RETURN 1";

/// Count nodes
pub const COUNT_NODES: &str = "MATCH (n) RETURN count(n) as node_count";

/// Index on the system id of one label
pub fn create_index(kind: NodeKind) -> Result<String, GraphError> {
    let label = sanitize_label(kind.label())?;
    Ok(format!(
        "CREATE INDEX {}_system_id_idx IF NOT EXISTS FOR (n:{}) ON (n.system_id)",
        label.to_lowercase(),
        label
    ))
}

/// Create a node with a client-generated system id
pub fn create_node(kind: NodeKind) -> Result<String, GraphError> {
    let label = sanitize_label(kind.label())?;
    Ok(format!(
        "CREATE (n:{} {{system_id: $system_id}}) SET n += $props",
        label
    ))
}

/// Create a relationship between two nodes matched by system id
pub fn create_edge(from: NodeKind, kind: EdgeKind, to: NodeKind) -> Result<String, GraphError> {
    let from_label = sanitize_label(from.label())?;
    let to_label = sanitize_label(to.label())?;
    let rel_type = sanitize_label(kind.rel_type())?;
    Ok(format!(
        "MATCH (a:{} {{system_id: $from_id}}), (b:{} {{system_id: $to_id}}) CREATE (a)-[:{}]->(b)",
        from_label, to_label, rel_type
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_statements() {
        assert_eq!(
            create_node(NodeKind::Nuts3Region).unwrap(),
            "CREATE (n:NUTS3Region {system_id: $system_id}) SET n += $props"
        );
        assert_eq!(
            create_edge(NodeKind::Person, EdgeKind::HasStrain, NodeKind::Strain).unwrap(),
            "MATCH (a:Person {system_id: $from_id}), (b:Strain {system_id: $to_id}) CREATE (a)-[:HAS_STRAIN]->(b)"
        );
        assert!(create_index(NodeKind::PostCode)
            .unwrap()
            .starts_with("CREATE INDEX postcode_system_id_idx IF NOT EXISTS FOR (n:PostCode)"));
    }

    #[test]
    fn test_every_kind_renders() {
        for kind in NodeKind::ALL {
            assert!(create_node(kind).is_ok());
            assert!(create_index(kind).is_ok());
        }
        for kind in EdgeKind::ALL {
            assert!(create_edge(NodeKind::Person, kind, NodeKind::Country).is_ok());
        }
    }
}
