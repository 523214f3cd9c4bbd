//! Round trips against a live server.
//!
//! Run with `cargo test -- --ignored` and `NEO4J_TEST_URI`, `NEO4J_TEST_USER`
//! and `NEO4J_TEST_PASSWORD` pointing at a disposable database; every test
//! clears it.

use covgraph_adapter_neo4j::{Neo4jConfig, Neo4jStore};
use covgraph_core::prelude::*;

async fn connect() -> Neo4jStore {
    let uri = std::env::var("NEO4J_TEST_URI").unwrap_or_else(|_| "bolt://localhost:7687".to_string());
    let user = std::env::var("NEO4J_TEST_USER").unwrap_or_else(|_| "neo4j".to_string());
    let password = std::env::var("NEO4J_TEST_PASSWORD").unwrap_or_else(|_| "neo4j".to_string());
    Neo4jStore::new(Neo4jConfig::new(uri).with_auth(user, password))
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "needs a running Neo4j server"]
async fn test_commit_and_clear() {
    let store = connect().await;
    store.clear().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let child = tx
        .create_node(Node::new(NodeKind::Strain).with_property("name", "20A/20B"))
        .await
        .unwrap();
    let parent = tx
        .create_node(Node::new(NodeKind::Strain).with_property("name", "20A"))
        .await
        .unwrap();
    tx.create_edge(Edge::new(child, EdgeKind::EvolvedFrom, parent))
        .await
        .unwrap();
    tx.commit().await.unwrap();
    assert_eq!(store.count_nodes().await.unwrap(), 2);

    store.clear().await.unwrap();
    assert_eq!(store.count_nodes().await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "needs a running Neo4j server"]
async fn test_rollback_and_unknown_endpoint() {
    let store = connect().await;
    store.clear().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let person = tx
        .create_node(Node::new(NodeKind::Person).with_property("age", serde_json::Value::Null))
        .await
        .unwrap();
    let err = tx
        .create_edge(Edge::new(person, EdgeKind::IsA, NodeId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::NodeNotFound(_)));
    tx.rollback().await.unwrap();

    assert_eq!(store.count_nodes().await.unwrap(), 0);
}
