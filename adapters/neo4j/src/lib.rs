//! Neo4j adapter for the CovGraph GraphStore trait

use async_trait::async_trait;
use covgraph_core::prelude::*;
use neo4rs::{BoltType, ConfigBuilder, Graph, Query, Txn};
use std::collections::HashMap;
use tracing::{debug, info, warn};

mod config;
mod queries;
mod utils;

pub use config::{Neo4jConfig, DEFAULT_BOLT_PORT};

/// Neo4j implementation of GraphStore
pub struct Neo4jStore {
    graph: Graph,
    config: Neo4jConfig,
}

impl Neo4jStore {
    /// Connect, verify the server answers and make sure the indices exist
    pub async fn new(config: Neo4jConfig) -> Result<Self, GraphError> {
        info!("Connecting to Neo4j at {}", config.uri);

        let mut builder = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size);
        if let Some(database) = &config.database {
            builder = builder.db(database.as_str());
        }
        let neo4j_config = builder
            .build()
            .map_err(|e| GraphError::ConnectionFailed(format!("Invalid Neo4j config: {}", e)))?;

        // the pool is lazy, so the health check is the first real handshake
        let graph = Graph::connect(neo4j_config)
            .await
            .map_err(|e| GraphError::ConnectionFailed(format!("Neo4j connection failed: {}", e)))?;

        let store = Self { graph, config };
        store.health_check().await?;
        store.create_indices().await?;

        Ok(store)
    }

    pub fn config(&self) -> &Neo4jConfig {
        &self.config
    }

    /// Create the per-label system id indices edges are matched through
    async fn create_indices(&self) -> Result<(), GraphError> {
        for kind in NodeKind::ALL {
            let index_query = queries::create_index(kind)?;
            debug!("Creating index: {}", index_query);
            self.graph
                .run(Query::new(index_query))
                .await
                .map_err(|e| GraphError::DatabaseError(format!("Failed to create index: {}", e)))?;
        }

        info!("Neo4j indices created successfully");
        Ok(())
    }

    /// Number of nodes currently stored
    pub async fn count_nodes(&self) -> Result<i64, GraphError> {
        let mut result = self
            .graph
            .execute(Query::new(queries::COUNT_NODES.to_string()))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("Failed to count nodes: {}", e)))?;

        match result
            .next()
            .await
            .map_err(|e| GraphError::QueryFailed(format!("Failed to get result: {}", e)))?
        {
            Some(row) => row
                .get::<i64>("node_count")
                .map_err(|e| GraphError::QueryFailed(format!("Missing node_count in result: {}", e))),
            None => Err(GraphError::QueryFailed("No result returned from count".to_string())),
        }
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn clear(&self) -> Result<(), GraphError> {
        warn!("Deleting all nodes and relationships in {}", self.config.uri);
        self.graph
            .run(Query::new(queries::DELETE_ALL.to_string()))
            .await
            .map_err(|e| GraphError::QueryFailed(format!("Failed to clear graph: {}", e)))?;
        info!("Cleared Neo4j graph");
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn GraphTransaction>, GraphError> {
        let txn = self
            .graph
            .start_txn()
            .await
            .map_err(|e| GraphError::TransactionFailed(format!("Failed to start transaction: {}", e)))?;
        debug!("Started Neo4j transaction");

        Ok(Box::new(Neo4jTransaction {
            txn,
            kinds: HashMap::new(),
            edges_created: 0,
        }))
    }

    async fn health_check(&self) -> Result<(), GraphError> {
        self.graph
            .run(Query::new(queries::PING.to_string()))
            .await
            .map_err(|e| GraphError::ConnectionFailed(format!("Neo4j is not responding: {}", e)))?;
        debug!("Neo4j health check passed");
        Ok(())
    }
}

/// One Bolt transaction spanning a whole load run
pub struct Neo4jTransaction {
    txn: Txn,
    /// Kind of every node created in this transaction, for labelled edge matches
    kinds: HashMap<NodeId, NodeKind>,
    edges_created: usize,
}

#[async_trait]
impl GraphTransaction for Neo4jTransaction {
    async fn create_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        let id = NodeId::new();
        let props = utils::props_to_bolt(&node.props)?;
        let query = Query::new(queries::create_node(node.kind)?)
            .param("system_id", id.to_string())
            .param("props", BoltType::Map(props));

        self.txn
            .run(query)
            .await
            .map_err(|e| GraphError::QueryFailed(format!("Failed to create {} node: {}", node.kind, e)))?;

        self.kinds.insert(id, node.kind);
        Ok(id)
    }

    async fn create_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        let kind_of = |id: NodeId| {
            self.kinds
                .get(&id)
                .copied()
                .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
        };
        let (from_kind, to_kind) = (kind_of(edge.from)?, kind_of(edge.to)?);

        let query = Query::new(queries::create_edge(from_kind, edge.kind, to_kind)?)
            .param("from_id", edge.from.to_string())
            .param("to_id", edge.to.to_string());

        self.txn
            .run(query)
            .await
            .map_err(|e| GraphError::QueryFailed(format!("Failed to create {} edge: {}", edge.kind, e)))?;

        self.edges_created += 1;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), GraphError> {
        let (nodes, edges) = (self.kinds.len(), self.edges_created);
        self.txn
            .commit()
            .await
            .map_err(|e| GraphError::TransactionFailed(format!("Commit failed: {}", e)))?;
        info!("Committed Neo4j transaction: {} nodes, {} edges", nodes, edges);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), GraphError> {
        self.txn
            .rollback()
            .await
            .map_err(|e| GraphError::TransactionFailed(format!("Rollback failed: {}", e)))?;
        info!("Rolled back Neo4j transaction");
        Ok(())
    }
}
