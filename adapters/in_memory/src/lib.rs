//! In-memory implementation of GraphStore for testing and dry runs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use covgraph_core::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Configuration for in-memory store
#[derive(Debug, Clone)]
pub struct InMemoryConfig {
    /// Maximum number of nodes to store
    pub max_nodes: Option<usize>,
    /// Maximum number of edges to store
    pub max_edges: Option<usize>,
    /// Whether to enable verbose logging
    pub verbose: bool,
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            max_nodes: Some(1_000_000),
            max_edges: Some(5_000_000),
            verbose: false,
        }
    }
}

/// Node and edge counts of the committed graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
}

/// Internal storage for a node
#[derive(Debug, Clone)]
struct StoredNode {
    node: Node,
    committed_at: DateTime<Utc>,
}

/// Committed graph contents
#[derive(Debug, Default)]
struct MemoryGraph {
    /// Nodes indexed by system ID
    nodes: HashMap<NodeId, StoredNode>,
    /// Edges in commit order
    edges: Vec<Edge>,
    /// Index: kind -> node_ids
    nodes_by_kind: HashMap<NodeKind, Vec<NodeId>>,
    /// Index: from_node_id -> positions in `edges`
    edges_from_node: HashMap<NodeId, Vec<usize>>,
}

impl MemoryGraph {
    fn insert_node(&mut self, id: NodeId, node: Node, committed_at: DateTime<Utc>) {
        self.nodes_by_kind.entry(node.kind).or_default().push(id);
        self.nodes.insert(id, StoredNode { node, committed_at });
    }

    fn insert_edge(&mut self, edge: Edge) {
        self.edges_from_node
            .entry(edge.from)
            .or_default()
            .push(self.edges.len());
        self.edges.push(edge);
    }

    fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
        }
    }
}

/// In-memory GraphStore implementation
pub struct InMemoryStore {
    store: Arc<RwLock<MemoryGraph>>,
    config: InMemoryConfig,
}

impl InMemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::new_with_config(InMemoryConfig::default())
    }

    /// Create a new in-memory store with configuration
    pub fn new_with_config(config: InMemoryConfig) -> Self {
        info!("Creating in-memory store with config: {:?}", config);
        Self {
            store: Arc::new(RwLock::new(MemoryGraph::default())),
            config,
        }
    }

    /// Get statistics about the store
    pub async fn stats(&self) -> GraphStats {
        self.store.read().await.stats()
    }

    pub async fn node(&self, id: NodeId) -> Option<Node> {
        let store = self.store.read().await;
        store.nodes.get(&id).map(|stored| stored.node.clone())
    }

    /// Commit time of a node, `None` if it is not in the committed graph
    pub async fn committed_at(&self, id: NodeId) -> Option<DateTime<Utc>> {
        let store = self.store.read().await;
        store.nodes.get(&id).map(|stored| stored.committed_at)
    }

    pub async fn nodes_of(&self, kind: NodeKind) -> Vec<(NodeId, Node)> {
        let store = self.store.read().await;
        store
            .nodes_by_kind
            .get(&kind)
            .into_iter()
            .flatten()
            .filter_map(|id| store.nodes.get(id).map(|s| (*id, s.node.clone())))
            .collect()
    }

    /// First node of `kind` whose string property `key` equals `value`
    pub async fn find_node(&self, kind: NodeKind, key: &str, value: &str) -> Option<(NodeId, Node)> {
        self.nodes_of(kind)
            .await
            .into_iter()
            .find(|(_, node)| node.str_property(key) == Some(value))
    }

    pub async fn edges_of(&self, kind: EdgeKind) -> Vec<Edge> {
        let store = self.store.read().await;
        store.edges.iter().filter(|e| e.kind == kind).copied().collect()
    }

    pub async fn edges_from(&self, from: NodeId, kind: EdgeKind) -> Vec<Edge> {
        let store = self.store.read().await;
        store
            .edges_from_node
            .get(&from)
            .into_iter()
            .flatten()
            .map(|&idx| store.edges[idx])
            .filter(|e| e.kind == kind)
            .collect()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for InMemoryStore {
    async fn clear(&self) -> Result<(), GraphError> {
        let mut store = self.store.write().await;
        *store = MemoryGraph::default();
        info!("Cleared in-memory store");
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn GraphTransaction>, GraphError> {
        if self.config.verbose {
            debug!("Beginning in-memory transaction");
        }
        Ok(Box::new(InMemoryTransaction {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            nodes: Vec::new(),
            edges: Vec::new(),
            staged_ids: HashSet::new(),
        }))
    }

    async fn health_check(&self) -> Result<(), GraphError> {
        let stats = self.stats().await;
        debug!(
            "In-memory store health check: {} nodes, {} edges",
            stats.nodes, stats.edges
        );
        Ok(())
    }
}

/// Writes staged in memory until commit, then applied under one write lock
pub struct InMemoryTransaction {
    store: Arc<RwLock<MemoryGraph>>,
    config: InMemoryConfig,
    nodes: Vec<(NodeId, Node)>,
    edges: Vec<Edge>,
    staged_ids: HashSet<NodeId>,
}

impl InMemoryTransaction {
    async fn node_exists(&self, id: NodeId) -> bool {
        self.staged_ids.contains(&id) || self.store.read().await.nodes.contains_key(&id)
    }
}

#[async_trait]
impl GraphTransaction for InMemoryTransaction {
    async fn create_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if let Some(max_nodes) = self.config.max_nodes {
            let committed = self.store.read().await.nodes.len();
            if committed + self.nodes.len() >= max_nodes {
                return Err(GraphError::ConstraintViolation(format!(
                    "Maximum node limit ({}) reached",
                    max_nodes
                )));
            }
        }

        let id = NodeId::new();
        if self.config.verbose {
            debug!("Staging {} node {}", node.kind, id);
        }
        self.staged_ids.insert(id);
        self.nodes.push((id, node));
        Ok(id)
    }

    async fn create_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if let Some(max_edges) = self.config.max_edges {
            let committed = self.store.read().await.edges.len();
            if committed + self.edges.len() >= max_edges {
                return Err(GraphError::ConstraintViolation(format!(
                    "Maximum edge limit ({}) reached",
                    max_edges
                )));
            }
        }

        for end in [edge.from, edge.to] {
            if !self.node_exists(end).await {
                return Err(GraphError::NodeNotFound(end.to_string()));
            }
        }

        if self.config.verbose {
            debug!("Staging {} -[{}]-> {}", edge.from, edge.kind, edge.to);
        }
        self.edges.push(edge);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), GraphError> {
        let this = *self;
        let committed_at = Utc::now();
        let (node_count, edge_count) = (this.nodes.len(), this.edges.len());

        let mut store = this.store.write().await;
        for (id, node) in this.nodes {
            store.insert_node(id, node, committed_at);
        }
        for edge in this.edges {
            store.insert_edge(edge);
        }

        info!(
            "Committed in-memory transaction: {} nodes, {} edges",
            node_count, edge_count
        );
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), GraphError> {
        info!(
            "Rolled back in-memory transaction: {} nodes, {} edges discarded",
            self.nodes.len(),
            self.edges.len()
        );
        Ok(())
    }
}
