//! Core traits defining the graph store seam

use crate::errors::GraphError;
use crate::types::{Edge, Node, NodeId};
use async_trait::async_trait;

/// Core trait for graph storage backends
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Delete every node and relationship in the store
    async fn clear(&self) -> Result<(), GraphError>;

    /// Open the write transaction a load run works in
    async fn begin(&self) -> Result<Box<dyn GraphTransaction>, GraphError>;

    /// Test the connection to the storage backend
    async fn health_check(&self) -> Result<(), GraphError>;
}

/// A single all-or-nothing unit of writes.
///
/// Nothing created through a transaction is visible to readers of the store
/// until [`GraphTransaction::commit`] returns.
#[async_trait]
pub trait GraphTransaction: Send {
    /// Create a node and return its system id
    async fn create_node(&mut self, node: Node) -> Result<NodeId, GraphError>;

    /// Create a relationship between two nodes already created in this transaction
    async fn create_edge(&mut self, edge: Edge) -> Result<(), GraphError>;

    /// Make every write of this transaction durable
    async fn commit(self: Box<Self>) -> Result<(), GraphError>;

    /// Discard every write of this transaction
    async fn rollback(self: Box<Self>) -> Result<(), GraphError>;
}
