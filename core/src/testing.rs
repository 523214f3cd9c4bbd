//! Test doubles shared by the unit tests of this crate

use crate::errors::GraphError;
use crate::traits::GraphTransaction;
use crate::types::{Edge, EdgeKind, Node, NodeId, NodeKind};
use async_trait::async_trait;
use std::collections::HashMap;

/// Transaction that keeps every write in memory for inspection
#[derive(Debug, Default)]
pub struct RecordingTransaction {
    pub nodes: HashMap<NodeId, Node>,
    pub edges: Vec<Edge>,
}

impl RecordingTransaction {
    pub fn nodes_of(&self, kind: NodeKind) -> Vec<(NodeId, &Node)> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.kind == kind)
            .map(|(id, n)| (*id, n))
            .collect()
    }

    pub fn edges_of(&self, kind: EdgeKind) -> Vec<Edge> {
        self.edges.iter().filter(|e| e.kind == kind).copied().collect()
    }

    pub fn edges_from(&self, from: NodeId, kind: EdgeKind) -> Vec<Edge> {
        self.edges
            .iter()
            .filter(|e| e.from == from && e.kind == kind)
            .copied()
            .collect()
    }

    pub fn find(&self, kind: NodeKind, key: &str, value: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.kind == kind && n.str_property(key) == Some(value))
            .map(|(id, _)| *id)
    }
}

#[async_trait]
impl GraphTransaction for RecordingTransaction {
    async fn create_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        let id = NodeId::new();
        self.nodes.insert(id, node);
        Ok(id)
    }

    async fn create_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        for end in [edge.from, edge.to] {
            if !self.nodes.contains_key(&end) {
                return Err(GraphError::NodeNotFound(end.to_string()));
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), GraphError> {
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), GraphError> {
        Ok(())
    }
}
