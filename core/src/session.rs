//! The write session shared by all load stages, and the code-to-node resolver

use crate::audit::AuditLog;
use crate::errors::CoreResult;
use crate::registry::CodeRegistry;
use crate::tables::Row;
use crate::traits::GraphTransaction;
use crate::types::{Edge, EdgeKind, Node, NodeId, NodeKind};
use std::collections::BTreeMap;
use tracing::trace;

/// Counts of everything written through a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteTally {
    pub nodes: BTreeMap<NodeKind, usize>,
    pub edges: BTreeMap<EdgeKind, usize>,
}

impl WriteTally {
    pub fn nodes_of(&self, kind: NodeKind) -> usize {
        self.nodes.get(&kind).copied().unwrap_or(0)
    }

    pub fn edges_of(&self, kind: EdgeKind) -> usize {
        self.edges.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_nodes(&self) -> usize {
        self.nodes.values().sum()
    }

    pub fn total_edges(&self) -> usize {
        self.edges.values().sum()
    }
}

/// How one dimension column of an input row maps onto the graph
#[derive(Debug, Clone, Copy)]
pub struct DimensionLink {
    /// Column holding the business code
    pub code_field: &'static str,
    /// Optional column holding a human-readable name for new nodes
    pub name_field: Option<&'static str>,
    /// Relationship drawn from the source node to the dimension node
    pub edge: EdgeKind,
}

impl DimensionLink {
    pub const fn new(code_field: &'static str, edge: EdgeKind) -> Self {
        Self {
            code_field,
            name_field: None,
            edge,
        }
    }

    pub const fn named(code_field: &'static str, name_field: &'static str, edge: EdgeKind) -> Self {
        Self {
            code_field,
            name_field: Some(name_field),
            edge,
        }
    }
}

/// An open load transaction together with the audit log and write counters
pub struct LoadSession<'a> {
    tx: &'a mut dyn GraphTransaction,
    audit: &'a mut AuditLog,
    tally: WriteTally,
}

impl<'a> LoadSession<'a> {
    pub fn new(tx: &'a mut dyn GraphTransaction, audit: &'a mut AuditLog) -> Self {
        Self {
            tx,
            audit,
            tally: WriteTally::default(),
        }
    }

    pub fn audit(&mut self) -> &mut AuditLog {
        self.audit
    }

    pub fn tally(&self) -> &WriteTally {
        &self.tally
    }

    pub fn into_tally(self) -> WriteTally {
        self.tally
    }

    pub async fn create_node(&mut self, node: Node) -> CoreResult<NodeId> {
        let kind = node.kind;
        let id = self.tx.create_node(node).await?;
        *self.tally.nodes.entry(kind).or_default() += 1;
        Ok(id)
    }

    pub async fn link(&mut self, from: NodeId, kind: EdgeKind, to: NodeId) -> CoreResult<()> {
        self.tx.create_edge(Edge::new(from, kind, to)).await?;
        *self.tally.edges.entry(kind).or_default() += 1;
        Ok(())
    }

    /// Create the node for `key` unless `registry` already knows it
    pub async fn get_or_create(
        &mut self,
        registry: &mut CodeRegistry,
        key: &str,
        factory: impl FnOnce() -> Node,
    ) -> CoreResult<NodeId> {
        let (id, created) = registry
            .get_or_create(&mut *self.tx, key.to_string(), factory)
            .await?;
        if created {
            *self.tally.nodes.entry(registry.kind()).or_default() += 1;
        }
        Ok(id)
    }

    /// Resolve the dimension code held in `row` and link `source` to it.
    ///
    /// An empty code resolves to nothing and is not an error. A known code
    /// reuses its node, an unknown one creates and registers it. Every call
    /// with a code draws its own edge, so rows sharing a code share the node
    /// but not the edge. Without a `source` the node is still resolved, the
    /// gap is logged and no edge is drawn.
    pub async fn resolve_and_link(
        &mut self,
        row: &Row,
        source: Option<NodeId>,
        link: DimensionLink,
        registry: &mut CodeRegistry,
    ) -> CoreResult<Option<NodeId>> {
        let code = row.get(link.code_field);
        if code.is_empty() {
            return Ok(None);
        }

        let kind = registry.kind();
        let target = self
            .get_or_create(registry, code, || match link.name_field {
                Some(name_field) => Node::new(kind)
                    .with_property("code", code)
                    .with_property("name", row.get(name_field)),
                None => Node::new(kind).with_property("name", code),
            })
            .await?;

        let Some(source) = source else {
            self.audit.error(
                Some(row.number()),
                "Relationship",
                format!(
                    "Error creating relationship {}, source node is missing (key {})",
                    link.edge, code
                ),
            )?;
            return Ok(None);
        };

        trace!("{} -[{}]-> {} ({})", source, link.edge, target, code);
        self.link(source, link.edge, target).await?;
        Ok(Some(target))
    }
}
