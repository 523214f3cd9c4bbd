//! Business-code to node lookup used to deduplicate dimension nodes

use crate::errors::GraphError;
use crate::traits::GraphTransaction;
use crate::types::{Node, NodeId, NodeKind};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::trace;

/// Maps the natural key of one node kind to the node created for it.
///
/// A registry is populated eagerly for the static reference tables and lazily
/// for codes first met in the case file. It is single-writer: the load run
/// owns every registry mutably for its whole duration.
#[derive(Debug, Clone)]
pub struct CodeRegistry<K = String> {
    kind: NodeKind,
    entries: HashMap<K, NodeId>,
}

impl<K: Eq + Hash> CodeRegistry<K> {
    /// Create an empty registry for the given node kind
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    /// Node kind every entry of this registry points at
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn get<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).copied()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Register a node under `key`, returning the node it replaced (last write wins)
    pub fn insert(&mut self, key: K, id: NodeId) -> Option<NodeId> {
        self.entries.insert(key, id)
    }

    /// Return the node registered for `key`, creating it through `tx` on first sight.
    ///
    /// `factory` runs only when the key is new. The flag is `true` when a node
    /// was created by this call.
    pub async fn get_or_create<F>(
        &mut self,
        tx: &mut dyn GraphTransaction,
        key: K,
        factory: F,
    ) -> Result<(NodeId, bool), GraphError>
    where
        F: FnOnce() -> Node,
    {
        if let Some(&id) = self.entries.get(&key) {
            return Ok((id, false));
        }

        let node = factory();
        debug_assert_eq!(node.kind, self.kind);
        let id = tx.create_node(node).await?;
        trace!("Registered new {} node {}", self.kind, id);
        self.entries.insert(key, id);
        Ok((id, true))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &NodeId)> {
        self.entries.iter()
    }
}
