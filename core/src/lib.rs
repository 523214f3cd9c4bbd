//! # CovGraph Core
//!
//! Core types, traits and load stages for the CovGraph loader, which turns
//! case metadata and viral lineage assignments into a property graph.
//! Storage backends implement [`GraphStore`]; everything else in a load run
//! lives here.

pub mod audit;
pub mod dimensions;
pub mod errors;
pub mod lineage;
pub mod linker;
pub mod persons;
pub mod pipeline;
pub mod registry;
pub mod session;
pub mod tables;
pub mod traits;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export commonly used types and traits
pub use audit::{AuditCounts, AuditLog, MessageType};
pub use errors::{CoreError, GraphError, LoadError};
pub use pipeline::{load_graph, LoadSources, LoadSummary};
pub use registry::CodeRegistry;
pub use traits::{GraphStore, GraphTransaction};
pub use types::{Edge, EdgeKind, Node, NodeId, NodeKind};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::audit::*;
    pub use crate::errors::*;
    pub use crate::pipeline::*;
    pub use crate::registry::*;
    pub use crate::traits::*;
    pub use crate::types::*;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use uuid::Uuid;
}
