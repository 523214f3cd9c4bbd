//! Core data types for CovGraph

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// System identifier of a node created during a load run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Every label a node in the case graph can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    Person,
    Sex,
    AgeGroup,
    Parish,
    Municipality,
    Country,
    Nuts3Region,
    RiskFactor,
    PostCode,
    NursingHome,
    Branche,
    Strain,
}

impl NodeKind {
    pub const ALL: [NodeKind; 12] = [
        NodeKind::Person,
        NodeKind::Sex,
        NodeKind::AgeGroup,
        NodeKind::Parish,
        NodeKind::Municipality,
        NodeKind::Country,
        NodeKind::Nuts3Region,
        NodeKind::RiskFactor,
        NodeKind::PostCode,
        NodeKind::NursingHome,
        NodeKind::Branche,
        NodeKind::Strain,
    ];

    /// Label written to the graph store
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Person => "Person",
            NodeKind::Sex => "Sex",
            NodeKind::AgeGroup => "AgeGroup",
            NodeKind::Parish => "Parish",
            NodeKind::Municipality => "Municipality",
            NodeKind::Country => "Country",
            NodeKind::Nuts3Region => "NUTS3Region",
            NodeKind::RiskFactor => "RiskFactor",
            NodeKind::PostCode => "PostCode",
            NodeKind::NursingHome => "NursingHome",
            NodeKind::Branche => "Branche",
            NodeKind::Strain => "Strain",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Every relationship type in the case graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Person -> Sex
    IsA,
    /// Person -> AgeGroup
    InGroup,
    /// Person -> PostCode / Parish
    LivesIn,
    /// Parish -> Municipality -> NUTS3Region -> Country
    PartOf,
    /// Person -> RiskFactor
    HasRisk,
    /// Person -> Country
    PlaceOfInfection,
    /// Person -> NursingHome
    ResidentOf,
    /// Person -> Branche
    OccupationBranche,
    /// Person -> Strain
    HasStrain,
    /// Strain -> Country
    IdentifiedIn,
    /// Strain -> parent Strain
    EvolvedFrom,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 11] = [
        EdgeKind::IsA,
        EdgeKind::InGroup,
        EdgeKind::LivesIn,
        EdgeKind::PartOf,
        EdgeKind::HasRisk,
        EdgeKind::PlaceOfInfection,
        EdgeKind::ResidentOf,
        EdgeKind::OccupationBranche,
        EdgeKind::HasStrain,
        EdgeKind::IdentifiedIn,
        EdgeKind::EvolvedFrom,
    ];

    /// Relationship type written to the graph store
    pub fn rel_type(&self) -> &'static str {
        match self {
            EdgeKind::IsA => "IS_A",
            EdgeKind::InGroup => "IN_GROUP",
            EdgeKind::LivesIn => "LIVES_IN",
            EdgeKind::PartOf => "PART_OF",
            EdgeKind::HasRisk => "HAS_RISK",
            EdgeKind::PlaceOfInfection => "PLACE_OF_INFECTION",
            EdgeKind::ResidentOf => "RESIDENT_OF",
            EdgeKind::OccupationBranche => "OCCUPATION_BRANCHE",
            EdgeKind::HasStrain => "HAS_STRAIN",
            EdgeKind::IdentifiedIn => "IDENTIFIED_IN",
            EdgeKind::EvolvedFrom => "EVOLVED_FROM",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.rel_type())
    }
}

/// Represents a node in the case graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Label of the node
    pub kind: NodeKind,
    /// Key-value properties describing the node
    pub props: serde_json::Value,
}

impl Node {
    /// Create a new node of the given kind with no properties
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            props: serde_json::Value::Object(Default::default()),
        }
    }

    /// Add a single property to this node
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        if let serde_json::Value::Object(ref mut map) = self.props {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Read a property back
    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.props.get(key)
    }

    /// Read a string property back
    pub fn str_property(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(|v| v.as_str())
    }
}

/// A directed, attribute-free relationship between two existing nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(from: NodeId, kind: EdgeKind, to: NodeId) -> Self {
        Self { from, to, kind }
    }
}
