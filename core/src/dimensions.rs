//! Reference dimensions and the lineage graph
//!
//! The static reference tables are read before the store is touched, so a
//! missing table stops the run while the previous graph is still intact.

use crate::errors::{CoreResult, LoadResult};
use crate::lineage::CladeIndex;
use crate::registry::CodeRegistry;
use crate::session::LoadSession;
use crate::tables::read_reference_table;
use crate::types::{EdgeKind, Node, NodeId, NodeKind};
use csv::StringRecord;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const AGE_GROUPS_FILE: &str = "age_groups.tsv";
pub const PARISHES_FILE: &str = "parish_ses.tsv";
pub const MUNICIPALITIES_FILE: &str = "municipalities.tsv";
pub const NUTS3_REGIONS_FILE: &str = "nuts3_regions.tsv";
pub const RISK_FACTORS_FILE: &str = "risk_factors.tsv";

pub const HOME_COUNTRY: &str = "Denmark";
pub const HOME_COUNTRY_NUTS: &str = "DK0";

/// Contents of the static reference tables
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    /// No header; column 0 is the group label
    pub age_groups: Vec<StringRecord>,
    /// code, name, population, ghetto_area
    pub parishes: Vec<StringRecord>,
    /// code, name, _, _, population
    pub municipalities: Vec<StringRecord>,
    /// code, name
    pub nuts3_regions: Vec<StringRecord>,
    /// code (a case-file column), name
    pub risk_factors: Vec<StringRecord>,
}

impl ReferenceTables {
    /// Read every table from `dir`
    pub fn load(dir: &Path) -> LoadResult<Self> {
        let tables = Self {
            age_groups: read_reference_table(&dir.join(AGE_GROUPS_FILE), false)?,
            parishes: read_reference_table(&dir.join(PARISHES_FILE), true)?,
            municipalities: read_reference_table(&dir.join(MUNICIPALITIES_FILE), true)?,
            nuts3_regions: read_reference_table(&dir.join(NUTS3_REGIONS_FILE), true)?,
            risk_factors: read_reference_table(&dir.join(RISK_FACTORS_FILE), true)?,
        };
        info!(
            "Loaded reference tables from {}: {} age groups, {} parishes, {} municipalities, {} regions, {} risk factors",
            dir.display(),
            tables.age_groups.len(),
            tables.parishes.len(),
            tables.municipalities.len(),
            tables.nuts3_regions.len(),
            tables.risk_factors.len()
        );
        Ok(tables)
    }

    /// Paths of every table, for up-front existence checks
    pub fn files(dir: &Path) -> Vec<PathBuf> {
        [
            AGE_GROUPS_FILE,
            PARISHES_FILE,
            MUNICIPALITIES_FILE,
            NUTS3_REGIONS_FILE,
            RISK_FACTORS_FILE,
        ]
        .iter()
        .map(|f| dir.join(f))
        .collect()
    }
}

/// Every dimension node created so far, by business code
#[derive(Debug, Clone)]
pub struct Dimensions {
    pub sex_male: NodeId,
    pub sex_female: NodeId,
    pub age_groups: CodeRegistry,
    pub parishes: CodeRegistry,
    pub municipalities: CodeRegistry,
    pub nuts3_regions: CodeRegistry,
    pub countries: CodeRegistry,
    pub risk_factors: CodeRegistry,
    /// Risk-factor codes in table order
    pub risk_factor_codes: Vec<String>,
    pub strains: CodeRegistry,
    pub post_codes: CodeRegistry,
    pub nursing_homes: CodeRegistry,
    pub branches: CodeRegistry,
}

impl Dimensions {
    /// Node for a sex code, `None` for anything but `M` and `F`
    pub fn sex(&self, code: &str) -> Option<NodeId> {
        match code {
            "M" => Some(self.sex_male),
            "F" => Some(self.sex_female),
            _ => None,
        }
    }
}

/// Create all reference nodes, then the lineage graph
pub async fn create_dimensions(
    session: &mut LoadSession<'_>,
    tables: &ReferenceTables,
    clades: &CladeIndex,
) -> CoreResult<Dimensions> {
    let sex_male = session
        .create_node(Node::new(NodeKind::Sex).with_property("name", "M"))
        .await?;
    let sex_female = session
        .create_node(Node::new(NodeKind::Sex).with_property("name", "F"))
        .await?;

    let mut age_groups = CodeRegistry::new(NodeKind::AgeGroup);
    for (idx, record) in tables.age_groups.iter().enumerate() {
        let Some(label) = code_of(session, AGE_GROUPS_FILE, idx, record)? else {
            continue;
        };
        let id = session
            .create_node(Node::new(NodeKind::AgeGroup).with_property("name", label))
            .await?;
        age_groups.insert(label.to_string(), id);
    }

    let mut parishes = CodeRegistry::new(NodeKind::Parish);
    for (idx, record) in tables.parishes.iter().enumerate() {
        let Some(code) = code_of(session, PARISHES_FILE, idx, record)? else {
            continue;
        };
        let population = population_of(session, PARISHES_FILE, idx, record, 2)?;
        let node = Node::new(NodeKind::Parish)
            .with_property("code", code)
            .with_property("name", record.get(1).unwrap_or_default())
            .with_property("population", population)
            .with_property("ghetto_area", record.get(3).unwrap_or_default());
        let id = session.create_node(node).await?;
        parishes.insert(code.to_string(), id);
    }

    let mut municipalities = CodeRegistry::new(NodeKind::Municipality);
    for (idx, record) in tables.municipalities.iter().enumerate() {
        let Some(code) = code_of(session, MUNICIPALITIES_FILE, idx, record)? else {
            continue;
        };
        let population = population_of(session, MUNICIPALITIES_FILE, idx, record, 4)?;
        let node = Node::new(NodeKind::Municipality)
            .with_property("code", code)
            .with_property("name", record.get(1).unwrap_or_default())
            .with_property("population", population);
        let id = session.create_node(node).await?;
        municipalities.insert(code.to_string(), id);
    }

    let mut countries = CodeRegistry::new(NodeKind::Country);
    let home = session
        .create_node(
            Node::new(NodeKind::Country)
                .with_property("name", HOME_COUNTRY)
                .with_property("nuts_code", HOME_COUNTRY_NUTS),
        )
        .await?;
    countries.insert(HOME_COUNTRY.to_string(), home);

    let mut nuts3_regions = CodeRegistry::new(NodeKind::Nuts3Region);
    for (idx, record) in tables.nuts3_regions.iter().enumerate() {
        let Some(code) = code_of(session, NUTS3_REGIONS_FILE, idx, record)? else {
            continue;
        };
        let node = Node::new(NodeKind::Nuts3Region)
            .with_property("code", code)
            .with_property("name", record.get(1).unwrap_or_default());
        let id = session.create_node(node).await?;
        nuts3_regions.insert(code.to_string(), id);
        session.link(id, EdgeKind::PartOf, home).await?;
    }

    let mut risk_factors = CodeRegistry::new(NodeKind::RiskFactor);
    let mut risk_factor_codes = Vec::new();
    for (idx, record) in tables.risk_factors.iter().enumerate() {
        let Some(code) = code_of(session, RISK_FACTORS_FILE, idx, record)? else {
            continue;
        };
        let node = Node::new(NodeKind::RiskFactor)
            .with_property("code", code)
            .with_property("name", record.get(1).unwrap_or_default());
        let id = session.create_node(node).await?;
        if risk_factors.insert(code.to_string(), id).is_none() {
            risk_factor_codes.push(code.to_string());
        }
    }

    debug!(
        "Created reference dimensions: {} age groups, {} parishes, {} municipalities, {} regions, {} risk factors",
        age_groups.len(),
        parishes.len(),
        municipalities.len(),
        nuts3_regions.len(),
        risk_factors.len()
    );

    let strains = create_lineage_graph(session, clades, &mut countries).await?;

    info!("Created dimensions");
    Ok(Dimensions {
        sex_male,
        sex_female,
        age_groups,
        parishes,
        municipalities,
        nuts3_regions,
        countries,
        risk_factors,
        risk_factor_codes,
        strains,
        post_codes: CodeRegistry::new(NodeKind::PostCode),
        nursing_homes: CodeRegistry::new(NodeKind::NursingHome),
        branches: CodeRegistry::new(NodeKind::Branche),
    })
}

/// Create one Strain node per lineage, then its country and parent edges.
///
/// Every lineage exists before any `EVOLVED_FROM` edge is drawn, since a
/// parent may sort after its child.
pub async fn create_lineage_graph(
    session: &mut LoadSession<'_>,
    clades: &CladeIndex,
    countries: &mut CodeRegistry,
) -> CoreResult<CodeRegistry> {
    let mut strains = CodeRegistry::new(NodeKind::Strain);
    for (clade, _) in clades.iter() {
        let id = session
            .create_node(Node::new(NodeKind::Strain).with_property("name", clade.as_str()))
            .await?;
        strains.insert(clade.clone(), id);
    }

    for (clade, details) in clades.iter() {
        let Some(strain) = strains.get(clade.as_str()) else {
            continue;
        };

        for country in details.countries.iter().filter(|c| !c.is_empty()) {
            let country_id = session
                .get_or_create(countries, country, || {
                    Node::new(NodeKind::Country).with_property("name", country.as_str())
                })
                .await?;
            session.link(strain, EdgeKind::IdentifiedIn, country_id).await?;
        }

        if let Some(parent) = &details.parent {
            match strains.get(parent.as_str()) {
                Some(parent_id) => session.link(strain, EdgeKind::EvolvedFrom, parent_id).await?,
                None => {
                    session.audit().warning(
                        None,
                        "Missing parent clade",
                        format!("Parent clade {} of {} was never assigned to a sample", parent, clade),
                    )?;
                }
            }
        }
    }

    debug!("Created {} strain nodes", strains.len());
    Ok(strains)
}

/// First column of a reference record, logging records that lack one
fn code_of<'r>(
    session: &mut LoadSession<'_>,
    file: &str,
    idx: usize,
    record: &'r StringRecord,
) -> CoreResult<Option<&'r str>> {
    match record.get(0).map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => Ok(Some(code)),
        None => {
            session
                .audit()
                .field_error(file, Some(idx as u64 + 1), "row has no code")?;
            Ok(None)
        }
    }
}

/// Integer population in `column`, null (and logged) when absent or malformed
fn population_of(
    session: &mut LoadSession<'_>,
    file: &str,
    idx: usize,
    record: &StringRecord,
    column: usize,
) -> CoreResult<Value> {
    let raw = record.get(column).unwrap_or_default().trim();
    match raw.parse::<i64>() {
        Ok(population) => Ok(Value::from(population)),
        Err(e) => {
            session.audit().field_error(
                &format!("{} population", file),
                Some(idx as u64 + 1),
                &format!("'{}': {}", raw, e),
            )?;
            Ok(Value::Null)
        }
    }
}
