//! Lineage (clade) normalization from the global clade-assignment file
//!
//! Each row of the assignment file names a sequenced sample (`strain`) and
//! the hierarchical, slash-delimited lineage it was assigned to (`clade`).
//! The rows are folded into a [`CladeIndex`]: per lineage, the countries it
//! was seen in, its structural parent and the Danish case ids carrying it.

use crate::audit::AuditLog;
use crate::errors::LoadResult;
use crate::tables::{HeaderedReader, TAB};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// Strain-name prefix of samples sequenced by the Danish national lab
pub const DK_PREFIX: &str = "hCoV-19/DK/ALAB-";

const STRAIN_COLUMN: &str = "strain";
const CLADE_COLUMN: &str = "clade";

/// Local lab sub-codes whose ids are normalized to `<code>-<number>`
const LAB_CODES: [&str; 2] = ["SSI", "HH"];

/// Country (or source) a sample was collected in, from its strain name
pub fn country_of(strain: &str) -> String {
    let token = strain.split('/').next().unwrap_or_default();
    match token {
        "Wuhan" => "China".to_string(),
        "hCoV-19" => "Denmark".to_string(),
        other => other.to_string(),
    }
}

/// Case id of a Danish sample, `None` for anything sequenced elsewhere
pub fn case_id_of(strain: &str) -> Option<String> {
    let local = strain.strip_prefix(DK_PREFIX)?;
    // only a trailing year segment is dropped
    let local = local.strip_suffix("/2020").unwrap_or(local);

    for code in LAB_CODES {
        if let Some(rest) = local.strip_prefix(code) {
            if !rest.starts_with('-') {
                return Some(format!("{}-{}", code, rest));
            }
        }
    }
    Some(local.to_string())
}

/// Parent lineage implied by the slash-delimited label, `None` for a root
pub fn parent_of(clade: &str) -> Option<String> {
    clade.rsplit_once('/').map(|(parent, _)| parent.to_string())
}

/// Everything observed about one lineage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CladeDetails {
    pub parent: Option<String>,
    pub countries: BTreeSet<String>,
    pub cases: BTreeSet<String>,
}

/// Lineages keyed by label, in label order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CladeIndex {
    clades: BTreeMap<String, CladeDetails>,
}

impl CladeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one assignment row into the index.
    ///
    /// Countries and case ids are unioned; the parent is replaced by any
    /// non-empty one seen later.
    pub fn observe(&mut self, strain: &str, clade: &str) {
        let details = self.clades.entry(clade.to_string()).or_default();
        details.countries.insert(country_of(strain));
        if let Some(parent) = parent_of(clade) {
            details.parent = Some(parent);
        }
        if let Some(case_id) = case_id_of(strain) {
            details.cases.insert(case_id);
        }
    }

    pub fn get(&self, clade: &str) -> Option<&CladeDetails> {
        self.clades.get(clade)
    }

    pub fn contains(&self, clade: &str) -> bool {
        self.clades.contains_key(clade)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CladeDetails)> {
        self.clades.iter()
    }

    pub fn len(&self) -> usize {
        self.clades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clades.is_empty()
    }
}

/// Parse the tab-delimited clade-assignment file into a [`CladeIndex`]
pub fn read_clade_assignments(path: &Path, audit: &mut AuditLog) -> LoadResult<CladeIndex> {
    let mut reader = HeaderedReader::open(path, TAB)?;
    let mut index = CladeIndex::new();
    let mut rows = 0u64;

    while let Some(next) = reader.next_row() {
        rows += 1;
        let row = match next {
            Ok(row) => row,
            Err((number, e)) => {
                audit.error(Some(number), "FATAL", format!("Could not read row: {}", e))?;
                continue;
            }
        };

        for column in [STRAIN_COLUMN, CLADE_COLUMN] {
            if !row.has(column) {
                audit.error(
                    Some(row.number()),
                    "FATAL",
                    format!("Could not find {} field in row {}", column, row.number()),
                )?;
            }
        }
        if !row.has(STRAIN_COLUMN) || !row.has(CLADE_COLUMN) {
            continue;
        }

        let clade = row.get(CLADE_COLUMN).trim();
        if clade.is_empty() {
            audit.warning(
                Some(row.number()),
                "Missing clade",
                format!("Strain {} has no clade assignment", row.get(STRAIN_COLUMN)),
            )?;
            continue;
        }

        index.observe(row.get(STRAIN_COLUMN), clade);
    }

    debug!("Clade index holds {} lineages", index.len());
    info!("Parsed clade assignments from {}", path.display());
    audit.info(format!(
        "Finished parsing {} rows from {} resulting in {} clades",
        rows,
        path.display(),
        index.len()
    ))?;

    Ok(index)
}
