//! Batch orchestration of one load run

use crate::audit::{AuditCounts, AuditLog};
use crate::dimensions::{create_dimensions, ReferenceTables};
use crate::errors::CoreResult;
use crate::lineage::{read_clade_assignments, CladeIndex};
use crate::linker::{link_strains, LinkStats};
use crate::persons::{check_case_file, load_persons, PersonLoad};
use crate::session::{LoadSession, WriteTally};
use crate::traits::{GraphStore, GraphTransaction};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Input files of a load run
#[derive(Debug, Clone)]
pub struct LoadSources {
    /// Comma-delimited case metadata
    pub case_file: PathBuf,
    /// Tab-delimited global clade assignments
    pub clade_file: PathBuf,
    /// Directory holding the static reference tables
    pub dims_dir: PathBuf,
}

/// Everything a finished run reports
#[derive(Debug, Clone)]
pub struct LoadSummary {
    pub case_rows: u64,
    pub persons: usize,
    pub clades: usize,
    pub links: LinkStats,
    pub tally: WriteTally,
    pub audit: AuditCounts,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl LoadSummary {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

struct StageOutcome {
    persons: PersonLoad,
    links: LinkStats,
    tally: WriteTally,
}

/// Replace the contents of `store` with the graph built from `sources`.
///
/// Every input is read and checked before the store is cleared, so a missing
/// file leaves the previous graph in place. All writes happen in one
/// transaction; a store failure rolls it back and is returned.
pub async fn load_graph(
    store: &dyn GraphStore,
    sources: &LoadSources,
    audit: &mut AuditLog,
) -> CoreResult<LoadSummary> {
    let started_at = Utc::now();
    audit.info(format!(
        "Started {} at {}",
        sources.case_file.display(),
        started_at.to_rfc3339()
    ))?;

    check_case_file(&sources.case_file)?;
    let tables = ReferenceTables::load(&sources.dims_dir)?;
    let clades = read_clade_assignments(&sources.clade_file, audit)?;

    info!("Clearing graph store");
    store.clear().await?;

    let mut tx = store.begin().await?;
    debug!("Opened load transaction");

    let outcome = match run_stages(&mut *tx, audit, &tables, &clades, &sources.case_file).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Load failed, rolling back: {}", e);
            if let Err(rollback) = tx.rollback().await {
                error!("Rollback failed: {}", rollback);
            }
            return Err(e);
        }
    };

    tx.commit().await?;
    info!("Committed load transaction");

    let finished_at = Utc::now();
    audit.info(format!(
        "Finished {} at {}",
        sources.case_file.display(),
        finished_at.to_rfc3339()
    ))?;

    Ok(LoadSummary {
        case_rows: outcome.persons.rows,
        persons: outcome.persons.persons.len(),
        clades: clades.len(),
        links: outcome.links,
        tally: outcome.tally,
        audit: audit.counts(),
        started_at,
        finished_at,
    })
}

async fn run_stages(
    tx: &mut dyn GraphTransaction,
    audit: &mut AuditLog,
    tables: &ReferenceTables,
    clades: &CladeIndex,
    case_file: &Path,
) -> CoreResult<StageOutcome> {
    let mut session = LoadSession::new(tx, audit);

    let mut dims = create_dimensions(&mut session, tables, clades).await?;
    let persons = load_persons(&mut session, case_file, &mut dims).await?;
    let links = link_strains(&mut session, clades, &dims.strains, &persons.persons).await?;

    Ok(StageOutcome {
        persons,
        links,
        tally: session.into_tally(),
    })
}
