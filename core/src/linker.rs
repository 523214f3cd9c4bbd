//! Attaches persons to the lineage they were sequenced with

use crate::errors::CoreResult;
use crate::lineage::CladeIndex;
use crate::registry::CodeRegistry;
use crate::session::LoadSession;
use crate::types::EdgeKind;
use tracing::info;

/// What the linker did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub linked: usize,
    pub missing_clades: usize,
    pub missing_persons: usize,
}

/// Draw a `HAS_STRAIN` edge for every case id of every lineage.
///
/// A lineage without a Strain node, or a case id without a Person, is logged
/// and skipped.
pub async fn link_strains(
    session: &mut LoadSession<'_>,
    clades: &CladeIndex,
    strains: &CodeRegistry,
    persons: &CodeRegistry,
) -> CoreResult<LinkStats> {
    let mut stats = LinkStats::default();

    for (clade, details) in clades.iter() {
        let Some(strain) = strains.get(clade.as_str()) else {
            stats.missing_clades += 1;
            session.audit().field_error(
                "Clade",
                None,
                &format!("Missing clade {} in clade dictionary", clade),
            )?;
            continue;
        };

        for case_id in &details.cases {
            match persons.get(case_id.as_str()) {
                Some(person) => {
                    session.link(person, EdgeKind::HasStrain, strain).await?;
                    stats.linked += 1;
                }
                None => {
                    stats.missing_persons += 1;
                    session.audit().field_error(
                        "Clade person",
                        None,
                        &format!("Missing person {} for clade {}", case_id, clade),
                    )?;
                }
            }
        }
    }

    info!(
        "Linked {} persons to strains ({} missing clades, {} missing persons)",
        stats.linked, stats.missing_clades, stats.missing_persons
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;
    use crate::testing::RecordingTransaction;
    use crate::traits::GraphTransaction;
    use crate::types::{Node, NodeKind};

    #[tokio::test]
    async fn test_missing_clade_and_person_are_logged() {
        let mut clades = CladeIndex::new();
        clades.observe("hCoV-19/DK/ALAB-SSI1/2020", "20A");
        clades.observe("hCoV-19/DK/ALAB-SSI2/2020", "20A");
        clades.observe("hCoV-19/DK/ALAB-SSI3/2020", "20B");

        let mut tx = RecordingTransaction::default();
        let strain = tx.create_node(Node::new(NodeKind::Strain)).await.unwrap();
        let person = tx.create_node(Node::new(NodeKind::Person)).await.unwrap();

        let mut strains = CodeRegistry::new(NodeKind::Strain);
        strains.insert("20A".to_string(), strain);
        let mut persons = CodeRegistry::new(NodeKind::Person);
        persons.insert("SSI-1".to_string(), person);

        let mut audit = AuditLog::discard();
        let mut session = LoadSession::new(&mut tx, &mut audit);
        let stats = link_strains(&mut session, &clades, &strains, &persons)
            .await
            .unwrap();
        drop(session);

        assert_eq!(
            stats,
            LinkStats {
                linked: 1,
                missing_clades: 1,
                missing_persons: 1
            }
        );
        assert_eq!(tx.edges_of(EdgeKind::HasStrain).len(), 1);
        assert_eq!(audit.counts().errors, 2);
    }
}
