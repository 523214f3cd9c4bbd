//! Output formatting for the load summary

use crate::cli::OutputFormat;
use colored::*;
use covgraph_core::errors::CoreError;
use covgraph_core::pipeline::LoadSummary;
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Element")]
    element: &'static str,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Count")]
    count: usize,
}

/// Machine-readable form of a [`LoadSummary`]
#[derive(Debug, Serialize)]
struct SummaryReport {
    case_rows: u64,
    persons: usize,
    clades: usize,
    nodes: BTreeMap<String, usize>,
    edges: BTreeMap<String, usize>,
    linked_persons: usize,
    missing_persons: usize,
    warnings: usize,
    errors: usize,
    started_at: String,
    elapsed_ms: i64,
}

impl From<&LoadSummary> for SummaryReport {
    fn from(summary: &LoadSummary) -> Self {
        Self {
            case_rows: summary.case_rows,
            persons: summary.persons,
            clades: summary.clades,
            nodes: summary
                .tally
                .nodes
                .iter()
                .map(|(kind, count)| (kind.label().to_string(), *count))
                .collect(),
            edges: summary
                .tally
                .edges
                .iter()
                .map(|(kind, count)| (kind.rel_type().to_string(), *count))
                .collect(),
            linked_persons: summary.links.linked,
            missing_persons: summary.links.missing_persons,
            warnings: summary.audit.warnings,
            errors: summary.audit.errors,
            started_at: summary.started_at.to_rfc3339(),
            elapsed_ms: summary.elapsed().num_milliseconds(),
        }
    }
}

/// Table of node and edge counts per kind
pub fn summary_table(summary: &LoadSummary) -> String {
    let nodes = summary.tally.nodes.iter().map(|(kind, count)| CountRow {
        element: "node",
        kind: kind.label().to_string(),
        count: *count,
    });
    let edges = summary.tally.edges.iter().map(|(kind, count)| CountRow {
        element: "edge",
        kind: kind.rel_type().to_string(),
        count: *count,
    });

    Table::new(nodes.chain(edges).collect::<Vec<_>>()).to_string()
}

/// Display the summary of a finished load
pub fn display_summary(summary: &LoadSummary, format: OutputFormat) -> Result<(), CoreError> {
    match format {
        OutputFormat::Table => {
            println!("{}", "Load Summary".bold().blue());
            println!("{:<15} {}", "Case rows:".bold(), summary.case_rows);
            println!("{:<15} {}", "Persons:".bold(), summary.persons);
            println!("{:<15} {}", "Clades:".bold(), summary.clades);
            println!(
                "{:<15} {}",
                "Started:".bold(),
                summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!(
                "{:<15} {:.1}s",
                "Elapsed:".bold(),
                summary.elapsed().num_milliseconds() as f64 / 1000.0
            );
            println!("{}", summary_table(summary));

            if summary.audit.errors > 0 {
                println!(
                    "{}",
                    format!("✗ {} errors written to the audit log", summary.audit.errors).red()
                );
            }
            if summary.audit.warnings > 0 {
                println!(
                    "{}",
                    format!("! {} warnings written to the audit log", summary.audit.warnings).yellow()
                );
            }
            println!(
                "{}",
                format!(
                    "✓ Loaded {} nodes and {} edges",
                    summary.tally.total_nodes(),
                    summary.tally.total_edges()
                )
                .green()
                .bold()
            );
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&SummaryReport::from(summary))
                .map_err(|e| CoreError::Internal(format!("Failed to serialize to JSON: {}", e)))?;
            println!("{}", json);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use covgraph_core::audit::AuditCounts;
    use covgraph_core::linker::LinkStats;
    use covgraph_core::session::WriteTally;
    use covgraph_core::types::{EdgeKind, NodeKind};

    fn summary() -> LoadSummary {
        let mut tally = WriteTally::default();
        tally.nodes.insert(NodeKind::Person, 3);
        tally.nodes.insert(NodeKind::Nuts3Region, 1);
        tally.edges.insert(EdgeKind::HasStrain, 2);

        let started_at = Utc::now();
        LoadSummary {
            case_rows: 3,
            persons: 3,
            clades: 2,
            links: LinkStats {
                linked: 2,
                missing_clades: 0,
                missing_persons: 1,
            },
            tally,
            audit: AuditCounts {
                info: 3,
                warnings: 0,
                errors: 1,
            },
            started_at,
            finished_at: started_at + Duration::milliseconds(1500),
        }
    }

    #[test]
    fn test_summary_table_lists_every_kind() {
        let table = summary_table(&summary());
        assert!(table.contains("Person"));
        assert!(table.contains("NUTS3Region"));
        assert!(table.contains("HAS_STRAIN"));
    }

    #[test]
    fn test_json_report() {
        let report = SummaryReport::from(&summary());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["nodes"]["Person"], 3);
        assert_eq!(json["edges"]["HAS_STRAIN"], 2);
        assert_eq!(json["errors"], 1);
        assert_eq!(json["elapsed_ms"], 1500);
    }
}
