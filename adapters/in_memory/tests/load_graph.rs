use covgraph_adapter_in_memory::{InMemoryConfig, InMemoryStore};
use covgraph_core::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CASE_HEADER: &str = "ssi_id,ReportAge,ReportAgeGrp,Sex,ZipCodeCity,zipcode_name,Parishcode,ParishName,MunicipalityCode,NUTS3Code,NUTS3Text,Diabetes,Plejehjemsnavn";

const CASE_ROWS: [&str; 3] = [
    // risk flag set, full geography
    "SSI-1,45,40-49,F,8000,Aarhus C,7001,Vor Frue,751,DK042,Østjylland,SAND,",
    // unknown age group
    "SSI-2,33,33-33,M,8000,Aarhus C,,,,,,,",
    // empty age
    "SSI-3,,40-49,F,2100,København Ø,,,,,,,Solbo",
];

const CLADE_ROWS: [&str; 4] = [
    "hCoV-19/DK/ALAB-SSI1/2020\t20A",
    "hCoV-19/DK/ALAB-SSI2/2020\t20A/20B",
    "Wuhan/WH01/2019\t20A",
    "hCoV-19/DK/ALAB-SSI9/2020\t20A/20B",
];

struct Fixture {
    dir: TempDir,
    sources: LoadSources,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let dims_dir = dir.path().join("stable_dims");
        fs::create_dir(&dims_dir).unwrap();

        write(&dims_dir.join("age_groups.tsv"), &["0-9", "40-49"]);
        write(
            &dims_dir.join("parish_ses.tsv"),
            &["code\tname\tpopulation\tghetto_area", "7001\tVor Frue\t5400\t0"],
        );
        write(
            &dims_dir.join("municipalities.tsv"),
            &["code\tname\tregion\tarea\tpopulation", "751\tAarhus\t-\t-\t350000"],
        );
        write(&dims_dir.join("nuts3_regions.tsv"), &["code\tname", "DK042\tØstjylland"]);
        write(&dims_dir.join("risk_factors.tsv"), &["code\tname", "Diabetes\tDiabetes"]);

        let case_file = dir.path().join("cases.csv");
        let mut cases = vec![CASE_HEADER];
        cases.extend(CASE_ROWS);
        write(&case_file, &cases);

        let clade_file = dir.path().join("clades.tsv");
        let mut clades = vec!["strain\tclade"];
        clades.extend(CLADE_ROWS);
        write(&clade_file, &clades);

        Self {
            sources: LoadSources {
                case_file,
                clade_file,
                dims_dir,
            },
            dir,
        }
    }

    fn log_path(&self) -> PathBuf {
        self.dir.path().join("load_log.csv")
    }
}

fn write(path: &Path, lines: &[&str]) {
    fs::write(path, lines.join("\n") + "\n").unwrap();
}

async fn person(store: &InMemoryStore, ssi_id: &str) -> (NodeId, Node) {
    store
        .find_node(NodeKind::Person, "ssi_id", ssi_id)
        .await
        .unwrap()
}

/// Id-independent description of the committed graph
async fn fingerprint(store: &InMemoryStore) -> (Vec<String>, Vec<String>) {
    let mut described = std::collections::HashMap::new();
    let mut nodes = Vec::new();
    for kind in NodeKind::ALL {
        for (id, node) in store.nodes_of(kind).await {
            let text = format!("{}{}", kind, node.props);
            described.insert(id, text.clone());
            nodes.push(text);
        }
    }

    let mut edges = Vec::new();
    for kind in EdgeKind::ALL {
        for edge in store.edges_of(kind).await {
            edges.push(format!(
                "{} -{}-> {}",
                described[&edge.from], kind, described[&edge.to]
            ));
        }
    }

    nodes.sort();
    edges.sort();
    (nodes, edges)
}

#[tokio::test]
async fn test_end_to_end_load() {
    let fixture = Fixture::new();
    let store = InMemoryStore::new();
    let mut audit = AuditLog::create(&fixture.log_path()).unwrap();

    let summary = load_graph(&store, &fixture.sources, &mut audit).await.unwrap();

    assert_eq!(summary.persons, 3);
    assert_eq!(summary.case_rows, 3);
    assert_eq!(summary.clades, 2);
    assert_eq!(summary.tally.nodes_of(NodeKind::Person), 3);

    // two lineages, one evolved from the other
    let strains = store.nodes_of(NodeKind::Strain).await;
    assert_eq!(strains.len(), 2);
    let evolved = store.edges_of(EdgeKind::EvolvedFrom).await;
    assert_eq!(evolved.len(), 1);
    let (child, _) = store.find_node(NodeKind::Strain, "name", "20A/20B").await.unwrap();
    let (parent, _) = store.find_node(NodeKind::Strain, "name", "20A").await.unwrap();
    assert_eq!((evolved[0].from, evolved[0].to), (child, parent));

    let (ssi1, _) = person(&store, "SSI-1").await;
    let (ssi2, node2) = person(&store, "SSI-2").await;
    let (ssi3, node3) = person(&store, "SSI-3").await;

    assert_eq!(store.edges_from(ssi1, EdgeKind::HasRisk).await.len(), 1);
    assert_eq!(store.edges_from(ssi1, EdgeKind::InGroup).await.len(), 1);
    assert_eq!(node2.property("age"), Some(&Value::from(33)));
    assert!(store.edges_from(ssi2, EdgeKind::InGroup).await.is_empty());
    assert_eq!(node3.property("age"), Some(&Value::Null));
    assert_eq!(store.edges_from(ssi3, EdgeKind::ResidentOf).await.len(), 1);

    for id in [ssi1, ssi2, ssi3] {
        assert_eq!(store.edges_from(id, EdgeKind::IsA).await.len(), 1);
    }

    // shared postcode, one node
    assert_eq!(store.nodes_of(NodeKind::PostCode).await.len(), 2);
    let (aarhus, _) = store.find_node(NodeKind::PostCode, "code", "8000").await.unwrap();
    let lives_in_aarhus = store
        .edges_of(EdgeKind::LivesIn)
        .await
        .into_iter()
        .filter(|e| e.to == aarhus)
        .count();
    assert_eq!(lives_in_aarhus, 2);

    // eager reference nodes are reused by the person rows
    assert_eq!(store.nodes_of(NodeKind::Municipality).await.len(), 1);
    assert_eq!(store.nodes_of(NodeKind::Nuts3Region).await.len(), 1);

    assert_eq!(store.edges_of(EdgeKind::HasStrain).await.len(), 2);
    assert_eq!(summary.links.missing_persons, 1);

    // SSI-9 has a lineage but no case row
    assert_eq!(summary.audit.errors, 1);
    assert_eq!(summary.audit.warnings, 0);
    drop(audit);

    let log = fs::read_to_string(fixture.log_path()).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines[0], "MessageType,Row,ErrorType,Details");
    assert!(lines[1].starts_with("Info,,,Started"));
    assert!(log.contains("resulting in 2 clades"));
    assert!(log.contains("Error,,Value Error,\"Error in Clade person"));
    assert!(lines[lines.len() - 1].starts_with("Info,,,Finished"));
}

#[tokio::test]
async fn test_reload_gives_identical_graph() {
    let fixture = Fixture::new();
    let store = InMemoryStore::new();

    load_graph(&store, &fixture.sources, &mut AuditLog::discard())
        .await
        .unwrap();
    let first = fingerprint(&store).await;
    let stats = store.stats().await;

    load_graph(&store, &fixture.sources, &mut AuditLog::discard())
        .await
        .unwrap();

    assert_eq!(store.stats().await, stats);
    assert_eq!(fingerprint(&store).await, first);
}

#[tokio::test]
async fn test_missing_input_leaves_store_untouched() {
    let fixture = Fixture::new();
    let store = InMemoryStore::new();
    load_graph(&store, &fixture.sources, &mut AuditLog::discard())
        .await
        .unwrap();
    let stats = store.stats().await;

    let mut sources = fixture.sources.clone();
    sources.clade_file = fixture.dir.path().join("missing.tsv");
    let err = load_graph(&store, &sources, &mut AuditLog::discard())
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Load(LoadError::MissingFile(_))));
    assert_eq!(store.stats().await, stats);
}

#[tokio::test]
async fn test_store_failure_rolls_back() {
    let fixture = Fixture::new();
    let store = InMemoryStore::new_with_config(InMemoryConfig {
        max_nodes: Some(5),
        ..Default::default()
    });

    let err = load_graph(&store, &fixture.sources, &mut AuditLog::discard())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::Storage(GraphError::ConstraintViolation(_))
    ));
    assert_eq!(store.stats().await.nodes, 0);
}
