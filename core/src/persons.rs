//! Person loading from the case-metadata file
//!
//! The case file is streamed row by row. Each row becomes one Person node and
//! is wired to the dimension nodes it references; only the registries outlive
//! the row.

use crate::dimensions::Dimensions;
use crate::errors::{CoreResult, LoadResult};
use crate::registry::CodeRegistry;
use crate::session::{DimensionLink, LoadSession};
use crate::tables::{HeaderedReader, Row, COMMA};
use crate::types::{EdgeKind, Node, NodeId, NodeKind};
use serde::Serialize;
use std::num::ParseIntError;
use std::path::Path;
use tracing::{debug, info, trace};

/// Case-file column names
pub mod columns {
    pub const SSI_ID: &str = "ssi_id";
    pub const REPORT_AGE: &str = "ReportAge";
    pub const REPORT_AGE_GROUP: &str = "ReportAgeGrp";
    pub const COVID19_STATUS: &str = "COVID19_Status";
    pub const COVID19_END_DATE: &str = "COVID19_EndDate";
    pub const PREGNANCY: &str = "Pregnancy";
    pub const SEQUENCED: &str = "sequenced";
    pub const SYMPTOMS_START_DATE: &str = "SymptomsStartDate";
    pub const SAMPLE_DATE: &str = "SampleDate";
    pub const SYMPTOMS: &str = "Symptoms";
    pub const TRAVEL: &str = "Travel";
    pub const MINKE: &str = "Minke";
    pub const DOCTOR: &str = "Doctor";
    pub const NURSE: &str = "Nurse";
    pub const HEALTH_ASSIST: &str = "HealthAssist";
    pub const DEATH_60_DAYS: &str = "Death60Days_final";
    pub const DATE_OF_DEATH: &str = "DateOfDeath_final";
    pub const OCCUPATION: &str = "Occupation";
    pub const CITIZENSHIP_CODE: &str = "CitizenshipCode";
    pub const SEX: &str = "Sex";
    pub const ZIP_CODE: &str = "ZipCodeCity";
    pub const ZIP_CODE_NAME: &str = "zipcode_name";
    pub const PARISH_CODE: &str = "Parishcode";
    pub const PARISH_NAME: &str = "ParishName";
    pub const MUNICIPALITY_CODE: &str = "MunicipalityCode";
    pub const NUTS3_CODE: &str = "NUTS3Code";
    pub const NUTS3_TEXT: &str = "NUTS3Text";
    pub const PLACE_OF_INFECTION: &str = "PlaceOfInfection_EN";
    pub const NURSING_HOME: &str = "Plejehjemsnavn";
    pub const BRANCHES: [&str; 3] = ["branche1", "branche2", "branche3"];
}

use columns::*;

/// Status written when the case file leaves `COVID19_Status` blank
pub const DEFAULT_COVID19_STATUS: &str = "0";

/// Risk-factor cell values that mark the factor as present
pub const RISK_FLAG_VALUES: [&str; 2] = ["SAND", "TRUE"];

const POST_CODE: DimensionLink = DimensionLink::named(ZIP_CODE, ZIP_CODE_NAME, EdgeKind::LivesIn);
const PARISH: DimensionLink = DimensionLink::named(PARISH_CODE, PARISH_NAME, EdgeKind::LivesIn);
const MUNICIPALITY: DimensionLink = DimensionLink::new(MUNICIPALITY_CODE, EdgeKind::PartOf);
const NUTS3_REGION: DimensionLink = DimensionLink::named(NUTS3_CODE, NUTS3_TEXT, EdgeKind::PartOf);
const PLACE_OF_INFECTION_LINK: DimensionLink =
    DimensionLink::new(PLACE_OF_INFECTION, EdgeKind::PlaceOfInfection);
const NURSING_HOME_LINK: DimensionLink = DimensionLink::new(NURSING_HOME, EdgeKind::ResidentOf);

/// Scalar attributes of one Person node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonRecord {
    pub ssi_id: String,
    pub age: Option<i64>,
    #[serde(rename = "COVID19_Status")]
    pub covid19_status: String,
    #[serde(rename = "COVID19_EndDate")]
    pub covid19_end_date: String,
    #[serde(rename = "IsPregnant")]
    pub is_pregnant: bool,
    pub sequenced: bool,
    #[serde(rename = "SymptomsStartDate")]
    pub symptoms_start_date: String,
    #[serde(rename = "SampleDate")]
    pub sample_date: String,
    #[serde(rename = "Symptoms")]
    pub symptoms: String,
    #[serde(rename = "Travel")]
    pub travel: bool,
    #[serde(rename = "Minke")]
    pub minke: String,
    #[serde(rename = "Doctor")]
    pub doctor: bool,
    #[serde(rename = "Nurse")]
    pub nurse: bool,
    #[serde(rename = "HealthAssist")]
    pub health_assist: bool,
    #[serde(rename = "Death60Days_final")]
    pub death_60_days: bool,
    #[serde(rename = "DateOfDeath")]
    pub date_of_death: String,
    #[serde(rename = "Occupation")]
    pub occupation: String,
    #[serde(rename = "CitizenshipCode")]
    pub citizenship_code: String,
}

impl PersonRecord {
    /// Coerce the scalar columns of `row`; `age` is parsed by the caller so
    /// that a bad value can be reported against the row.
    pub fn from_row(row: &Row, age: Option<i64>) -> Self {
        let status = row.get(COVID19_STATUS);
        Self {
            ssi_id: row.get(SSI_ID).to_string(),
            age,
            covid19_status: if status.is_empty() {
                DEFAULT_COVID19_STATUS.to_string()
            } else {
                status.to_string()
            },
            covid19_end_date: row.get(COVID19_END_DATE).to_string(),
            is_pregnant: flag(row, PREGNANCY),
            sequenced: flag(row, SEQUENCED),
            symptoms_start_date: row.get(SYMPTOMS_START_DATE).to_string(),
            sample_date: row.get(SAMPLE_DATE).to_string(),
            symptoms: row.get(SYMPTOMS).to_string(),
            travel: flag(row, TRAVEL),
            minke: row.get(MINKE).to_string(),
            doctor: flag(row, DOCTOR),
            nurse: flag(row, NURSE),
            health_assist: flag(row, HEALTH_ASSIST),
            death_60_days: flag(row, DEATH_60_DAYS),
            date_of_death: row.get(DATE_OF_DEATH).to_string(),
            occupation: row.get(OCCUPATION).to_string(),
            citizenship_code: row.get(CITIZENSHIP_CODE).to_string(),
        }
    }

    pub fn to_node(&self) -> CoreResult<Node> {
        Ok(Node {
            kind: NodeKind::Person,
            props: serde_json::to_value(self)?,
        })
    }
}

/// Boolean columns are true only for a literal `"1"`
fn flag(row: &Row, column: &str) -> bool {
    row.get(column) == "1"
}

/// Parse `ReportAge`; an empty cell is no age rather than zero
pub fn parse_age(raw: &str) -> Result<Option<i64>, ParseIntError> {
    let raw = raw.trim();
    if raw.is_empty() {
        Ok(None)
    } else {
        raw.parse().map(Some)
    }
}

/// Check that the case file exists and its header names the case id column
pub fn check_case_file(path: &Path) -> LoadResult<()> {
    HeaderedReader::open(path, COMMA)?.require_column(SSI_ID)
}

/// Outcome of the person stage
#[derive(Debug, Clone)]
pub struct PersonLoad {
    /// Person node per case id, last row wins for duplicated ids
    pub persons: CodeRegistry,
    pub rows: u64,
}

/// Stream the case file and create one Person per row
pub async fn load_persons(
    session: &mut LoadSession<'_>,
    case_file: &Path,
    dims: &mut Dimensions,
) -> CoreResult<PersonLoad> {
    let mut reader = HeaderedReader::open(case_file, COMMA)?;
    reader.require_column(SSI_ID)?;

    let mut persons = CodeRegistry::new(NodeKind::Person);
    let mut rows = 0u64;

    while let Some(next) = reader.next_row() {
        rows += 1;
        let row = match next {
            Ok(row) => row,
            Err((number, e)) => {
                session
                    .audit()
                    .error(Some(number), "Row Error", format!("Could not read row: {}", e))?;
                continue;
            }
        };

        let person = load_person(session, &row, dims).await?;
        let ssi_id = row.get(SSI_ID);
        if ssi_id.is_empty() {
            session.audit().field_error(SSI_ID, Some(row.number()), "empty case id")?;
        } else if persons.insert(ssi_id.to_string(), person).is_some() {
            session.audit().warning(
                Some(row.number()),
                "Duplicate",
                format!("ssi_id {} seen more than once, keeping the last row", ssi_id),
            )?;
        }
    }

    info!("Loaded {} persons from {}", persons.len(), case_file.display());
    Ok(PersonLoad { persons, rows })
}

/// Create the Person node for one row and every edge it implies
pub async fn load_person(
    session: &mut LoadSession<'_>,
    row: &Row,
    dims: &mut Dimensions,
) -> CoreResult<NodeId> {
    let age = match parse_age(row.get(REPORT_AGE)) {
        Ok(age) => age,
        Err(e) => {
            session
                .audit()
                .field_error(REPORT_AGE, Some(row.number()), &e.to_string())?;
            None
        }
    };
    let record = PersonRecord::from_row(row, age);
    let person = session.create_node(record.to_node()?).await?;
    trace!("Created person {} for row {}", record.ssi_id, row.number());

    match dims.sex(row.get(SEX)) {
        Some(sex) => session.link(person, EdgeKind::IsA, sex).await?,
        None => {
            session.audit().warning(
                Some(row.number()),
                "Sex",
                format!("Unrecognized Sex value '{}'", row.get(SEX)),
            )?;
        }
    }

    // age groups are a closed set, unknown labels are skipped
    if let Some(group) = dims.age_groups.get(row.get(REPORT_AGE_GROUP)) {
        session.link(person, EdgeKind::InGroup, group).await?;
    }

    session
        .resolve_and_link(row, Some(person), POST_CODE, &mut dims.post_codes)
        .await?;

    link_geography(session, row, person, dims).await?;

    for code in &dims.risk_factor_codes {
        if !RISK_FLAG_VALUES.contains(&row.get(code)) {
            continue;
        }
        if let Some(factor) = dims.risk_factors.get(code.as_str()) {
            session.link(person, EdgeKind::HasRisk, factor).await?;
        }
    }

    session
        .resolve_and_link(row, Some(person), PLACE_OF_INFECTION_LINK, &mut dims.countries)
        .await?;
    session
        .resolve_and_link(row, Some(person), NURSING_HOME_LINK, &mut dims.nursing_homes)
        .await?;

    for column in BRANCHES {
        session
            .resolve_and_link(
                row,
                Some(person),
                DimensionLink::new(column, EdgeKind::OccupationBranche),
                &mut dims.branches,
            )
            .await?;
    }

    Ok(person)
}

/// Parish, municipality and region, each linked from the one before it.
///
/// The chain stops at the first level the row leaves empty.
async fn link_geography(
    session: &mut LoadSession<'_>,
    row: &Row,
    person: NodeId,
    dims: &mut Dimensions,
) -> CoreResult<()> {
    let stages = [
        (PARISH, &mut dims.parishes),
        (MUNICIPALITY, &mut dims.municipalities),
        (NUTS3_REGION, &mut dims.nuts3_regions),
    ];

    let mut source = person;
    for (link, registry) in stages {
        match session.resolve_and_link(row, Some(source), link, registry).await? {
            Some(node) => source = node,
            None => {
                debug!("Geography chain for row {} stops at {}", row.number(), link.code_field);
                break;
            }
        }
    }
    Ok(())
}
