//! Structured audit log written next to every load run
//!
//! The log is a CSV file with the columns `MessageType,Row,ErrorType,Details`.
//! The header is written as soon as the log is opened; afterwards rows are only
//! appended. Each row is mirrored as a `tracing` event so that console output
//! and the audit file never disagree.

use crate::errors::{LoadError, LoadResult};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{error, info, warn};

/// Column names, in file order
pub const AUDIT_HEADER: [&str; 4] = ["MessageType", "Row", "ErrorType", "Details"];

/// Severity of an audit row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageType {
    Info,
    Warning,
    Error,
}

/// One row of the audit log
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    #[serde(rename = "MessageType")]
    pub message_type: MessageType,
    /// 1-based data row of the input file, if the message concerns one
    #[serde(rename = "Row")]
    pub row: Option<u64>,
    #[serde(rename = "ErrorType")]
    pub error_type: String,
    #[serde(rename = "Details")]
    pub details: String,
}

/// Running totals of what has been logged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditCounts {
    pub info: usize,
    pub warnings: usize,
    pub errors: usize,
}

/// Append-only audit log
pub struct AuditLog {
    writer: csv::Writer<Box<dyn Write + Send>>,
    counts: AuditCounts,
}

impl AuditLog {
    /// Create (or truncate) the log file at `path` and write the header
    pub fn create(path: &Path) -> LoadResult<Self> {
        let file = File::create(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_writer(file)
    }

    /// Write the log to an arbitrary sink
    pub fn from_writer(sink: impl Write + Send + 'static) -> LoadResult<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Box::new(sink) as Box<dyn Write + Send>);
        writer
            .write_record(AUDIT_HEADER)
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|e| LoadError::Audit(e.to_string()))?;

        Ok(Self {
            writer,
            counts: AuditCounts::default(),
        })
    }

    /// Log that does not keep anything, for callers that only need the counters
    pub fn discard() -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(Box::new(std::io::sink()) as Box<dyn Write + Send>),
            counts: AuditCounts::default(),
        }
    }

    pub fn record(&mut self, record: AuditRecord) -> LoadResult<()> {
        match record.message_type {
            MessageType::Info => {
                self.counts.info += 1;
                info!(row = record.row, "{}", record.details);
            }
            MessageType::Warning => {
                self.counts.warnings += 1;
                warn!(row = record.row, kind = %record.error_type, "{}", record.details);
            }
            MessageType::Error => {
                self.counts.errors += 1;
                error!(row = record.row, kind = %record.error_type, "{}", record.details);
            }
        }

        self.writer
            .serialize(&record)
            .map_err(|e| LoadError::Audit(e.to_string()))?;
        self.writer
            .flush()
            .map_err(|e| LoadError::Audit(e.to_string()))
    }

    pub fn info(&mut self, details: impl Into<String>) -> LoadResult<()> {
        self.record(AuditRecord {
            message_type: MessageType::Info,
            row: None,
            error_type: String::new(),
            details: details.into(),
        })
    }

    pub fn warning(
        &mut self,
        row: Option<u64>,
        error_type: impl Into<String>,
        details: impl Into<String>,
    ) -> LoadResult<()> {
        self.record(AuditRecord {
            message_type: MessageType::Warning,
            row,
            error_type: error_type.into(),
            details: details.into(),
        })
    }

    pub fn error(
        &mut self,
        row: Option<u64>,
        error_type: impl Into<String>,
        details: impl Into<String>,
    ) -> LoadResult<()> {
        self.record(AuditRecord {
            message_type: MessageType::Error,
            row,
            error_type: error_type.into(),
            details: details.into(),
        })
    }

    /// Report a bad value in a named field of an input row
    pub fn field_error(&mut self, field_name: &str, row: Option<u64>, err_msg: &str) -> LoadResult<()> {
        self.error(
            row,
            "Value Error",
            format!("Error in {}, details: {}", field_name, err_msg),
        )
    }

    pub fn counts(&self) -> AuditCounts {
        self.counts
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog").field("counts", &self.counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_header_is_written_on_create() {
        let file = NamedTempFile::new().unwrap();
        let _log = AuditLog::create(file.path()).unwrap();

        let rows = read_rows(file.path());
        assert_eq!(rows, vec![AUDIT_HEADER.iter().map(|s| s.to_string()).collect::<Vec<_>>()]);
    }

    #[test]
    fn test_rows_and_counts() {
        let file = NamedTempFile::new().unwrap();
        let mut log = AuditLog::create(file.path()).unwrap();

        log.info("Started cases.csv").unwrap();
        log.field_error("ReportAge", Some(3), "invalid digit found in string").unwrap();
        log.warning(None, "Duplicate", "ssi_id SSI-1 seen twice").unwrap();

        assert_eq!(
            log.counts(),
            AuditCounts {
                info: 1,
                warnings: 1,
                errors: 1
            }
        );

        let rows = read_rows(file.path());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1], vec!["Info", "", "", "Started cases.csv"]);
        assert_eq!(
            rows[2],
            vec![
                "Error",
                "3",
                "Value Error",
                "Error in ReportAge, details: invalid digit found in string"
            ]
        );
        assert_eq!(rows[3][0], "Warning");
        assert_eq!(rows[3][1], "");
    }

    #[test]
    fn test_discard_still_counts() {
        let mut log = AuditLog::discard();
        log.error(Some(1), "FATAL", "boom").unwrap();
        assert_eq!(log.counts().errors, 1);
    }
}
