//! Readers for the delimited input files

use crate::errors::{LoadError, LoadResult};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub const COMMA: u8 = b',';
pub const TAB: u8 = b'\t';

/// Open an input file, mapping "not found" to [`LoadError::MissingFile`]
pub fn open_input(path: &Path) -> LoadResult<File> {
    File::open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::MissingFile(path.to_path_buf())
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// One data row of a file with a header line, addressed by column name
#[derive(Debug, Clone)]
pub struct Row {
    number: u64,
    columns: Arc<HashMap<String, usize>>,
    record: StringRecord,
}

impl Row {
    /// 1-based position of the row among the data rows of its file
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Value of `column`, or `""` when the column or the cell is absent
    pub fn get(&self, column: &str) -> &str {
        self.columns
            .get(column)
            .and_then(|&idx| self.record.get(idx))
            .unwrap_or("")
    }

    /// Whether the row carries a cell for `column`
    pub fn has(&self, column: &str) -> bool {
        self.columns
            .get(column)
            .map_or(false, |&idx| idx < self.record.len())
    }
}

/// Streaming reader over a delimited file whose first line names the columns
pub struct HeaderedReader {
    path: PathBuf,
    reader: csv::Reader<File>,
    columns: Arc<HashMap<String, usize>>,
    rows_read: u64,
    exhausted: bool,
}

impl HeaderedReader {
    pub fn open(path: &Path, delimiter: u8) -> LoadResult<Self> {
        let file = open_input(path)?;
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let columns: HashMap<String, usize> = reader
            .headers()
            .map_err(|e| LoadError::csv(path, e))?
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_string(), idx))
            .collect();

        debug!("Opened {} with {} columns", path.display(), columns.len());

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            columns: Arc::new(columns),
            rows_read: 0,
            exhausted: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Fail with [`LoadError::MissingColumn`] unless the header names `column`
    pub fn require_column(&self, column: &str) -> LoadResult<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(LoadError::MissingColumn {
                path: self.path.clone(),
                column: column.to_string(),
            })
        }
    }

    /// Read the next data row.
    ///
    /// A record that cannot be decoded yields `Err` with its row number; the
    /// reader stays usable so callers can log it and carry on.
    pub fn next_row(&mut self) -> Option<Result<Row, (u64, csv::Error)>> {
        if self.exhausted {
            return None;
        }
        let mut record = StringRecord::new();
        self.rows_read += 1;
        match self.reader.read_record(&mut record) {
            Ok(true) => Some(Ok(Row {
                number: self.rows_read,
                columns: Arc::clone(&self.columns),
                record,
            })),
            Ok(false) => None,
            Err(e) => {
                // an I/O failure would repeat forever, so it ends the stream
                if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                    self.exhausted = true;
                }
                Some(Err((self.rows_read, e)))
            }
        }
    }
}

/// Read every record of a small tab-delimited reference table
pub fn read_reference_table(path: &Path, has_header: bool) -> LoadResult<Vec<StringRecord>> {
    let file = open_input(path)?;
    let mut reader = ReaderBuilder::new()
        .delimiter(TAB)
        .has_headers(has_header)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for result in reader.records() {
        rows.push(result.map_err(|e| LoadError::csv(path, e))?);
    }

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_rows_are_addressed_by_column_name() {
        let file = write_file("ssi_id,Sex,ReportAge\nSSI-1,F,42\nSSI-2,M\n");
        let mut reader = HeaderedReader::open(file.path(), COMMA).unwrap();
        assert!(reader.has_column("Sex"));
        assert!(reader.require_column("Travel").is_err());

        let first = reader.next_row().unwrap().unwrap();
        assert_eq!(first.number(), 1);
        assert_eq!(first.get("ssi_id"), "SSI-1");
        assert_eq!(first.get("ReportAge"), "42");
        assert_eq!(first.get("Travel"), "");

        let second = reader.next_row().unwrap().unwrap();
        assert_eq!(second.number(), 2);
        assert!(second.has("Sex"));
        assert!(!second.has("ReportAge"));
        assert_eq!(second.get("ReportAge"), "");

        assert!(reader.next_row().is_none());
    }

    #[test]
    fn test_missing_file_is_reported_as_such() {
        let err = HeaderedReader::open(Path::new("/definitely/not/here.tsv"), TAB)
            .err()
            .unwrap();
        assert!(matches!(err, LoadError::MissingFile(_)));
    }

    #[test]
    fn test_reference_table_with_and_without_header() {
        let file = write_file("code\tname\n101\tAarhus\n");
        let rows = read_reference_table(file.path(), true).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][1], "Aarhus");

        let file = write_file("0-9\n10-19\n");
        let rows = read_reference_table(file.path(), false).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "0-9");
    }
}
