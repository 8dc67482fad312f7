//! Delimited file reader
//!
//! Loads the whole input into memory as [`RawRecord`]s. The header row names
//! the columns; every required column must be present in it. Short rows are
//! padded with nulls, rows wider than the header abort the read.

use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::record::RawRecord;
use crate::schema::{mesh_fields, required_columns};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;
use tracing::{debug, instrument};

/// CSV reader configured for one input format
#[derive(Debug, Clone)]
pub struct BatchReader {
    delimiter: u8,
    null_tokens: Vec<String>,
    required_columns: Vec<String>,
}

impl BatchReader {
    pub fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            null_tokens: Vec::new(),
            required_columns: Vec::new(),
        }
    }

    /// Reader using the delimiter and null tokens of `config`
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.delimiter_byte()).with_null_tokens(config.null_tokens.clone())
    }

    /// Reader for mesh product files: `config` settings plus the required mesh columns
    pub fn for_mesh(config: &IngestConfig) -> Self {
        let specs = mesh_fields(&config.vocabulary);
        Self::from_config(config).with_required_columns(&required_columns(&specs))
    }

    /// Cell values to read as null
    pub fn with_null_tokens(mut self, tokens: Vec<String>) -> Self {
        self.null_tokens = tokens;
        self
    }

    /// Columns the header must contain
    pub fn with_required_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.required_columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    /// Read every data row of the file at `path`
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_path(&self, path: &Path) -> Result<Vec<RawRecord>> {
        let file = std::fs::File::open(path).map_err(|e| IngestError::read_input(path, e))?;
        self.read(file)
    }

    /// Read every data row from `input`
    pub fn read<R: Read>(&self, input: R) -> Result<Vec<RawRecord>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::None)
            .from_reader(input);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        self.check_headers(&headers)?;

        let mut records = Vec::new();
        let mut row = StringRecord::new();
        while reader.read_record(&mut row)? {
            let line = records.len() + 1;
            if row.len() > headers.len() {
                return Err(IngestError::TooManyFields {
                    line,
                    expected: headers.len(),
                    found: row.len(),
                });
            }
            records.push(self.to_raw_record(line, &headers, &row));
        }

        debug!(rows = records.len(), columns = headers.len(), "Input loaded");
        Ok(records)
    }

    fn check_headers(&self, headers: &[String]) -> Result<()> {
        match self
            .required_columns
            .iter()
            .find(|required| !headers.contains(required))
        {
            Some(missing) => Err(IngestError::MissingColumn(missing.clone())),
            None => Ok(()),
        }
    }

    fn to_raw_record(&self, line: usize, headers: &[String], row: &StringRecord) -> RawRecord {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = row
                    .get(i)
                    .filter(|cell| !self.is_null(cell))
                    .map(str::to_string);
                (name.clone(), value)
            })
            .collect();
        RawRecord::new(line, fields)
    }

    fn is_null(&self, cell: &str) -> bool {
        self.null_tokens.iter().any(|token| token == cell)
    }
}

/// Read a mesh product file
pub fn read_batch(path: &Path, config: &IngestConfig) -> Result<Vec<RawRecord>> {
    BatchReader::for_mesh(config).read_path(path)
}

/// Read mesh product rows from any byte source
pub fn read_batch_from<R: Read>(input: R, config: &IngestConfig) -> Result<Vec<RawRecord>> {
    BatchReader::for_mesh(config).read(input)
}
