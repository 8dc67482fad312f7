//! Row validation
//!
//! Every check runs on every row; failures are collected, never short-circuit.
//! Check order is fixed: required-field presence, duplicate key, then each
//! column's coercion in field-table order.

use crate::config::Vocabulary;
use crate::fields::FieldError;
use crate::record::{CoercedRow, MeshRecord, RawRecord};
use crate::schema::{self, FieldSpec, KEY_FIELD};
use serde::Serialize;
use thiserror::Error;

/// The kinds of row-scoped failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    MissingRequiredField,
    DuplicateKey,
    InvalidEnum,
    NotNumeric,
    OutOfRange,
    InvalidBoolean,
    NotInteger,
    InvalidListElement,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// One reason a row was excluded. `Display` is the report line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("Empty value at line {line} for '{field}': required field is missing")]
    MissingRequiredField { line: usize, field: String },

    #[error("Duplicate key at line {line} for '{field}': {key} occurs more than once in the batch")]
    DuplicateKey {
        line: usize,
        field: String,
        key: String,
    },

    #[error("Error at line {line} for '{}': {error}", .error.field())]
    InvalidField { line: usize, error: FieldError },
}

impl RowError {
    pub fn line(&self) -> usize {
        match self {
            RowError::MissingRequiredField { line, .. }
            | RowError::DuplicateKey { line, .. }
            | RowError::InvalidField { line, .. } => *line,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            RowError::MissingRequiredField { field, .. } | RowError::DuplicateKey { field, .. } => {
                field
            },
            RowError::InvalidField { error, .. } => error.field(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RowError::MissingRequiredField { .. } => ErrorKind::MissingRequiredField,
            RowError::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            RowError::InvalidField { error, .. } => match error {
                FieldError::InvalidEnum { .. } => ErrorKind::InvalidEnum,
                FieldError::NotNumeric { .. } => ErrorKind::NotNumeric,
                FieldError::OutOfRange { .. } => ErrorKind::OutOfRange,
                FieldError::InvalidBoolean { .. } => ErrorKind::InvalidBoolean,
                FieldError::NotInteger { .. } => ErrorKind::NotInteger,
                FieldError::InvalidListElement { .. } => ErrorKind::InvalidListElement,
            },
        }
    }
}

/// Cell value, treating an empty string as missing whatever the null tokens are
fn present<'a>(record: &'a RawRecord, name: &str) -> Option<&'a str> {
    record.get(name).filter(|value| !value.is_empty())
}

/// Outcome of validating one row
#[derive(Debug, Clone, PartialEq)]
pub struct RowValidationResult {
    pub line: usize,
    /// Failures in check order; empty means the row is valid
    pub errors: Vec<RowError>,
    /// Every value that coerced, kept even when the row is excluded
    pub values: CoercedRow,
    /// Present exactly when `errors` is empty
    pub record: Option<MeshRecord>,
}

impl RowValidationResult {
    pub fn is_excluded(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Applies a field table to raw rows
#[derive(Debug, Clone)]
pub struct RowValidator {
    specs: Vec<FieldSpec>,
}

impl RowValidator {
    pub fn new(specs: Vec<FieldSpec>) -> Self {
        Self { specs }
    }

    /// Validator for mesh product rows
    pub fn for_mesh(vocab: &Vocabulary) -> Self {
        Self::new(schema::mesh_fields(vocab))
    }

    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    /// Validate `record`. `duplicated` says whether its key repeats in the batch.
    pub fn validate(&self, record: &RawRecord, duplicated: bool) -> RowValidationResult {
        let line = record.line();
        let mut errors = Vec::new();

        for spec in self.specs.iter().filter(|s| s.required) {
            if present(record, spec.name).is_none() {
                errors.push(RowError::MissingRequiredField {
                    line,
                    field: spec.name.to_string(),
                });
            }
        }

        if duplicated {
            errors.push(RowError::DuplicateKey {
                line,
                field: KEY_FIELD.to_string(),
                key: record.get(KEY_FIELD).unwrap_or_default().to_string(),
            });
        }

        let mut values = CoercedRow::default();
        for spec in &self.specs {
            let raw = present(record, spec.name);
            // Missing required cells were reported above
            if spec.required && raw.is_none() {
                continue;
            }
            match spec.coerce(raw) {
                Ok(value) => values.insert(spec.name, value),
                Err(error) => errors.push(RowError::InvalidField { line, error }),
            }
        }

        let record = if errors.is_empty() {
            match MeshRecord::from_coerced(&values) {
                Ok(record) => Some(record),
                Err(field) => {
                    errors.push(RowError::MissingRequiredField {
                        line,
                        field: field.to_string(),
                    });
                    None
                },
            }
        } else {
            None
        };

        RowValidationResult {
            line,
            errors,
            values,
            record,
        }
    }
}
