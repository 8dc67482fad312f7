//! Batch validation pipeline
//!
//! Runs duplicate detection once over the batch, then validates each row in
//! input order. Excluded rows drop out of the [`ValidatedBatch`]; their errors
//! go to the [`ErrorReport`]. Nothing is written here.

use crate::config::Vocabulary;
use crate::duplicates::DuplicateIndex;
use crate::record::{MeshRecord, RawRecord};
use crate::row::{ErrorKind, RowError, RowValidator};
use crate::schema::KEY_FIELD;
use serde::Serialize;
use tracing::{debug, info};

/// Rows that passed every check, in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedBatch {
    records: Vec<MeshRecord>,
}

impl ValidatedBatch {
    pub fn records(&self) -> &[MeshRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MeshRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<MeshRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a ValidatedBatch {
    type Item = &'a MeshRecord;
    type IntoIter = std::slice::Iter<'a, MeshRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// One report line in serializable form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub line: usize,
    pub kind: ErrorKind,
    pub field: String,
    pub message: String,
}

impl From<&RowError> for ReportEntry {
    fn from(error: &RowError) -> Self {
        Self {
            line: error.line(),
            kind: error.kind(),
            field: error.field().to_string(),
            message: error.to_string(),
        }
    }
}

/// Every row error of a batch, ordered by row then by check order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorReport {
    errors: Vec<RowError>,
}

impl ErrorReport {
    pub fn errors(&self) -> &[RowError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable lines, one per error
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn entries(&self) -> Vec<ReportEntry> {
        self.errors.iter().map(ReportEntry::from).collect()
    }

    /// Distinct excluded line numbers, ascending
    pub fn excluded_lines(&self) -> Vec<usize> {
        let mut lines: Vec<usize> = self.errors.iter().map(RowError::line).collect();
        lines.sort_unstable();
        lines.dedup();
        lines
    }

    /// Count of errors of `kind`
    pub fn count_of(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind() == kind).count()
    }
}

impl Serialize for ErrorReport {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.errors.iter().map(ReportEntry::from))
    }
}

/// Output of one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub total_rows: usize,
    pub batch: ValidatedBatch,
    pub report: ErrorReport,
}

impl BatchResult {
    pub fn excluded_rows(&self) -> usize {
        self.total_rows - self.batch.len()
    }
}

/// Drives row validation across a whole batch
#[derive(Debug, Clone)]
pub struct BatchPipeline {
    validator: RowValidator,
}

impl BatchPipeline {
    pub fn new(validator: RowValidator) -> Self {
        Self { validator }
    }

    /// Pipeline using the mesh field table
    pub fn for_mesh(vocab: &Vocabulary) -> Self {
        Self::new(RowValidator::for_mesh(vocab))
    }

    pub fn validator(&self) -> &RowValidator {
        &self.validator
    }

    /// Validate every record. Never stops early.
    pub fn run(&self, records: &[RawRecord]) -> BatchResult {
        let duplicates = DuplicateIndex::from_records(records, KEY_FIELD);
        if !duplicates.is_empty() {
            debug!(keys = duplicates.len(), "Duplicate codenames in batch");
        }

        let mut batch = ValidatedBatch::default();
        let mut report = ErrorReport::default();

        for record in records {
            let duplicated = duplicates.is_duplicated(record.get(KEY_FIELD));
            let result = self.validator.validate(record, duplicated);

            match result.record {
                Some(valid) if result.errors.is_empty() => batch.records.push(valid),
                _ => {
                    debug!(line = result.line, errors = result.errors.len(), "Row excluded");
                    report.errors.extend(result.errors);
                },
            }
        }

        info!(
            total = records.len(),
            valid = batch.len(),
            errors = report.len(),
            "Batch validated"
        );

        BatchResult {
            total_rows: records.len(),
            batch,
            report,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn mesh_row(line: usize, codename: &str, mass_surf: &str) -> RawRecord {
        RawRecord::from_pairs(
            line,
            &[
                ("codename", codename),
                ("trame", "T2 Ra1 M2 E2"),
                ("mass_surf", mass_surf),
                ("is_compat_interior_wall", "vrai"),
                ("mesh_height", "2.0"),
                ("mesh_width", "1.0"),
                ("color_names", "white,blue"),
            ],
        )
    }

    fn pipeline() -> BatchPipeline {
        BatchPipeline::for_mesh(&Vocabulary::default())
    }

    #[test]
    fn test_all_valid_rows_pass_through() {
        let rows = vec![mesh_row(1, "A1", "12.5"), mesh_row(2, "B2", "0")];
        let result = pipeline().run(&rows);

        assert!(result.report.is_empty());
        assert_eq!(result.batch.len(), 2);
        assert_eq!(result.batch.records()[0].color_names, vec!["white", "blue"]);
        assert_eq!(result.batch.records()[1].mass_surf, 0.0);
    }

    #[test]
    fn test_bad_row_excludes_only_itself() {
        let rows = vec![
            mesh_row(1, "A1", "1"),
            mesh_row(2, "B2", "-3"),
            mesh_row(3, "C3", "2"),
        ];
        let result = pipeline().run(&rows);

        let codes: Vec<_> = result.batch.iter().map(|r| r.codename.as_str()).collect();
        assert_eq!(codes, vec!["A1", "C3"]);
        assert_eq!(result.report.len(), 1);
        assert_eq!(result.report.excluded_lines(), vec![2]);
        assert_eq!(result.excluded_rows(), 1);
    }

    #[test]
    fn test_duplicates_exclude_every_sharing_row() {
        let rows = vec![
            mesh_row(1, "A1", "1"),
            mesh_row(2, "B2", "1"),
            mesh_row(3, "A1", "1"),
        ];
        let result = pipeline().run(&rows);

        assert_eq!(result.batch.len(), 1);
        assert_eq!(result.batch.records()[0].codename, "B2");
        assert_eq!(result.report.count_of(ErrorKind::DuplicateKey), 2);
        assert_eq!(result.report.excluded_lines(), vec![1, 3]);
    }

    #[test]
    fn test_invalid_row_still_counts_toward_duplicates() {
        let rows = vec![mesh_row(1, "A1", "1"), mesh_row(2, "A1", "oops")];
        let result = pipeline().run(&rows);

        assert!(result.batch.is_empty());
        assert_eq!(result.report.count_of(ErrorKind::DuplicateKey), 2);
        assert_eq!(result.report.count_of(ErrorKind::NotNumeric), 1);
    }

    #[test]
    fn test_excluded_lines_are_sorted_and_distinct() {
        let rows = vec![
            mesh_row(9, "A1", "-1"),
            mesh_row(2, "B2", "x"),
            mesh_row(5, "A1", "1"),
        ];
        let result = pipeline().run(&rows);
        assert_eq!(result.report.excluded_lines(), vec![2, 5, 9]);
    }

    #[test]
    fn test_report_messages_and_entries() {
        let result = pipeline().run(&[mesh_row(4, "A1", "-3")]);
        assert_eq!(
            result.report.messages(),
            vec!["Error at line 4 for 'mass_surf': mass_surf must be non-negative. Got -3.0"]
        );

        let entries = result.report.entries();
        assert_eq!(entries[0].line, 4);
        assert_eq!(entries[0].kind, ErrorKind::OutOfRange);
        assert_eq!(entries[0].field, "mass_surf");
    }

    #[test]
    fn test_report_serializes_as_entry_list() {
        let result = pipeline().run(&[mesh_row(1, "A1", "x")]);
        let json = serde_json::to_value(&result.report).unwrap();
        assert_eq!(json[0]["kind"], "NotNumeric");
        assert_eq!(json[0]["line"], 1);
    }

    #[test]
    fn test_run_is_repeatable() {
        let rows = vec![
            mesh_row(1, "A1", "1"),
            mesh_row(2, "A1", "2"),
            mesh_row(3, "B2", "-1"),
            mesh_row(4, "C3", "5"),
        ];
        let p = pipeline();
        assert_eq!(p.run(&rows), p.run(&rows));
    }

    #[test]
    fn test_empty_batch() {
        let result = pipeline().run(&[]);
        assert_eq!(result.total_rows, 0);
        assert!(result.batch.is_empty());
        assert!(result.report.is_empty());
    }
}
