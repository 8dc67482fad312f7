//! End-to-end ingestion: read, validate, decide, persist

use crate::config::{IngestConfig, PersistPolicy};
use crate::error::Result;
use crate::pipeline::{BatchPipeline, BatchResult};
use crate::reader::read_batch;
use crate::record::RawRecord;
use crate::store::MeshSink;
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument, warn};

/// What happened to the validated batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "rows", rename_all = "snake_case")]
pub enum PersistDecision {
    /// The sink committed this many rows
    Persisted(usize),
    /// Rows were rejected and the policy forbids a partial write
    SkippedDueToErrors,
    /// No rows survived validation
    NothingToPersist,
    /// Validation only; no sink was involved
    DryRun,
    /// The sink was asked to write and failed; nothing was committed
    SinkFailed,
}

impl PersistDecision {
    pub fn persisted_rows(&self) -> usize {
        match self {
            PersistDecision::Persisted(n) => *n,
            _ => 0,
        }
    }
}

/// Result of one ingestion run
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub result: BatchResult,
    pub decision: PersistDecision,
}

impl IngestOutcome {
    /// Outcome for a run that validated without writing
    pub fn dry_run(result: BatchResult) -> Self {
        Self {
            result,
            decision: PersistDecision::DryRun,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.result.report.is_empty()
    }

    /// Rows were rejected and nothing reached the sink
    pub fn is_failure(&self) -> bool {
        self.has_errors() && self.decision.persisted_rows() == 0
    }
}

impl Serialize for IngestOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("IngestOutcome", 5)?;
        s.serialize_field("total_rows", &self.result.total_rows)?;
        s.serialize_field("valid_rows", &self.result.batch.len())?;
        s.serialize_field("excluded_rows", &self.result.excluded_rows())?;
        s.serialize_field("errors", &self.result.report)?;
        s.serialize_field("decision", &self.decision)?;
        s.end()
    }
}

/// Read and validate `path` without persisting anything
pub fn validate_file(path: &Path, config: &IngestConfig) -> Result<BatchResult> {
    let records = read_batch(path, config)?;
    Ok(validate_records(&records, config))
}

/// Validate already-loaded records
pub fn validate_records(records: &[RawRecord], config: &IngestConfig) -> BatchResult {
    BatchPipeline::for_mesh(&config.vocabulary).run(records)
}

/// Read, validate and persist the file at `path`
#[instrument(skip_all, fields(path = %path.display(), policy = %config.policy))]
pub fn ingest_file(
    path: &Path,
    config: &IngestConfig,
    sink: &mut dyn MeshSink,
) -> Result<IngestOutcome> {
    let records = read_batch(path, config)?;
    info!(rows = records.len(), "Input read");
    ingest_records(&records, config, sink)
}

/// Validate `records`, then hand the survivors to `sink` if the policy allows
pub fn ingest_records(
    records: &[RawRecord],
    config: &IngestConfig,
    sink: &mut dyn MeshSink,
) -> Result<IngestOutcome> {
    let result = validate_records(records, config);
    let decision = persist_batch(&result, config.policy, sink)?;
    Ok(IngestOutcome { result, decision })
}

/// The decision for `result` when it does not involve the sink.
///
/// `None` means the surviving rows are to be written.
pub fn skip_reason(result: &BatchResult, policy: PersistPolicy) -> Option<PersistDecision> {
    if !result.report.is_empty() && policy == PersistPolicy::AllOrNothing {
        warn!(
            errors = result.report.len(),
            excluded = result.excluded_rows(),
            "Rows rejected, skipping persistence"
        );
        Some(PersistDecision::SkippedDueToErrors)
    } else if result.batch.is_empty() {
        info!("No valid rows to persist");
        Some(PersistDecision::NothingToPersist)
    } else {
        None
    }
}

/// Write the valid rows of `result` to `sink` unless `policy` forbids it.
///
/// Borrows the result so the caller keeps the report when the sink fails.
pub fn persist_batch(
    result: &BatchResult,
    policy: PersistPolicy,
    sink: &mut dyn MeshSink,
) -> Result<PersistDecision> {
    if let Some(decision) = skip_reason(result, policy) {
        return Ok(decision);
    }

    let written = sink.persist(&result.batch)?;
    info!(rows = written, "Batch persisted");
    Ok(PersistDecision::Persisted(written))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::IngestError;
    use crate::pipeline::ValidatedBatch;
    use crate::record::MeshRecord;

    /// Sink that remembers what it was given
    #[derive(Default)]
    struct RecordingSink {
        calls: usize,
        rows: Vec<MeshRecord>,
        fail: bool,
    }

    impl MeshSink for RecordingSink {
        fn persist(&mut self, batch: &ValidatedBatch) -> Result<usize> {
            self.calls += 1;
            if self.fail {
                return Err(IngestError::config("sink unavailable"));
            }
            self.rows.extend(batch.iter().cloned());
            Ok(batch.len())
        }
    }

    fn row(line: usize, codename: &str, mass_surf: &str) -> RawRecord {
        RawRecord::from_pairs(
            line,
            &[
                ("codename", codename),
                ("trame", "T2 Ra1 M2 E2"),
                ("mass_surf", mass_surf),
                ("is_compat_interior_wall", "vrai"),
                ("mesh_height", "2.0"),
                ("mesh_width", "1.0"),
                ("color_names", "white"),
            ],
        )
    }

    #[test]
    fn test_clean_batch_is_persisted() {
        let mut sink = RecordingSink::default();
        let outcome = ingest_records(
            &[row(1, "A1", "1"), row(2, "B2", "2")],
            &IngestConfig::default(),
            &mut sink,
        )
        .unwrap();

        assert_eq!(outcome.decision, PersistDecision::Persisted(2));
        assert_eq!(sink.calls, 1);
        assert!(!outcome.is_failure());
    }

    #[test]
    fn test_all_or_nothing_skips_sink_on_any_error() {
        let mut sink = RecordingSink::default();
        let outcome = ingest_records(
            &[row(1, "A1", "1"), row(2, "B2", "-1")],
            &IngestConfig::default(),
            &mut sink,
        )
        .unwrap();

        assert_eq!(outcome.decision, PersistDecision::SkippedDueToErrors);
        assert_eq!(sink.calls, 0);
        assert_eq!(outcome.result.batch.len(), 1);
        assert!(outcome.is_failure());
    }

    #[test]
    fn test_valid_only_persists_survivors() {
        let config = IngestConfig {
            policy: PersistPolicy::ValidOnly,
            ..IngestConfig::default()
        };
        let mut sink = RecordingSink::default();
        let outcome = ingest_records(
            &[row(1, "A1", "1"), row(2, "B2", "-1"), row(3, "C3", "0")],
            &config,
            &mut sink,
        )
        .unwrap();

        assert_eq!(outcome.decision, PersistDecision::Persisted(2));
        let codes: Vec<_> = sink.rows.iter().map(|r| r.codename.as_str()).collect();
        assert_eq!(codes, vec!["A1", "C3"]);
        assert!(outcome.has_errors());
        assert!(!outcome.is_failure());
    }

    #[test]
    fn test_empty_batch_never_calls_sink() {
        let mut sink = RecordingSink::default();
        let outcome = ingest_records(&[], &IngestConfig::default(), &mut sink).unwrap();
        assert_eq!(outcome.decision, PersistDecision::NothingToPersist);
        assert_eq!(sink.calls, 0);
    }

    #[test]
    fn test_sink_failure_is_fatal() {
        let mut sink = RecordingSink {
            fail: true,
            ..RecordingSink::default()
        };
        let err = ingest_records(&[row(1, "A1", "1")], &IngestConfig::default(), &mut sink)
            .unwrap_err();
        assert!(err.to_string().contains("sink unavailable"));
    }

    #[test]
    fn test_report_survives_sink_failure() {
        let config = IngestConfig {
            policy: PersistPolicy::ValidOnly,
            ..IngestConfig::default()
        };
        let result = validate_records(&[row(1, "A1", "1"), row(2, "B2", "-3")], &config);
        let mut sink = RecordingSink {
            fail: true,
            ..RecordingSink::default()
        };

        let err = persist_batch(&result, config.policy, &mut sink).unwrap_err();
        assert!(err.to_string().contains("sink unavailable"));
        assert_eq!(sink.calls, 1);
        assert_eq!(
            result.report.messages(),
            vec!["Error at line 2 for 'mass_surf': mass_surf must be non-negative. Got -3.0"]
        );
    }

    #[test]
    fn test_skip_reason_leaves_sink_untouched() {
        let result = validate_records(&[row(1, "A1", "x")], &IngestConfig::default());
        assert_eq!(
            skip_reason(&result, PersistPolicy::AllOrNothing),
            Some(PersistDecision::SkippedDueToErrors)
        );
        assert_eq!(
            skip_reason(&result, PersistPolicy::ValidOnly),
            Some(PersistDecision::NothingToPersist)
        );

        let clean = validate_records(&[row(1, "A1", "1")], &IngestConfig::default());
        assert_eq!(skip_reason(&clean, PersistPolicy::AllOrNothing), None);
    }

    #[test]
    fn test_outcome_serializes_summary() {
        let mut sink = RecordingSink::default();
        let outcome = ingest_records(
            &[row(1, "A1", "1"), row(2, "A1", "1")],
            &IngestConfig::default(),
            &mut sink,
        )
        .unwrap();

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["total_rows"], 2);
        assert_eq!(json["valid_rows"], 0);
        assert_eq!(json["errors"].as_array().unwrap().len(), 2);
        assert_eq!(json["decision"]["status"], "skipped_due_to_errors");
    }

    #[test]
    fn test_persisted_decision_serializes_row_count() {
        let json = serde_json::to_value(PersistDecision::Persisted(3)).unwrap();
        assert_eq!(json["status"], "persisted");
        assert_eq!(json["rows"], 3);
    }
}
