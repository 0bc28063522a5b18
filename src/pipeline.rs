//! Entry points used by callers that drive the whole pipeline:
//! ingest → score → classify → aggregate → export.

use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::aggregate::{aggregate, AggregateReport};
use crate::classify::{classify_shared, ClassifiedDataset, ClassifiedRecord, Threshold};
use crate::error::PipelineError;
use crate::export::report_columns;
use crate::record::Dataset;
use crate::scoring::{score_dataset, ScoringStrategy};

pub use crate::export::export;
pub use crate::record::ingest;

/// Which High records go into an exported report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportScope {
    /// The capped headline list, highest score first.
    #[default]
    Ranked,
    /// Every High record, in ingestion order.
    AllHighRisk,
}

/// Scores, classifies and aggregates `dataset`. `dataset` itself is never
/// modified, so a failure leaves the caller's state as it was.
pub fn analyze(
    dataset: &Dataset,
    threshold: Threshold,
    strategy: &dyn ScoringStrategy,
) -> Result<(ClassifiedDataset, AggregateReport), PipelineError> {
    let start = Instant::now();
    let scored = score_dataset(dataset, strategy)?;
    let classified = classify_shared(Arc::new(scored), threshold)?;
    let report = aggregate(&classified);
    info!(
        records = report.total,
        threshold = threshold.value(),
        high = report.high.count,
        elapsed_secs = start.elapsed().as_secs_f64(),
        "analysis complete"
    );
    Ok((classified, report))
}

/// Exports the High records of an analysis with the default report columns.
pub fn export_high_risk(
    classified: &ClassifiedDataset,
    report: &AggregateReport,
    scope: ExportScope,
) -> Result<Vec<u8>, PipelineError> {
    let records: Vec<&ClassifiedRecord> = match scope {
        ExportScope::Ranked => report.ranked.iter().collect(),
        ExportScope::AllHighRisk => classified.high_risk(),
    };
    export(&records, &report_columns(classified.schema()))
}
