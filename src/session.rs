//! Per-user analysis session: `NoData → Ingested → Analyzed`.
//!
//! The session is an ordinary value owned by the caller. Every operation
//! either moves it to its next state or returns an error and leaves it as it
//! was.

use tracing::{info, warn};

use crate::aggregate::{aggregate, AggregateReport};
use crate::classify::{ClassifiedDataset, Threshold};
use crate::error::PipelineError;
use crate::pipeline::{analyze, export_high_risk, ExportScope};
use crate::record::{ingest, Dataset};
use crate::scoring::ScoringStrategy;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum SessionState {
    #[default]
    NoData,
    Ingested(Dataset),
    Analyzed {
        classified: ClassifiedDataset,
        report: AggregateReport,
    },
}

#[derive(Clone, Debug, Default)]
pub struct Session {
    state: SessionState,
    threshold: Threshold,
}

impl Session {
    pub fn new(threshold: Threshold) -> Self {
        Session {
            state: SessionState::NoData,
            threshold,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match &self.state {
            SessionState::NoData => None,
            SessionState::Ingested(dataset) => Some(dataset),
            SessionState::Analyzed { classified, .. } => Some(classified.scored().source()),
        }
    }

    pub fn classified(&self) -> Option<&ClassifiedDataset> {
        match &self.state {
            SessionState::Analyzed { classified, .. } => Some(classified),
            _ => None,
        }
    }

    pub fn report(&self) -> Option<&AggregateReport> {
        match &self.state {
            SessionState::Analyzed { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Replaces the current data, discarding any previous analysis.
    pub fn ingest(&mut self, bytes: &[u8]) -> Result<(), PipelineError> {
        let dataset = ingest(bytes).inspect_err(|err| warn!(%err, "ingest rejected"))?;
        self.load(dataset);
        Ok(())
    }

    /// Same as [`Session::ingest`] for a dataset built in memory.
    pub fn load(&mut self, dataset: Dataset) {
        info!(
            rows = dataset.len(),
            provenance = ?dataset.provenance(),
            "dataset loaded"
        );
        self.state = SessionState::Ingested(dataset);
    }

    /// Scores and classifies the current data. Running it again re-scores.
    pub fn analyze(&mut self, strategy: &dyn ScoringStrategy) -> Result<(), PipelineError> {
        let dataset = self
            .dataset()
            .ok_or_else(|| PipelineError::Config(String::from("no dataset has been ingested")))?;
        let (classified, report) = analyze(dataset, self.threshold, strategy)
            .inspect_err(|err| warn!(%err, "analysis aborted"))?;
        self.state = SessionState::Analyzed { classified, report };
        Ok(())
    }

    /// Changes the threshold. An analyzed session is re-classified from its
    /// stored scores; nothing is re-scored.
    pub fn set_threshold(&mut self, threshold: Threshold) -> Result<(), PipelineError> {
        if let SessionState::Analyzed { classified, .. } = &self.state {
            let classified = classified.reclassify(threshold)?;
            let report = aggregate(&classified);
            self.state = SessionState::Analyzed { classified, report };
        }
        self.threshold = threshold;
        Ok(())
    }

    pub fn export_report(&self, scope: ExportScope) -> Result<Vec<u8>, PipelineError> {
        match &self.state {
            SessionState::Analyzed { classified, report } => {
                export_high_risk(classified, report, scope)
            }
            _ => Err(PipelineError::Config(String::from(
                "run the analysis before exporting a report",
            ))),
        }
    }
}
