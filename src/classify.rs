use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::PipelineError;
use crate::record::Schema;
use crate::scoring::{ScoredDataset, ScoredRecord, MAX_SCORE};

/// Scores at or above this value are at least Medium.
pub const MEDIUM_FLOOR: u8 = 40;

pub const DEFAULT_THRESHOLD: u8 = 70;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowest score classified as High.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Threshold(u8);

impl Threshold {
    pub fn new(value: i64) -> Result<Threshold, PipelineError> {
        u8::try_from(value)
            .ok()
            .filter(|&v| v <= MAX_SCORE)
            .map(Threshold)
            .ok_or_else(|| {
                PipelineError::Config(format!("threshold {} is outside [0, {}]", value, MAX_SCORE))
            })
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold(DEFAULT_THRESHOLD)
    }
}

/// Maps a score to its tier. High is checked first, so with a threshold
/// below [`MEDIUM_FLOOR`] the Medium band is empty.
pub fn classify(score: i64, threshold: Threshold) -> Result<RiskLevel, PipelineError> {
    if !(0..=i64::from(MAX_SCORE)).contains(&score) {
        return Err(PipelineError::Classification(score));
    }
    let level = if score >= i64::from(threshold.0) {
        RiskLevel::High
    } else if score >= i64::from(MEDIUM_FLOOR) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };
    Ok(level)
}

/// A scored record and its tier. The record's cells are shared with the
/// scored dataset, so building one never copies field data.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedRecord {
    pub scored: ScoredRecord,
    pub risk_level: RiskLevel,
}

impl ClassifiedRecord {
    pub fn risk_score(&self) -> u8 {
        self.scored.risk_score.value()
    }

    pub fn position(&self) -> usize {
        self.scored.position
    }
}

/// Scored records labelled under one threshold. Built only by
/// [`classify_shared`], which always starts from the scores. Every
/// reclassification of a dataset points at the same [`ScoredDataset`].
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedDataset {
    scored: Arc<ScoredDataset>,
    threshold: Threshold,
    records: Vec<ClassifiedRecord>,
}

impl ClassifiedDataset {
    pub fn records(&self) -> &[ClassifiedRecord] {
        &self.records
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn scored(&self) -> &Arc<ScoredDataset> {
        &self.scored
    }

    pub fn schema(&self) -> &Schema {
        self.scored.schema()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every High record, in ingestion order.
    pub fn high_risk(&self) -> Vec<&ClassifiedRecord> {
        self.records
            .iter()
            .filter(|r| r.risk_level == RiskLevel::High)
            .collect()
    }

    /// Re-derives every level under `threshold`, ignoring the current ones.
    pub fn reclassify(&self, threshold: Threshold) -> Result<ClassifiedDataset, PipelineError> {
        classify_shared(Arc::clone(&self.scored), threshold)
    }
}

/// Classifies a borrowed scored dataset; the result holds its own handle.
pub fn classify_dataset(
    scored: &ScoredDataset,
    threshold: Threshold,
) -> Result<ClassifiedDataset, PipelineError> {
    classify_shared(Arc::new(scored.clone()), threshold)
}

pub fn classify_shared(
    scored: Arc<ScoredDataset>,
    threshold: Threshold,
) -> Result<ClassifiedDataset, PipelineError> {
    let records = scored
        .records()
        .iter()
        .map(|record| {
            let risk_level = classify(record.risk_score.value().into(), threshold)?;
            Ok(ClassifiedRecord {
                scored: record.clone(),
                risk_level,
            })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;
    Ok(ClassifiedDataset {
        scored,
        threshold,
        records,
    })
}
