//! Pluggable risk scoring.
//!
//! A [`ScoringStrategy`] maps one record to an integer score. The scorer
//! applies it to every record of a dataset in parallel and rejects any value
//! outside [0, 100]; it never clamps.

use rand::prelude::*;
use rayon::prelude::*;
use std::error::Error;
use std::fmt;
use tracing::debug;

use crate::error::PipelineError;
use crate::record::{Dataset, Field, Record, Schema};

pub const MAX_SCORE: u8 = 100;

/// Error a strategy may return for a single record.
pub type StrategyError = Box<dyn Error + Send + Sync>;

/// A risk score in [0, 100].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RiskScore(u8);

impl RiskScore {
    pub fn new(value: i64) -> Option<RiskScore> {
        u8::try_from(value)
            .ok()
            .filter(|&v| v <= MAX_SCORE)
            .map(RiskScore)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Computes the risk score of a record.
///
/// Implementations are shared across worker threads, so a call must not
/// depend on any other call. `position` is the record's ingestion index.
pub trait ScoringStrategy: Send + Sync {
    fn score(&self, position: usize, record: &Record) -> Result<i64, StrategyError>;
}

impl<F> ScoringStrategy for F
where
    F: Fn(usize, &Record) -> Result<i64, StrategyError> + Send + Sync,
{
    fn score(&self, position: usize, record: &Record) -> Result<i64, StrategyError> {
        self(position, record)
    }
}

/// Placeholder scorer drawing a uniform integer in `0..100` per record.
///
/// Every record gets its own generator derived from the base seed and its
/// position, so the draw does not depend on thread scheduling.
#[derive(Clone, Debug)]
pub struct RandomScorer {
    base_seed: u64,
}

impl RandomScorer {
    pub fn seeded(seed: u64) -> Self {
        RandomScorer { base_seed: seed }
    }

    pub fn from_entropy() -> Self {
        RandomScorer {
            base_seed: StdRng::from_entropy().gen(),
        }
    }
}

impl Default for RandomScorer {
    fn default() -> Self {
        RandomScorer::from_entropy()
    }
}

impl ScoringStrategy for RandomScorer {
    fn score(&self, position: usize, _record: &Record) -> Result<i64, StrategyError> {
        let seed = self
            .base_seed
            .wrapping_add((position as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let mut rng = StdRng::seed_from_u64(seed);
        Ok(rng.gen_range(0..i64::from(MAX_SCORE)))
    }
}

/// Reads a score that is already stored in a column, e.g. `risk_score` of
/// a previously exported report.
#[derive(Clone, Debug)]
pub struct ColumnScorer {
    column: String,
}

impl ColumnScorer {
    pub fn new(column: impl Into<String>) -> Self {
        ColumnScorer {
            column: column.into(),
        }
    }
}

impl ScoringStrategy for ColumnScorer {
    fn score(&self, _position: usize, record: &Record) -> Result<i64, StrategyError> {
        match record.get(&self.column) {
            Some(Field::Integer(n)) => Ok(*n),
            Some(other) => Err(format!(
                "column '{}' holds '{}', not an integer",
                self.column, other
            )
            .into()),
            None => Err(format!("column '{}' not found", self.column).into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoredRecord {
    pub position: usize,
    pub record: Record,
    pub risk_score: RiskScore,
}

/// Output of [`score_dataset`]; owns a copy of the source records so the
/// ingested dataset stays untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredDataset {
    source: Dataset,
    records: Vec<ScoredRecord>,
}

impl ScoredDataset {
    pub fn records(&self) -> &[ScoredRecord] {
        &self.records
    }

    pub fn schema(&self) -> &Schema {
        self.source.schema()
    }

    pub fn source(&self) -> &Dataset {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Scores every record of `dataset` with `strategy`, preserving order.
///
/// The first failing record (lowest position) aborts the whole run with
/// [`PipelineError::Scoring`].
pub fn score_dataset(
    dataset: &Dataset,
    strategy: &dyn ScoringStrategy,
) -> Result<ScoredDataset, PipelineError> {
    let outcomes: Vec<Result<ScoredRecord, PipelineError>> = dataset
        .records()
        .par_iter()
        .enumerate()
        .map(|(position, record)| score_record(strategy, position, record))
        .collect();
    let records = outcomes.into_iter().collect::<Result<Vec<_>, _>>()?;
    debug!(records = records.len(), "scored dataset");
    Ok(ScoredDataset {
        source: dataset.clone(),
        records,
    })
}

fn score_record(
    strategy: &dyn ScoringStrategy,
    position: usize,
    record: &Record,
) -> Result<ScoredRecord, PipelineError> {
    let raw = strategy
        .score(position, record)
        .map_err(|err| PipelineError::Scoring {
            position,
            reason: err.to_string(),
        })?;
    let risk_score = RiskScore::new(raw).ok_or_else(|| PipelineError::Scoring {
        position,
        reason: format!("score {} is outside [0, {}]", raw, MAX_SCORE),
    })?;
    Ok(ScoredRecord {
        position,
        record: record.clone(),
        risk_score,
    })
}
