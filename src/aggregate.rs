//! Summary metrics over a classified dataset.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{ClassifiedDataset, ClassifiedRecord, RiskLevel, Threshold};
use crate::error::PipelineError;
use crate::scoring::MAX_SCORE;

pub const HISTOGRAM_BUCKETS: usize = 20;

/// Length of the headline high-risk list.
pub const HIGH_RISK_CAP: usize = 20;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TierSummary {
    pub count: usize,
    pub percentage: f64,
}

impl TierSummary {
    fn of(count: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / total as f64
        };
        TierSummary { count, percentage }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AggregateReport {
    pub total: usize,
    pub threshold: Threshold,
    pub high: TierSummary,
    pub medium: TierSummary,
    pub low: TierSummary,
    /// Counts of scores in `[5i, 5i + 5)`; the last bucket also holds 100.
    pub histogram: [usize; HISTOGRAM_BUCKETS],
    /// High records by descending score, ties in ingestion order, capped at
    /// [`HIGH_RISK_CAP`].
    pub ranked: Vec<ClassifiedRecord>,
    /// Number of High records before the cap.
    pub high_risk_total: usize,
}

impl AggregateReport {
    pub fn tier(&self, level: RiskLevel) -> TierSummary {
        match level {
            RiskLevel::High => self.high,
            RiskLevel::Medium => self.medium,
            RiskLevel::Low => self.low,
        }
    }
}

pub fn histogram_bucket(score: u8) -> usize {
    let width = (usize::from(MAX_SCORE) / HISTOGRAM_BUCKETS).max(1);
    (usize::from(score) / width).min(HISTOGRAM_BUCKETS - 1)
}

/// Aggregates `dataset`. An empty dataset yields a report with zero counts
/// and 0% for every tier.
pub fn aggregate(dataset: &ClassifiedDataset) -> AggregateReport {
    let records = dataset.records();
    let ((counts, histogram), (ranked, high_risk_total)) = rayon::join(
        || rayon::join(|| tally(records), || histogram(records)),
        || rank_high_risk(records, HIGH_RISK_CAP),
    );
    let total = records.len();
    let [low, medium, high] = counts;
    debug!(total, high, medium, low, "aggregated dataset");
    AggregateReport {
        total,
        threshold: dataset.threshold(),
        high: TierSummary::of(high, total),
        medium: TierSummary::of(medium, total),
        low: TierSummary::of(low, total),
        histogram,
        ranked,
        high_risk_total,
    }
}

/// Like [`aggregate`], but treats an empty dataset as an error.
pub fn aggregate_non_empty(dataset: &ClassifiedDataset) -> Result<AggregateReport, PipelineError> {
    if dataset.is_empty() {
        return Err(PipelineError::Aggregation);
    }
    Ok(aggregate(dataset))
}

fn tally(records: &[ClassifiedRecord]) -> [usize; 3] {
    records.iter().fold([0; 3], |mut counts, record| {
        let slot = match record.risk_level {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
        };
        counts[slot] += 1;
        counts
    })
}

fn histogram(records: &[ClassifiedRecord]) -> [usize; HISTOGRAM_BUCKETS] {
    let mut buckets = [0; HISTOGRAM_BUCKETS];
    for record in records {
        buckets[histogram_bucket(record.risk_score())] += 1;
    }
    buckets
}

fn rank_high_risk(records: &[ClassifiedRecord], cap: usize) -> (Vec<ClassifiedRecord>, usize) {
    let mut high: Vec<&ClassifiedRecord> = records
        .iter()
        .filter(|r| r.risk_level == RiskLevel::High)
        .collect();
    let total = high.len();
    // sort_by is stable: equal scores keep ingestion order
    high.sort_by(|a, b| b.risk_score().cmp(&a.risk_score()));
    let ranked = high.into_iter().take(cap).cloned().collect();
    (ranked, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_dataset;
    use crate::record::{ingest, Record};
    use crate::scoring::{score_dataset, StrategyError};

    fn classified(scores: &[i64], threshold: i64) -> ClassifiedDataset {
        let mut csv = String::from("tender_id\n");
        for i in 0..scores.len() {
            csv.push_str(&format!("T-{}\n", i));
        }
        let dataset = ingest(csv.as_bytes()).unwrap();
        let lookup = |position: usize, _: &Record| -> Result<i64, StrategyError> {
            Ok(scores[position])
        };
        let scored = score_dataset(&dataset, &lookup).unwrap();
        classify_dataset(&scored, Threshold::new(threshold).unwrap()).unwrap()
    }

    #[test]
    fn counts_and_percentages() {
        let report = aggregate(&classified(&[10, 45, 70, 90, 20], 70));
        assert_eq!(report.total, 5);
        assert_eq!(report.high, TierSummary { count: 2, percentage: 40.0 });
        assert_eq!(report.medium, TierSummary { count: 1, percentage: 20.0 });
        assert_eq!(report.low, TierSummary { count: 2, percentage: 40.0 });
        assert_eq!(report.high_risk_total, 2);
    }

    #[test]
    fn percentages_sum_to_hundred() {
        let report = aggregate(&classified(&[1, 2, 41, 42, 43, 99, 100], 60));
        let sum = report.high.percentage + report.medium.percentage + report.low.percentage;
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_dataset_reports_zero_percent() {
        let report = aggregate(&classified(&[], 70));
        assert_eq!(report.total, 0);
        for level in [RiskLevel::High, RiskLevel::Medium, RiskLevel::Low] {
            assert_eq!(report.tier(level), TierSummary { count: 0, percentage: 0.0 });
        }
        assert_eq!(report.histogram, [0; HISTOGRAM_BUCKETS]);
        assert!(report.ranked.is_empty());
    }

    #[test]
    fn empty_dataset_is_an_error_when_rows_are_required() {
        assert_eq!(
            aggregate_non_empty(&classified(&[], 70)),
            Err(PipelineError::Aggregation)
        );
        assert!(aggregate_non_empty(&classified(&[5], 70)).is_ok());
    }

    #[test]
    fn histogram_buckets() {
        assert_eq!(histogram_bucket(0), 0);
        assert_eq!(histogram_bucket(4), 0);
        assert_eq!(histogram_bucket(5), 1);
        assert_eq!(histogram_bucket(99), 19);
        assert_eq!(histogram_bucket(100), 19);

        let report = aggregate(&classified(&[0, 3, 5, 50, 100, 95], 70));
        assert_eq!(report.histogram[0], 2);
        assert_eq!(report.histogram[1], 1);
        assert_eq!(report.histogram[10], 1);
        assert_eq!(report.histogram[19], 2);
        assert_eq!(report.histogram.iter().sum::<usize>(), 6);
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let report = aggregate(&classified(&[80, 95, 80, 10, 95, 71], 70));
        let ranked: Vec<(usize, u8)> = report
            .ranked
            .iter()
            .map(|r| (r.position(), r.risk_score()))
            .collect();
        assert_eq!(ranked, vec![(1, 95), (4, 95), (0, 80), (2, 80), (5, 71)]);
    }

    #[test]
    fn ranking_is_capped_but_total_is_not() {
        let scores: Vec<i64> = (0..30).map(|i| 70 + (i % 31)).collect();
        let dataset = classified(&scores, 70);
        let report = aggregate(&dataset);
        assert_eq!(report.ranked.len(), HIGH_RISK_CAP);
        assert_eq!(report.high_risk_total, 30);
        assert_eq!(dataset.high_risk().len(), 30);
        assert_eq!(report.ranked[0].risk_score(), 99);
    }
}
