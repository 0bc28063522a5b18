use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateReport, TierSummary};
use crate::record::Provenance;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DataFile {
    pub bucket: String,
    pub key: String,
}

impl DataFile {
    /// Location of the risk report produced for this input file.
    pub fn report_location(&self) -> DataFile {
        DataFile {
            bucket: self.bucket.replace("/input", "/output"),
            key: format!("{}.risk_report.csv", self.key),
        }
    }
}

/// Event accepted by the analysis worker.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Procurement CSV to analyze; the demo dataset is used when absent.
    #[serde(default)]
    pub data: Option<DataFile>,
    #[serde(default)]
    /// Any integer; the range is checked by `util::resolve_threshold`.
    pub threshold: Option<i64>,
    /// Base seed for the random scorer.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Export every High record instead of the ranked headline list.
    #[serde(default)]
    pub export_all: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub position: usize,
    pub tender_id: Option<String>,
    pub risk_score: u8,
}

/// JSON body returned by the analysis worker.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub rows: usize,
    pub columns: usize,
    pub provenance: Provenance,
    pub threshold: u8,
    pub high: TierSummary,
    pub medium: TierSummary,
    pub low: TierSummary,
    pub histogram: Vec<usize>,
    pub high_risk_total: usize,
    pub ranked: Vec<RankedEntry>,
    pub output: Option<DataFile>,
}

impl AnalysisSummary {
    pub fn new(
        report: &AggregateReport,
        columns: usize,
        provenance: Provenance,
        ranked: Vec<RankedEntry>,
        output: Option<DataFile>,
    ) -> Self {
        AnalysisSummary {
            rows: report.total,
            columns,
            provenance,
            threshold: report.threshold.value(),
            high: report.high,
            medium: report.medium,
            low: report.low,
            histogram: report.histogram.to_vec(),
            high_risk_total: report.high_risk_total,
            ranked,
            output,
        }
    }
}
