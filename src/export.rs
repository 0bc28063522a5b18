use csv::Writer;

use crate::classify::ClassifiedRecord;
use crate::error::PipelineError;
use crate::record::{Dataset, Schema};

pub const RISK_SCORE_COLUMN: &str = "risk_score";
pub const RISK_LEVEL_COLUMN: &str = "risk_level";

/// Columns of the downloadable report, in output order.
pub const REPORT_COLUMNS: [&str; 5] = [
    "tender_id",
    "department",
    "amount",
    RISK_SCORE_COLUMN,
    RISK_LEVEL_COLUMN,
];

/// [`REPORT_COLUMNS`] restricted to what `schema` provides. The two risk
/// columns are always kept.
pub fn report_columns(schema: &Schema) -> Vec<&'static str> {
    REPORT_COLUMNS
        .iter()
        .copied()
        .filter(|&name| {
            name == RISK_SCORE_COLUMN || name == RISK_LEVEL_COLUMN || schema.contains(name)
        })
        .collect()
}

/// Writes `records` as CSV with a header row holding `columns`.
///
/// `risk_score` and `risk_level` come from the classification and take
/// precedence over source columns of the same name; names the record does
/// not have are written as empty cells.
pub fn export(records: &[&ClassifiedRecord], columns: &[&str]) -> Result<Vec<u8>, PipelineError> {
    write_rows(
        columns,
        records
            .iter()
            .map(|record| columns.iter().map(|&column| cell(record, column)).collect()),
    )
}

/// Writes unscored records of `dataset` projected onto `columns`. Names the
/// schema does not have are written as empty cells.
pub fn export_dataset(dataset: &Dataset, columns: &[&str]) -> Result<Vec<u8>, PipelineError> {
    write_rows(
        columns,
        dataset.records().iter().map(|record| {
            columns
                .iter()
                .map(|&column| {
                    record
                        .get(column)
                        .map(|field| field.to_string())
                        .unwrap_or_default()
                })
                .collect()
        }),
    )
}

fn write_rows<I>(columns: &[&str], rows: I) -> Result<Vec<u8>, PipelineError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = Writer::from_writer(vec![]);
    writer
        .write_record(columns)
        .map_err(|err| PipelineError::Export(err.to_string()))?;
    for row in rows {
        writer
            .write_record(&row)
            .map_err(|err| PipelineError::Export(err.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|err| PipelineError::Export(err.to_string()))
}

fn cell(record: &ClassifiedRecord, column: &str) -> String {
    match column {
        RISK_SCORE_COLUMN => record.risk_score().to_string(),
        RISK_LEVEL_COLUMN => record.risk_level.to_string(),
        _ => record
            .scored
            .record
            .get(column)
            .map(|field| field.to_string())
            .unwrap_or_default(),
    }
}
