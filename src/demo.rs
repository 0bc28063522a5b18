//! Synthetic procurement data for trying the pipeline without an upload.

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::PipelineError;
use crate::export::export_dataset;
use crate::record::{Dataset, Field};

pub const DEMO_ROWS: usize = 50;

pub const DEPARTMENTS: [&str; 4] = ["Infrastructure", "Health", "Education", "Defense"];

const COLUMNS: [&str; 6] = [
    "tender_id",
    "department",
    "amount",
    "vendor_name",
    "officer_id",
    "payment_date",
];

/// Builds the demo dataset: tenders `T-1000..T-1049` with random department,
/// amount and officer, paid on consecutive days from 2023-01-01.
pub fn generate<R: Rng>(rng: &mut R) -> Result<Dataset, PipelineError> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1)
        .ok_or_else(|| PipelineError::Config(String::from("invalid demo start date")))?;
    let rows = start
        .iter_days()
        .take(DEMO_ROWS)
        .enumerate()
        .map(|(i, payment_date)| {
            let department = DEPARTMENTS.choose(&mut *rng).copied().unwrap_or(DEPARTMENTS[0]);
            vec![
                Field::Text(format!("T-{}", 1000 + i)),
                Field::Text(department.to_string()),
                Field::Integer(rng.gen_range(5_000..500_000)),
                Field::Text(format!("Vendor {}", i)),
                Field::Integer(rng.gen_range(1..10)),
                Field::Date(payment_date),
            ]
        })
        .collect();
    Dataset::from_rows(COLUMNS.iter().map(|c| c.to_string()).collect(), rows)
}

/// Serializes every column of `dataset`, in schema order, as an uploadable
/// CSV file.
pub fn to_csv(dataset: &Dataset) -> Result<Vec<u8>, PipelineError> {
    let columns: Vec<&str> = dataset.schema().columns().iter().map(String::as_str).collect();
    export_dataset(dataset, &columns)
}
