//! Typed procurement records and the CSV ingestor.

use chrono::NaiveDate;
use csv::ReaderBuilder;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::PipelineError;

/// Columns that only show up in exports from internal finance systems.
pub const INTERNAL_COLUMNS: [&str; 4] = [
    "payment_date",
    "payment_amount",
    "vendor_employees",
    "officer_id",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    Empty,
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

impl Field {
    /// Types a raw cell. A number or date is only recognised when formatting
    /// it back yields the exact same text, so that no cell changes on export.
    pub fn parse(raw: &str) -> Field {
        if raw.is_empty() {
            return Field::Empty;
        }
        if let Ok(n) = raw.parse::<i64>() {
            if n.to_string() == raw {
                return Field::Integer(n);
            }
        }
        if let Ok(x) = raw.parse::<f64>() {
            if x.is_finite() && x.to_string() == raw {
                return Field::Float(x);
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            if date.format(DATE_FORMAT).to_string() == raw {
                return Field::Date(date);
            }
        }
        Field::Text(raw.to_string())
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Field::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Field::Integer(n) => Some(*n as f64),
            Field::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Field::Empty => Ok(()),
            Field::Integer(n) => write!(f, "{}", n),
            Field::Float(x) => write!(f, "{}", x),
            Field::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            Field::Text(s) => f.write_str(s),
        }
    }
}

/// Column names of a dataset in source order.
#[derive(Debug, PartialEq)]
pub struct Schema {
    columns: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl Schema {
    pub fn new(columns: Vec<String>) -> Result<Self, PipelineError> {
        let mut index = FxHashMap::default();
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(PipelineError::Parse(format!(
                    "duplicate column '{}' in header",
                    name
                )));
            }
        }
        Ok(Schema { columns, index })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// One tender or payment row. Cells are shared, so clones are cheap.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    schema: Arc<Schema>,
    values: Arc<[Field]>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Field> {
        self.schema.position(column).map(|i| &self.values[i])
    }

    pub fn values(&self) -> &[Field] {
        &self.values
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Internal,
    Public,
}

impl Provenance {
    pub fn detect(schema: &Schema) -> Provenance {
        let matches = INTERNAL_COLUMNS
            .iter()
            .filter(|name| schema.contains(name))
            .count();
        if matches >= 2 {
            Provenance::Internal
        } else {
            Provenance::Public
        }
    }
}

/// Records sharing one schema, in ingestion order. Cloning a dataset only
/// bumps reference counts.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    schema: Arc<Schema>,
    records: Arc<[Record]>,
    provenance: Provenance,
}

impl Dataset {
    /// Builds a dataset from already-typed rows. Every row must match the
    /// width of `columns`.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Field>>) -> Result<Self, PipelineError> {
        let schema = Arc::new(Schema::new(columns)?);
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, values)| {
                if values.len() != schema.len() {
                    return Err(PipelineError::Parse(format!(
                        "row {} has {} fields, header has {}",
                        i + 1,
                        values.len(),
                        schema.len()
                    )));
                }
                Ok(Record {
                    schema: Arc::clone(&schema),
                    values: values.into(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?
            .into();
        let provenance = Provenance::detect(&schema);
        Ok(Dataset {
            schema,
            records,
            provenance,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parses comma-delimited bytes with a header row into a [`Dataset`].
pub fn ingest(bytes: &[u8]) -> Result<Dataset, PipelineError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);
    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(PipelineError::Parse(String::from("missing header row")));
    }
    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| match i {
            0 => name.trim_start_matches('\u{feff}').to_string(),
            _ => name.to_string(),
        })
        .collect();
    let rows = reader
        .records()
        .map(|row| {
            row.map(|rec| rec.iter().map(Field::parse).collect::<Vec<Field>>())
                .map_err(PipelineError::from)
        })
        .collect::<Result<Vec<Vec<Field>>, _>>()?;
    let dataset = Dataset::from_rows(columns, rows)?;
    debug!(
        rows = dataset.len(),
        columns = dataset.schema().len(),
        provenance = ?dataset.provenance(),
        "ingested dataset"
    );
    Ok(dataset)
}
