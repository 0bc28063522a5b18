//! Procurement fraud-risk pipeline: ingest tabular records, score and
//! classify them, aggregate the results and export the high-risk report.

pub mod aggregate;
pub mod classify;
pub mod demo;
pub mod dto;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod record;
pub mod response;
pub mod scoring;
pub mod session;
pub mod util;

pub use aggregate::{AggregateReport, TierSummary};
pub use classify::{ClassifiedDataset, ClassifiedRecord, RiskLevel, Threshold};
pub use error::{PipelineError, ServiceError};
pub use pipeline::{analyze, export, export_high_risk, ingest, ExportScope};
pub use record::{Dataset, Field, Provenance, Record};
pub use scoring::{ColumnScorer, RandomScorer, RiskScore, ScoringStrategy, StrategyError};
pub use session::{Session, SessionState};
