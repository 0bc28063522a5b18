use crate::response::Status;
use serde::{Deserialize, Serialize};
use serde_json;
use std::error;
use std::fmt;
use thiserror::Error;

/// Failure of one pipeline stage. None of these are fatal: the stage that
/// failed leaves its input untouched, so the caller can fix the input or the
/// configuration and retry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("unable to parse tabular input: {0}")]
    Parse(String),

    #[error("scoring failed for record {position}: {reason}")]
    Scoring { position: usize, reason: String },

    #[error("score {0} is outside [0, 100] and cannot be classified")]
    Classification(i64),

    #[error("no records to aggregate: upload a dataset with at least one row")]
    Aggregation,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unable to write report: {0}")]
    Export(String),
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Parse(err.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceError {
    pub msg: String,
    pub status: Status,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let json = serde_json::to_string_pretty(&self).map_err(|_| fmt::Error)?;
        write!(f, "{}", json)
    }
}

impl error::Error for ServiceError {}

impl ServiceError {
    pub fn bad_request<T: std::fmt::Display>(msg: T) -> ServiceError {
        ServiceError {
            msg: msg.to_string(),
            status: Status::BadRequest,
        }
    }

    pub fn internal_server_error<T: std::fmt::Display>(msg: T) -> ServiceError {
        ServiceError {
            msg: msg.to_string(),
            status: Status::InternalServerError,
        }
    }
}

impl From<PipelineError> for ServiceError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Parse(_) | PipelineError::Aggregation | PipelineError::Config(_) => {
                ServiceError::bad_request(err)
            }
            PipelineError::Scoring { .. }
            | PipelineError::Classification(_)
            | PipelineError::Export(_) => ServiceError::internal_server_error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_failures_map_to_bad_request() {
        let err = ServiceError::from(PipelineError::Parse("row 3 has 2 fields".into()));
        assert!(matches!(err.status, Status::BadRequest));
        assert!(err.msg.contains("row 3 has 2 fields"));

        let err = ServiceError::from(PipelineError::Aggregation);
        assert!(matches!(err.status, Status::BadRequest));
    }

    #[test]
    fn contract_violations_map_to_internal_error() {
        let err = ServiceError::from(PipelineError::Classification(140));
        assert!(matches!(err.status, Status::InternalServerError));
        assert_eq!(err.msg, "score 140 is outside [0, 100] and cannot be classified");
    }

    #[test]
    fn display_is_json() {
        let err = ServiceError::bad_request("nope");
        let value: serde_json::Value = serde_json::from_str(&err.to_string()).unwrap();
        assert_eq!(value["msg"], "nope");
        assert_eq!(value["status"], 400);
    }
}
