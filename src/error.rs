use thiserror::Error;

use crate::app::rules::Finding;

#[derive(Error, Debug)]
pub enum BackofficeError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database error: {message}")]
    Database { message: String },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("no active company: pass the X-Company-Id header or company_id cookie")]
    TenantRequired,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("entry rejected with {} finding(s)", findings.len())]
    Rejected { findings: Vec<Finding> },
}

pub type Result<T> = std::result::Result<T, BackofficeError>;
