//! Error types for the anomaly and signal engine

use thiserror::Error;

use crate::series::Column;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnomalyError {
    /// Fewer rows than a rolling window needs. The caller should fetch more history.
    #[error("insufficient data: need {required} rows, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// A detector ran before the step that derives its input column.
    #[error("missing column: {0}")]
    MissingColumn(Column),

    #[error("model fit failed: {0}")]
    ModelFit(String),

    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("column {column} has {actual} rows, series has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

impl AnomalyError {
    pub fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        AnomalyError::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnomalyError>;
