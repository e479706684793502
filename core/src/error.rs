use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Group '{name}' not found")]
    UnknownGroup { name: String },

    #[error("Insufficient data for {test}: need at least {required} samples per arm, got {actual}")]
    InsufficientData {
        test: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Both samples have zero variance; t statistic is undefined")]
    ZeroVariance,

    #[error("Contingency table has a zero marginal; expected frequencies are undefined")]
    DegenerateTable,

    #[error("Distribution error: {0}")]
    Distribution(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
