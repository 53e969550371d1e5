use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Bag {0} has no instances")]
    EmptyBag(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Point not found: {0}")]
    PointNotFound(String),

    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    /// A distance evaluation inside a parallel query failed; the query has no result.
    #[error("Worker task failed comparing against {key}: {source}")]
    WorkerTaskFailure {
        key: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Metric {metric} failed: {message}")]
    MetricFailure { metric: &'static str, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
