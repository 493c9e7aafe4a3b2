use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalystError {
    /// Lookup of an unregistered table, relationship, concept or metric
    #[error("Not found: {0}")]
    NotFound(String),

    /// No relationship path connects the two tables
    #[error("No join path: {0}")]
    NoPath(String),

    #[error("Database not connected: {0}")]
    NotConnected(String),

    #[error("Invalid analysis request: {0}")]
    InvalidRequest(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Plan assembly left a table pair without joins (only under the reject policy)
    #[error("Partial plan: {0}")]
    PartialPlan(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<sqlx::Error> for AnalystError {
    fn from(err: sqlx::Error) -> Self {
        AnalystError::ExecutionFailed(err.to_string())
    }
}

impl AnalystError {
    /// Prefix the message with `context`, keeping the variant so callers can
    /// still match on the failure kind. IO and JSON errors become `ExecutionFailed`.
    pub fn context(self, context: &str) -> Self {
        let wrap = |msg: String| format!("{}: {}", context, msg);
        match self {
            AnalystError::NotFound(msg) => AnalystError::NotFound(wrap(msg)),
            AnalystError::NoPath(msg) => AnalystError::NoPath(wrap(msg)),
            AnalystError::NotConnected(msg) => AnalystError::NotConnected(wrap(msg)),
            AnalystError::InvalidRequest(msg) => AnalystError::InvalidRequest(wrap(msg)),
            AnalystError::ExecutionFailed(msg) => AnalystError::ExecutionFailed(wrap(msg)),
            AnalystError::PartialPlan(msg) => AnalystError::PartialPlan(wrap(msg)),
            AnalystError::Metadata(msg) => AnalystError::Metadata(wrap(msg)),
            AnalystError::Config(msg) => AnalystError::Config(wrap(msg)),
            other @ (AnalystError::Io(_) | AnalystError::Json(_)) => {
                AnalystError::ExecutionFailed(wrap(other.to_string()))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalystError>;
