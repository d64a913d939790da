//! Error types for the query pipeline and dataset loading.

use thiserror::Error;

/// Failure surfaced by [`crate::Dispatcher::answer`].
///
/// Variants are kept distinct so the serving layer can pick a response status
/// per failure class.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The query matched an intent but no data satisfies it.
    #[error("{0}")]
    NotFound(String),

    /// The query is empty or a captured parameter could not be parsed.
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// The weather provider failed or answered with a non-success status.
    #[error("Weather API error: {0}")]
    UpstreamError(String),

    /// The generative model failed or returned unusable output.
    #[error("Generative model error: {0}")]
    GenerativeError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl QueryError {
    /// Message safe to hand back to a caller. Internal details stay in logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::InternalError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Short label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::MalformedQuery(_) => "malformed_query",
            Self::UpstreamError(_) => "upstream",
            Self::GenerativeError(_) => "generative",
            Self::InternalError(_) => "internal",
        }
    }
}

/// Failure while loading the cleaned dataset or running the ETL transform.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset file not found: {0}. Run the `etl` binary first.")]
    Missing(String),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_error_is_not_leaked() {
        let err = QueryError::InternalError("db pool exhausted at 0x7f".into());
        assert_eq!(err.public_message(), "Internal server error");
        assert!(err.to_string().contains("0x7f"));
    }

    #[test]
    fn test_public_message_keeps_not_found_text() {
        let err = QueryError::NotFound("Information not available!".into());
        assert_eq!(err.public_message(), "Information not available!");
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_upstream_message_prefix() {
        let err = QueryError::UpstreamError("HTTP 400".into());
        assert_eq!(err.public_message(), "Weather API error: HTTP 400");
    }
}
