//! Error types for matching operations.
//!
//! The taxonomy is small: a run is either cancelled, rejected
//! up front because it was configured wrongly, or it succeeds. Metric
//! failures never escape a run; see [`MetricError`].

use thiserror::Error;

/// Result type alias for matching operations.
pub type Result<T> = std::result::Result<T, MatchError>;

/// Errors surfaced by the matching engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// The caller cancelled the run while it was scoring edges.
    /// Partial results are discarded.
    #[error("matching was cancelled")]
    Cancelled,

    /// Programmer error: bad filter bounds, malformed metric sequence, etc.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl MatchError {
    pub fn invalid(message: impl Into<String>) -> Self {
        MatchError::InvalidArgument(message.into())
    }
}

/// Failure while deriving a single property for comparison.
///
/// Swallowed by the cross-property metric, which treats the affected key
/// as contributing nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    #[error("property is unavailable: {0}")]
    Unavailable(String),

    #[error("values of kind {left} and {right} cannot be compared")]
    Incomparable {
        left: &'static str,
        right: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(MatchError::Cancelled.to_string(), "matching was cancelled");
        assert_eq!(
            MatchError::invalid("max season must be positive").to_string(),
            "invalid argument: max season must be positive"
        );
        let err = MetricError::Incomparable {
            left: "text",
            right: "date",
        };
        assert_eq!(err.to_string(), "values of kind text and date cannot be compared");
    }
}
