//! Error types for query composition and execution.

use flowquery_proto::ValueKind;
use thiserror::Error;

/// Boxed error returned by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while building, merging or executing a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Illegal builder mutation. Raised at the call that attempted it.
    #[error("invalid query usage: {0}")]
    Usage(String),

    /// The value kind cannot take part in a comparison.
    #[error("invalid query usage: {reason} (value kind: {kind})")]
    NonQueryableValue { kind: ValueKind, reason: String },

    /// No serializer is registered for a value kind.
    #[error("no serializer registered for values of kind {0}")]
    UnknownSerializer(ValueKind),

    /// The identity provider failed to resolve a user's groups.
    #[error("identity lookup failed: {0}")]
    Identity(#[source] BoxError),

    /// The execution sink failed.
    #[error("query execution failed: {0}")]
    Sink(#[source] BoxError),

    /// A saved filter could not be decoded.
    #[error("invalid saved filter: {0}")]
    Json(String),

    /// Protocol-level decoding failure.
    #[error(transparent)]
    Protocol(#[from] flowquery_proto::Error),

    /// Invalid engine configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Saved filter not found.
    #[error("filter not found: {0}")]
    FilterNotFound(String),
}

impl QueryError {
    pub(crate) fn usage(message: impl Into<String>) -> Self {
        QueryError::Usage(message.into())
    }

    /// True for errors caused by how the query was built.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            QueryError::Usage(_) | QueryError::NonQueryableValue { .. }
        )
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(e: serde_json::Error) -> Self {
        QueryError::Json(e.to_string())
    }
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_message() {
        let err = QueryError::usage("cannot set or() within 'or' query");
        assert_eq!(
            err.to_string(),
            "invalid query usage: cannot set or() within 'or' query"
        );
        assert!(err.is_usage_error());
    }

    #[test]
    fn test_collaborator_errors_keep_source() {
        let err = QueryError::Identity("ldap unreachable".into());
        assert!(!err.is_usage_error());
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("ldap unreachable"));
    }
}
