use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CaseflowError {
    DatabaseError(String),
    StatusTransitionError(String),
    DecisionError(String),
    PayloadError(String),
    InboxError(String),
    TrackingError(String),
    LetterError(String),
    ValidationError(String),
    ConfigurationError(String),
    SchemaError(String),
}

impl fmt::Display for CaseflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseflowError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            CaseflowError::StatusTransitionError(msg) => {
                write!(f, "Status transition error: {msg}")
            }
            CaseflowError::DecisionError(msg) => write!(f, "Decision error: {msg}"),
            CaseflowError::PayloadError(msg) => write!(f, "Payload error: {msg}"),
            CaseflowError::InboxError(msg) => write!(f, "Inbox error: {msg}"),
            CaseflowError::TrackingError(msg) => write!(f, "Tracking error: {msg}"),
            CaseflowError::LetterError(msg) => write!(f, "Letter error: {msg}"),
            CaseflowError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            CaseflowError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            CaseflowError::SchemaError(msg) => write!(f, "Schema error: {msg}"),
        }
    }
}

impl std::error::Error for CaseflowError {}

impl From<sqlx::Error> for CaseflowError {
    fn from(err: sqlx::Error) -> Self {
        CaseflowError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for CaseflowError {
    fn from(err: serde_json::Error) -> Self {
        CaseflowError::ValidationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CaseflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CaseflowError::DatabaseError("connection refused".to_string());
        assert_eq!(err.to_string(), "Database error: connection refused");

        let err = CaseflowError::StatusTransitionError("intake -> complete".to_string());
        assert!(err.to_string().contains("Status transition error"));
    }

    #[test]
    fn test_sqlx_conversion() {
        let err: CaseflowError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, CaseflowError::DatabaseError(_)));
    }
}
