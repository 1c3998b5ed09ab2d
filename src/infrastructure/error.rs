use crate::domain::error::DomainError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Credential error: {0}")]
    Credential(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("{0}")]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl InfraError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Domain(DomainError::NotFound(_)))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Domain(DomainError::Validation(_)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    Auth,
    Quota,
    Network,
    Malformed,
    Other,
}

/// Failures of the external text-generation service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("API key not set; configure it with `focusmate credential set`")]
    MissingCredential,
    #[error("invalid API key: {0}")]
    Credential(String),
    #[error("API key does not have permission to access this resource: {0}")]
    Permission(String),
    #[error("API quota exceeded: {0}")]
    Quota(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("text generation service error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: GenerationErrorKind,
    pub title: String,
    pub message: String,
}

impl GenerationError {
    pub fn kind(&self) -> GenerationErrorKind {
        match self {
            Self::MissingCredential | Self::Credential(_) | Self::Permission(_) => {
                GenerationErrorKind::Auth
            }
            Self::Quota(_) => GenerationErrorKind::Quota,
            Self::Network(_) => GenerationErrorKind::Network,
            Self::MalformedResponse(_) => GenerationErrorKind::Malformed,
            Self::Other(_) => GenerationErrorKind::Other,
        }
    }

    pub fn notice(&self) -> Notice {
        let (title, message) = match self.kind() {
            GenerationErrorKind::Auth => (
                "Invalid API Key",
                "Check your API key with `focusmate credential set`; make sure it is valid and has credits.",
            ),
            GenerationErrorKind::Quota => (
                "API Quota Exceeded",
                "Your API quota has been exceeded. Check your billing settings.",
            ),
            GenerationErrorKind::Network => (
                "Connection Error",
                "Network error occurred. Check your internet connection and try again.",
            ),
            GenerationErrorKind::Malformed => (
                "AI Service Error",
                "The AI service returned an unexpected response. Showing a locally computed result instead.",
            ),
            GenerationErrorKind::Other => (
                "AI Service Error",
                "Failed to reach the AI service. Showing a locally computed result instead.",
            ),
        };
        Notice {
            kind: self.kind(),
            title: title.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_and_missing_key_map_to_auth() {
        assert_eq!(GenerationError::MissingCredential.kind(), GenerationErrorKind::Auth);
        assert_eq!(
            GenerationError::Permission("403".to_string()).kind(),
            GenerationErrorKind::Auth
        );
    }

    #[test]
    fn notices_are_distinct_per_kind() {
        let quota = GenerationError::Quota("429".to_string()).notice();
        let auth = GenerationError::Credential("401".to_string()).notice();
        let network = GenerationError::Network("refused".to_string()).notice();
        assert_ne!(quota.title, auth.title);
        assert_ne!(network.title, auth.title);
        assert_eq!(quota.kind, GenerationErrorKind::Quota);
    }

    #[test]
    fn domain_errors_are_classified() {
        let error = InfraError::from(DomainError::not_found("task 1"));
        assert!(error.is_not_found());
        assert!(!error.is_validation());
    }
}
