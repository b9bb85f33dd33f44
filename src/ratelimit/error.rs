use crate::http::TransportError;
use thiserror::Error;

/// Errors returned by rate-limit operations, each tagged with the project and
/// identifier the caller asked about.
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Also covers an unknown project: the catalog cannot tell the two apart.
    #[error("rate limit '{identifier}' not found in project '{project_id}'")]
    NotFound {
        project_id: String,
        identifier: String,
    },

    #[error("invalid request for rate limit '{identifier}' in project '{project_id}': {message}")]
    Validation {
        project_id: String,
        identifier: String,
        message: String,
    },

    #[error("remote call failed for rate limit '{identifier}' in project '{project_id}': {source}")]
    Remote {
        project_id: String,
        identifier: String,
        #[source]
        source: TransportError,
    },

    #[error("unexpected response for rate limit '{identifier}' in project '{project_id}': {source}")]
    Decode {
        project_id: String,
        identifier: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RateLimitError {
    pub fn code(&self) -> &str {
        match self {
            RateLimitError::NotFound { .. } => "not_found",
            RateLimitError::Validation { .. } => "validation_error",
            RateLimitError::Remote { source, .. } => source.code(),
            RateLimitError::Decode { .. } => "decode_error",
        }
    }

    pub fn retriable(&self) -> bool {
        match self {
            RateLimitError::Remote { source, .. } => source.retriable(),
            _ => false,
        }
    }

    pub fn project_id(&self) -> &str {
        match self {
            RateLimitError::NotFound { project_id, .. }
            | RateLimitError::Validation { project_id, .. }
            | RateLimitError::Remote { project_id, .. }
            | RateLimitError::Decode { project_id, .. } => project_id,
        }
    }

    pub fn identifier(&self) -> &str {
        match self {
            RateLimitError::NotFound { identifier, .. }
            | RateLimitError::Validation { identifier, .. }
            | RateLimitError::Remote { identifier, .. }
            | RateLimitError::Decode { identifier, .. } => identifier,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RateLimitError::NotFound { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Target<'a> {
    pub project_id: &'a str,
    pub identifier: &'a str,
}

impl Target<'_> {
    pub fn not_found(&self) -> RateLimitError {
        RateLimitError::NotFound {
            project_id: self.project_id.to_string(),
            identifier: self.identifier.to_string(),
        }
    }

    pub fn validation(&self, message: impl Into<String>) -> RateLimitError {
        RateLimitError::Validation {
            project_id: self.project_id.to_string(),
            identifier: self.identifier.to_string(),
            message: message.into(),
        }
    }

    pub fn remote(&self, source: TransportError) -> RateLimitError {
        RateLimitError::Remote {
            project_id: self.project_id.to_string(),
            identifier: self.identifier.to_string(),
            source,
        }
    }

    pub fn decode(&self, source: serde_json::Error) -> RateLimitError {
        RateLimitError::Decode {
            project_id: self.project_id.to_string(),
            identifier: self.identifier.to_string(),
            source,
        }
    }
}
