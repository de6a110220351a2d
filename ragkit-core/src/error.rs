//! Error types for the `ragkit` crates.

use thiserror::Error;

/// Errors that can occur in retrieval and generation operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The caller supplied an invalid query (empty text without an
    /// embedding, or a non-positive result count).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The generation request was malformed and cannot succeed on retry.
    #[error("invalid generation request: {0}")]
    InvalidRequest(String),

    /// A remote component rejected the call due to rate limiting.
    #[error("rate limited ({component}): {message}")]
    RateLimited {
        /// The backend or client that produced the error.
        component: String,
        /// A description of the failure.
        message: String,
    },

    /// A transient network failure, including per-call timeouts.
    #[error("transient network error ({component}): {message}")]
    TransientNetwork {
        /// The backend or client that produced the error.
        component: String,
        /// A description of the failure.
        message: String,
    },

    /// Credentials were rejected. Retrying cannot fix bad credentials.
    #[error("authentication failed ({component}): {message}")]
    AuthenticationFailed {
        /// The backend or client that produced the error.
        component: String,
        /// A description of the failure.
        message: String,
    },

    /// Every configured retrieval backend failed after retries and fallbacks.
    #[error("all retrieval backends unavailable: {0}")]
    BackendUnavailable(String),

    /// A configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The retrieval stage of a pipeline invocation failed.
    #[error("retrieval failed: {source}")]
    RetrievalFailed {
        /// The underlying error.
        #[source]
        source: Box<RagError>,
    },

    /// The generation stage of a pipeline invocation failed.
    #[error("generation failed: {source}")]
    GenerationFailed {
        /// The underlying error.
        #[source]
        source: Box<RagError>,
    },
}

/// Classification of a [`RagError`] used by retry policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad caller input.
    InvalidQuery,
    /// Malformed generation request.
    InvalidRequest,
    /// Rate limited by a remote component.
    RateLimited,
    /// Transient network failure or timeout.
    TransientNetwork,
    /// Rejected credentials.
    AuthenticationFailed,
    /// All retrieval backends exhausted.
    BackendUnavailable,
    /// Configuration validation failure.
    Config,
    /// Retrieval stage failure (pipeline-level wrapper).
    RetrievalFailed,
    /// Generation stage failure (pipeline-level wrapper).
    GenerationFailed,
}

impl ErrorKind {
    /// Whether errors of this kind can succeed on a later attempt.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::TransientNetwork)
    }
}

impl RagError {
    /// Classify this error for retry-policy decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQuery(_) => ErrorKind::InvalidQuery,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::TransientNetwork { .. } => ErrorKind::TransientNetwork,
            Self::AuthenticationFailed { .. } => ErrorKind::AuthenticationFailed,
            Self::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            Self::Config(_) => ErrorKind::Config,
            Self::RetrievalFailed { .. } => ErrorKind::RetrievalFailed,
            Self::GenerationFailed { .. } => ErrorKind::GenerationFailed,
        }
    }

    /// Whether this error can succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// A convenience result type for ragkit operations.
pub type Result<T> = std::result::Result<T, RagError>;
