use thiserror::Error;

/// Type alias for Result with LabelerError
pub type Result<T> = std::result::Result<T, LabelerError>;

/// Error types for the mailbox labeling pipeline
#[derive(Error, Debug)]
pub enum LabelerError {
    /// Authentication or consent failed
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// The API answered with a non-success status
    #[error("HTTP {status}: {body}")]
    TransportError { status: u16, body: String },

    /// The request never produced an HTTP response (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// A response did not have the expected shape
    #[error("Unexpected response shape: {0}")]
    SchemaError(String),

    /// Classification of a single message failed
    #[error("Classification error: {0}")]
    ClassificationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Writing the outcome report failed
    #[error("Report error: {0}")]
    ReportError(String),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl LabelerError {
    /// True for failures of a remote call, with or without an HTTP status
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LabelerError::TransportError { .. } | LabelerError::NetworkError(_)
        )
    }

    /// HTTP status of a transport error, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            LabelerError::TransportError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LabelerError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            LabelerError::NetworkError(format!("Request timed out: {}", error))
        } else if error.is_decode() {
            LabelerError::SchemaError(format!("Response body is not JSON: {}", error))
        } else {
            LabelerError::NetworkError(error.to_string())
        }
    }
}
