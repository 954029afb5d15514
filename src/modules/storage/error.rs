use thiserror::Error;

/// Failure talking to, or preparing bytes for, a media host
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage client configuration error: {0}")]
    Config(String),

    #[error("Failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),

    #[error("Request to {provider} failed: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} rejected the request ({status}): {message}")]
    Rejected {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("Unexpected response from {provider}: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },

    #[error("Upload timed out after {0:?}")]
    Timeout(std::time::Duration),
}
