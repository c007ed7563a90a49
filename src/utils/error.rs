use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid score: {value} (expected half-steps in 0.5..=10.0)")]
    InvalidScore { value: f64 },

    #[error("Confirmation required: expected \"{expected}\"")]
    ConfirmationRequired { expected: String },

    #[error("Configuration error for {field}: {value} ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Item not found: {0}")]
    ItemNotFound(String),
}

impl CatalogError {
    /// True when the failure came from the remote store or the network,
    /// i.e. a read path may fall back to cached/empty data.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            CatalogError::RemoteUnavailable(_) | CatalogError::HttpError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
