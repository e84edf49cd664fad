use thiserror::Error;

/// Main error type for the Harvest Q service
#[derive(Error, Debug)]
pub enum HarvestError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Tool dispatch errors
    #[error("invalid args for {tool}: {reason}")]
    InvalidArgs { tool: String, reason: String },

    #[error("{tool} failed: {reason}")]
    ToolFailed { tool: String, reason: String },

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Listing rejected: {0}")]
    Listing(#[from] ListingError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl HarvestError {
    /// Errors caused by the caller's input rather than by the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            HarvestError::InvalidArgs { .. }
                | HarvestError::Validation(_)
                | HarvestError::Listing(_)
        )
    }
}

/// Result type alias for HarvestError
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Per-field errors from the post-listing form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    #[error("qty: {0}")]
    Quantity(String),

    #[error("price: {0}")]
    Price(String),

    #[error("qty: {qty}; price: {price}")]
    Both { qty: String, price: String },
}
