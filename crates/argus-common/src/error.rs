//! Common error types for Argus components.

use thiserror::Error;

/// Common errors across Argus components
#[derive(Debug, Error)]
pub enum ArgusError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Category catalog could not be loaded or is inconsistent
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Invalid input/request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unknown form, filter, or category
    #[error("Not found: {0}")]
    NotFound(String),
}

impl ArgusError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Config(_) => 500,
            Self::Catalog(_) => 500,
            Self::InvalidInput(_) => 400,
            Self::NotFound(_) => 404,
        }
    }
}
