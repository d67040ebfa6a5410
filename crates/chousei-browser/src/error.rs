//! Error types for chousei-browser

use thiserror::Error;

/// chousei-browser error type
#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Browser initialization failed: {0}")]
    Initialization(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Interaction failed: {0}")]
    Interaction(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Tab error: {0}")]
    TabError(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AutomationError>;
