//! Error types for chousei-llm

use thiserror::Error;

/// chousei-llm error type
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Gemini API key is required. Set GEMINI_API_KEY environment variable.")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error: {0}")]
    Api(String),

    #[error("Invalid response format from Gemini API")]
    InvalidResponse,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, LlmError>;
