/// Error types for the llmload crate.
use thiserror::Error;

/// Application-level errors.
///
/// Request failures during a test run are not represented here; they are
/// captured per-outcome so a run always completes with a structured report.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
