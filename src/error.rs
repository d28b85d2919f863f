use thiserror::Error;

/// Failures raised by the browser layer while driving the form.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("JavaScript error: {0}")]
    Js(String),

    #[error("CDP error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
}

/// Failures reading the echoed JSON off the result page.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no response content found")]
    NoContent,

    #[error("failed to parse response JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unexpected response structure: expected a JSON object, found {0}")]
    UnexpectedStructure(&'static str),
}

/// Error surface of [`crate::submit_order`].
///
/// `MissingField` is raised before any browser work starts. Everything that
/// goes wrong afterwards shares the "Failed to submit order" prefix, with the
/// stage still visible through the variant.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Failed to submit order: {0}")]
    Submission(#[from] BrowserError),

    #[error("Failed to submit order: {0}")]
    Extraction(#[from] ExtractionError),
}

impl OrderError {
    pub fn is_missing_field(&self) -> bool {
        matches!(self, Self::MissingField(_))
    }

    pub fn is_submission(&self) -> bool {
        matches!(self, Self::Submission(_))
    }

    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::Extraction(_))
    }
}

pub type Result<T> = std::result::Result<T, BrowserError>;
