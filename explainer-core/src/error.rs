use thiserror::Error;

use crate::models::FlowState;

/// Errors produced while collecting input, extracting text or talking to the analysis service.
///
/// The `Display` text of each variant is what the user sees in the error notification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExplainError {
    #[error("Please upload a PDF/TXT or paste report text.")]
    NoInputProvided,

    #[error("Unsupported file type. Please use PDF or TXT.")]
    UnsupportedFormat(String),

    #[error("Could not extract text from the input.")]
    EmptyExtraction,

    #[error("Failed to read PDF: {0}")]
    ExtractionFailed(String),

    #[error("{0}")]
    AnalysisFailed(String),

    #[error("Malformed response from analysis service: {0}")]
    MalformedResponse(String),

    #[error("Analysis cannot start while the flow is {0}")]
    FlowNotIdle(FlowState),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ExplainError>;

impl From<lopdf::Error> for ExplainError {
    fn from(err: lopdf::Error) -> Self {
        ExplainError::ExtractionFailed(err.to_string())
    }
}
