use thiserror::Error;

/// Why a submit did not dispatch a generation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Describe your component before generating")]
    EmptyPrompt,
    #[error("A generation is already in progress")]
    RequestInFlight,
}

/// Failures of the actions offered on a generated result.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Nothing has been generated yet")]
    NoResult,
    #[error("Wait for the current generation to finish")]
    Busy,
    #[error("Failed to copy: {0}")]
    Clipboard(#[source] anyhow::Error),
    #[error("Failed to export: {0}")]
    Export(#[source] anyhow::Error),
    #[error("Failed to open preview: {0}")]
    Preview(#[source] anyhow::Error),
}
