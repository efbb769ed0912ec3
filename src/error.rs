use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the load → filter → aggregate → forecast pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The source could not be opened or read.
    #[error("Failed to read data source '{}': {message}", path.display())]
    Load { path: PathBuf, message: String },

    /// A header, date, numeric value, or CSV record could not be interpreted.
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A forecast was requested on fewer daily points than a line needs.
    #[error("Insufficient data for a forecast: need at least {required} daily points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// The current selection contains no records.
    #[error("No data available for selected filter.")]
    EmptyResult,

    /// The least-squares fit was degenerate or produced non-finite values.
    #[error("Numeric error: {0}")]
    Numeric(String),

    /// An export file could not be written.
    #[error("Failed to write export '{}': {message}", path.display())]
    Export { path: PathBuf, message: String },
}

impl PipelineError {
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Load { .. } | PipelineError::Parse { .. } | PipelineError::Export { .. } => 2,
            PipelineError::InsufficientData { .. } | PipelineError::EmptyResult => 3,
            PipelineError::Numeric(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
