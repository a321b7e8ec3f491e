use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when a
/// breach dump is read, flattened, or written out as a workbook.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the input is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when the JSON does not have the `{group: [record, ...]}` shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Raised when asked to write a table without any columns.
    #[error("table has no columns to write")]
    EmptyTable,

    /// Raised when the requested worksheet name is blank.
    #[error("invalid sheet name '{0}'")]
    InvalidSheetName(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ToolError {
    /// Whether the failure is caused by the content of the input document
    /// rather than by the environment.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ToolError::Json(_) | ToolError::InvalidInput(_) | ToolError::EmptyTable
        )
    }
}
