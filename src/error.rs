// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort a split run. Each variant is terminal for the
/// invocation that raised it; the `Display` text is what callers show to the
/// end user, so it carries the offending path or key.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Input file does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Output directory does not exist: {}", .0.display())]
    OutputDirNotFound(PathBuf),

    /// The input exists but cannot be parsed as a workbook.
    #[error("Input file could not be read as a spreadsheet: {}", .path.display())]
    CorruptInput {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    /// The first sheet has no cell range at all.
    #[error("Input sheet is empty or invalid: {}", .0.display())]
    EmptySheet(PathBuf),

    /// The sheet has cells but neither header strategy produced a name list.
    #[error("Could not read a header row from the input sheet: {}", .0.display())]
    UnreadableHeaders(PathBuf),

    #[error("Input file must contain 'project_code' and 'batch_code' columns.")]
    MissingRequiredColumns,

    /// Two different raw codes sanitize to the same path segment. Writing
    /// both would silently merge their rows, so the run stops instead.
    #[error("Sanitized name '{sanitized}' is produced by two different {level} codes: {first} and {second}")]
    NameCollision {
        level: &'static str,
        sanitized: String,
        first: String,
        second: String,
    },

    /// Directory creation or file write failed. `context` names the project
    /// or batch being written when the underlying error hit.
    #[error("{context}: {source}")]
    OutputWrite {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
