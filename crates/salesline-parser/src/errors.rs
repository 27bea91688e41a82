use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A single value that could not be coerced to its column's declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// One-based line number in the source file, header included.
    pub line: usize,
    pub column: &'static str,
    pub value: String,
    pub reason: String,
}

impl RowError {
    pub fn new(
        line: usize,
        column: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            line,
            column,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {} column '{}' value '{}': {}",
            self.line, self.column, self.value, self.reason
        )
    }
}

#[derive(Debug, Error)]
#[error(
    "{invalid_rows} of {total_rows} rows had unparseable values (tolerated fraction {tolerance}); first: {first}"
)]
pub struct ParseError {
    pub invalid_rows: usize,
    pub total_rows: usize,
    pub tolerance: f64,
    pub first: RowError,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input did not contain a header row")]
    MissingHeader,

    #[error("required column(s) missing: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<&'static str> },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid load options: {0}")]
    InvalidOptions(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
