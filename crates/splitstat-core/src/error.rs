// Error types shared by the splitter, the stat calculator and the assembler.

use std::fmt;
use thiserror::Error;

/// Which kind of name failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Stat,
    Split,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Stat => f.write_str("stat"),
            NameKind::Split => f.write_str("split"),
        }
    }
}

/// A stat or split name outside the recognized set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported {kind} `{name}`")]
pub struct UnsupportedError {
    pub kind: NameKind,
    pub name: String,
}

/// A requested subject column cannot be grouped by.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("subject column `{column}` not found in event table")]
    MissingColumn { column: String },

    #[error("`{column}` is a count column and cannot be a subject")]
    CountColumn { column: String },
}

impl SchemaError {
    /// The offending column name.
    pub fn column(&self) -> &str {
        match self {
            SchemaError::MissingColumn { column } | SchemaError::CountColumn { column } => column,
        }
    }
}

/// Failure of a whole assembly, attributed to the manifest line of the
/// offending request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("manifest line {line}: {source}")]
    Unsupported {
        line: usize,
        source: UnsupportedError,
    },

    #[error("manifest line {line}: {source}")]
    Schema { line: usize, source: SchemaError },
}

impl AssemblyError {
    /// Manifest line of the request that failed.
    pub fn line(&self) -> usize {
        match self {
            AssemblyError::Unsupported { line, .. } | AssemblyError::Schema { line, .. } => *line,
        }
    }
}
