//! Error types for the cppstream-core library.
//!
//! Two kinds of failure exist. Hard errors ([`Error`]) stop a run outright:
//! undecodable input or an unencodable response. Generation problems found
//! while walking descriptors are collected as [`Diagnostic`]s in an
//! [`ErrorLog`] and only turned into [`Error::Generation`] once every file has
//! been emitted.

use std::fmt;
use thiserror::Error;

/// Result type alias for cppstream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all cppstream operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to decode a CodeGeneratorRequest or FileDescriptorSet
    #[error("failed to decode protobuf input: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Failed to encode the CodeGeneratorResponse
    #[error("failed to encode CodeGeneratorResponse: {0}")]
    Encode(#[from] prost::EncodeError),

    /// One or more diagnostics were recorded while generating headers
    #[error("header generation failed with {} error(s)", .0.len())]
    Generation(ErrorLog),

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the recorded diagnostics if this is a generation failure
    pub fn diagnostics(&self) -> Option<&ErrorLog> {
        match self {
            Self::Generation(log) => Some(log),
            _ => None,
        }
    }
}

/// A single problem found while emitting a header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Source `.proto` file the problem belongs to
    pub file: String,
    /// Dotted path of the offending element (e.g. `pkg.Message.field`)
    pub element: String,
    /// Human-readable description
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.file, self.element, self.message)
    }
}

/// Accumulates diagnostics for a single generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorLog {
    /// Creates an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic
    pub fn add(
        &mut self,
        file: impl Into<String>,
        element: impl Into<String>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            file: file.into(),
            element: element.into(),
            message: message.into(),
        };
        tracing::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Returns true if any diagnostic was recorded
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Number of recorded diagnostics
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns true if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Iterates over the recorded diagnostics in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// Converts the log into `Err(Error::Generation)` when non-empty
    pub fn into_result(self) -> Result<()> {
        if self.has_errors() {
            Err(Error::Generation(self))
        } else {
            Ok(())
        }
    }
}

impl<'a> IntoIterator for &'a ErrorLog {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
