//! Public error types for the tacit API.
//!
//! Internal errors (`ParseError`, `TypeError`, `RuntimeError`) carry node
//! handles; at the API boundary they become [`Diagnostic`]s with source
//! spans so embedders never need the node space to report them.

use core::fmt;

use crate::parser::Span;

/// Public error type for all tacit operations.
#[derive(Debug)]
pub enum Error {
    /// Reading or verification failed.
    ///
    /// Holds a single diagnostic: processing stops at the first error.
    Compilation {
        diagnostics: Vec<Diagnostic>,
        source: String,
    },

    /// Execution failed.
    Runtime { diagnostic: Diagnostic, source: String },

    /// Resource limits exceeded (frame stack).
    ResourceExceeded(String),

    /// Source text could not be obtained.
    Source(String),
}

impl Error {
    /// Diagnostics to render, if the error has any.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Error::Compilation { diagnostics, .. } => diagnostics,
            Error::Runtime { diagnostic, .. } => core::slice::from_ref(diagnostic),
            Error::ResourceExceeded(_) | Error::Source(_) => &[],
        }
    }

    /// Source text the diagnostics point into.
    pub fn source_text(&self) -> Option<&str> {
        match self {
            Error::Compilation { source, .. } | Error::Runtime { source, .. } => Some(source),
            Error::ResourceExceeded(_) | Error::Source(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Compilation { diagnostics, .. } => match diagnostics.first() {
                Some(first) => write!(f, "Compilation failed: {}", first.message),
                None => write!(f, "Compilation failed"),
            },
            Error::Runtime { diagnostic, .. } => write!(f, "Runtime error: {}", diagnostic.message),
            Error::ResourceExceeded(msg) => write!(f, "Resource limit exceeded: {}", msg),
            Error::Source(msg) => write!(f, "Source unreadable: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// An error located in the source, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,

    /// Where the error was detected.
    pub span: Span,

    /// Secondary locations: the arms of a mismatched `if`, the definition a
    /// call refers to.
    pub related: Vec<RelatedInfo>,

    pub help: Vec<String>,

    /// Stable code, `E000`..`E007` or `P001`..`P005`.
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub span: Span,
    pub message: String,
}
