//! Runtime evaluation errors.
//!
//! A verified program fails at run time in a few ways only. A native can
//! report an error. The frame stack can outgrow its limit. The caller's
//! operand stack can fail to match the program's declared inputs.

use thiserror::Error;

use crate::api::Diagnostic;
use crate::errors::ErrorKind;
use crate::parser::{SourceMap, Span};
use crate::space::Node;

/// First error raised while running a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    /// Node being executed, if the failure is tied to one.
    pub node: Option<Node>,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, node: Option<Node>, message: impl Into<String>) -> Self {
        Self {
            kind,
            node,
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(node: Option<Node>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArityOrTypeMismatch, node, message)
    }

    pub(crate) fn resource(node: Option<Node>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResourceExceeded, node, message)
    }

    pub fn to_diagnostic(&self, spans: &SourceMap) -> Diagnostic {
        let help = match self.kind {
            ErrorKind::ResourceExceeded => vec![
                "Move the recursive call into tail position or raise `max_frames`".to_string(),
            ],
            _ => Vec::new(),
        };

        Diagnostic {
            message: self.message.clone(),
            span: self
                .node
                .and_then(|node| spans.span_of(node))
                .unwrap_or(Span(0..0)),
            related: Vec::new(),
            help,
            code: Some(self.kind.code().to_string()),
        }
    }
}
