use thiserror::Error;

use crate::api::{Diagnostic, RelatedInfo};
use crate::errors::ErrorKind;
use crate::parser::{SourceMap, Span};
use crate::space::Node;

/// First type error found during verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TypeError {
    pub kind: ErrorKind,
    /// Offending node.
    pub node: Node,
    pub message: String,
    /// Other nodes involved, each with a short note.
    pub related: Vec<(Node, String)>,
}

impl TypeError {
    pub fn new(kind: ErrorKind, node: Node, message: impl Into<String>) -> Self {
        Self {
            kind,
            node,
            message: message.into(),
            related: Vec::new(),
        }
    }

    pub(crate) fn with_related(mut self, node: Node, note: impl Into<String>) -> Self {
        self.related.push((node, note.into()));
        self
    }

    pub(crate) fn syntax(node: Node, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxInvalid, node, message)
    }

    pub(crate) fn mismatch(node: Node, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArityOrTypeMismatch, node, message)
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self, spans: &SourceMap) -> Diagnostic {
        let help = match self.kind {
            ErrorKind::NameUndefined => {
                vec!["Define it with `def` or bind it with `let ... in` first".to_string()]
            }
            ErrorKind::BranchSignatureMismatch => {
                vec!["Both arms of an `if` must consume and produce the same types".to_string()]
            }
            ErrorKind::RecursionWithoutBaseCase => vec![
                "Guard the recursive call with an `if` whose other arm does not recurse"
                    .to_string(),
            ],
            _ => Vec::new(),
        };

        Diagnostic {
            message: self.message.clone(),
            span: spans.span_of(self.node).unwrap_or(Span(0..0)),
            related: self
                .related
                .iter()
                .filter_map(|(node, note)| {
                    Some(RelatedInfo {
                        span: spans.span_of(*node)?,
                        message: note.clone(),
                    })
                })
                .collect(),
            help,
            code: Some(self.kind.code().to_string()),
        }
    }
}
