// Source positions for nodes. The core only deals in node handles; these
// side tables are how embedders get back to file offsets.

use core::ops::Range;

use crate::space::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span(pub Range<usize>);

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self(start..end)
    }
    pub fn str_of<'a>(&self, source: &'a str) -> &'a str {
        &source[self.0.start..self.0.end]
    }
}

impl From<pest::Span<'_>> for Span {
    fn from(s: pest::Span<'_>) -> Self {
        Self(s.start()..s.end())
    }
}

/// Node → span table filled by the reader.
#[derive(Debug, Default, Clone)]
pub struct SourceMap {
    spans: Vec<Option<Span>>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: Node, span: Span) {
        let index = node.index();
        if self.spans.len() <= index {
            self.spans.resize(index + 1, None);
        }
        self.spans[index] = Some(span);
    }

    pub fn span_of(&self, node: Node) -> Option<Span> {
        self.spans.get(node.index()).cloned().flatten()
    }

    /// Line and column (both 1-based) of the node's first character.
    pub fn line_col(&self, source: &str, node: Node) -> Option<(usize, usize)> {
        let span = self.span_of(node)?;
        let before = source.get(..span.0.start)?;
        let line = before.matches('\n').count() + 1;
        let col = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        Some((line, col))
    }
}
