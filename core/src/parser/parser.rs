use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use tracing::debug;

use crate::parser::error::{ParseError, ParseErrorKind, convert_pest_error};
use crate::parser::syntax::{SourceMap, Span};
use crate::space::{Node, NodeSpace};

#[derive(Parser)]
#[grammar = "parser/tacit.pest"]
pub struct SourceParser;

pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Result of loading source text: the root sequence of top-level items plus
/// the span of every node created.
#[derive(Debug)]
pub struct Parsed {
    pub root: Node,
    pub spans: SourceMap,
}

pub fn parse(space: &mut NodeSpace<'_>, source: &str) -> Result<Parsed, ParseError> {
    parse_with_max_depth(space, source, DEFAULT_MAX_DEPTH)
}

pub fn parse_with_max_depth(
    space: &mut NodeSpace<'_>,
    source: &str,
    max_depth: usize,
) -> Result<Parsed, ParseError> {
    let program = SourceParser::parse(Rule::program, source)
        .map_err(|e| convert_pest_error(e, source))?
        .next()
        .ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::UnexpectedToken {
                    expected: "program".to_string(),
                },
                Span(0..0),
            )
        })?;

    let mut loader = Loader {
        space,
        spans: SourceMap::new(),
        max_depth,
    };
    let span = Span::from(program.as_span());
    let items = loader.load_items(program.into_inner(), 0)?;
    let root = loader.space.seq(&items);
    loader.spans.insert(root, span);
    debug!(nodes = loader.space.len(), "source loaded");

    Ok(Parsed {
        root,
        spans: loader.spans,
    })
}

struct Loader<'s, 'a> {
    space: &'s mut NodeSpace<'a>,
    spans: SourceMap,
    max_depth: usize,
}

impl Loader<'_, '_> {
    fn load_items<'i>(
        &mut self,
        pairs: impl Iterator<Item = Pair<'i, Rule>>,
        depth: usize,
    ) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        for pair in pairs {
            if let Some(node) = self.load(pair, depth)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    fn load(&mut self, pair: Pair<'_, Rule>, depth: usize) -> Result<Option<Node>, ParseError> {
        let span = Span::from(pair.as_span());
        let node = match pair.as_rule() {
            Rule::token => self.space.token(pair.as_str(), false),
            Rule::string => {
                let content = pair.into_inner().next().map_or("", |p| p.as_str());
                self.space.token(&unescape(content), true)
            }
            Rule::list => {
                if depth >= self.max_depth {
                    return Err(ParseError::new(
                        ParseErrorKind::MaxDepthExceeded {
                            depth: depth + 1,
                            max_depth: self.max_depth,
                        },
                        span,
                    ));
                }
                let children = self.load_items(pair.into_inner(), depth + 1)?;
                self.space.seq(&children)
            }
            _ => return Ok(None),
        };
        self.spans.insert(node, span);
        Ok(Some(node))
    }
}

fn unescape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
