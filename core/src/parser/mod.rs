pub mod error;
pub mod parser;
mod syntax;

// Re-export the parser and rule enum for external use
pub use parser::Rule;
pub use parser::SourceParser;
pub use parser::{DEFAULT_MAX_DEPTH, Parsed, parse, parse_with_max_depth};

pub use error::{ParseError, ParseErrorKind};
pub use syntax::{SourceMap, Span};

#[cfg(test)]
mod parse_test;
