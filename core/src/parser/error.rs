use crate::api::Diagnostic;
use crate::parser::{Rule, Span};

/// Parser error with location
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

/// Specific kinds of parse errors
#[derive(Debug, Clone)]
pub enum ParseErrorKind {
    /// Unexpected input where something else was required
    UnexpectedToken { expected: String },
    /// A `(` never closed
    UnclosedDelimiter,
    /// A `)` with no matching `(`
    UnmatchedDelimiter,
    /// A string literal missing its closing quote
    UnterminatedString,
    /// Maximum nesting depth exceeded
    MaxDepthExceeded { depth: usize, max_depth: usize },
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (message, code, help) = match &self.kind {
            ParseErrorKind::UnexpectedToken { expected } => {
                (format!("Expected {}", expected), "P001", vec![])
            }
            ParseErrorKind::UnclosedDelimiter => (
                "Unclosed delimiter '('".to_string(),
                "P002",
                vec!["Add the missing ')'".to_string()],
            ),
            ParseErrorKind::UnmatchedDelimiter => (
                "Unmatched delimiter ')'".to_string(),
                "P003",
                vec!["Remove the ')' or add a matching '('".to_string()],
            ),
            ParseErrorKind::UnterminatedString => (
                "Unterminated string literal".to_string(),
                "P004",
                vec!["Add the closing '\"'".to_string()],
            ),
            ParseErrorKind::MaxDepthExceeded { max_depth, .. } => (
                format!("Nesting depth exceeds maximum of {} levels", max_depth),
                "P005",
                vec!["Reduce nesting".to_string()],
            ),
        };

        Diagnostic {
            message,
            span: self.span.clone(),
            related: Vec::new(),
            help,
            code: Some(code.to_string()),
        }
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let diagnostic = self.to_diagnostic();
        write!(f, "error: {}", diagnostic.message)?;

        if let Some(ref code) = diagnostic.code {
            write!(f, " [{}]", code)?;
        }

        for help_msg in &diagnostic.help {
            write!(f, "\nhelp: {}", help_msg)?;
        }

        Ok(())
    }
}

impl core::error::Error for ParseError {}

/// Convert Pest error to human-readable ParseError
pub fn convert_pest_error(err: pest::error::Error<Rule>, source: &str) -> ParseError {
    use pest::error::ErrorVariant;

    let span = match err.location {
        pest::error::InputLocation::Pos(pos) => Span(pos..pos),
        pest::error::InputLocation::Span((start, end)) => Span(start..end),
    };

    // Delimiter problems are easier to explain from the source than from
    // pest's expectation sets.
    if let Some(error) = find_delimiter_error(source) {
        return error;
    }

    let kind = match err.variant {
        ErrorVariant::ParsingError { positives, .. } => ParseErrorKind::UnexpectedToken {
            expected: format_expected_rules(&positives),
        },
        ErrorVariant::CustomError { message } => ParseErrorKind::UnexpectedToken { expected: message },
    };

    ParseError::new(kind, span)
}

/// Scans for the first unbalanced `(`/`)` or unterminated string, skipping
/// comments and string contents.
fn find_delimiter_error(source: &str) -> Option<ParseError> {
    let mut open = Vec::new();
    let mut chars = source.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            ';' => {
                while let Some(&(_, c)) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '"' => {
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '"' => {
                            closed = true;
                            break;
                        }
                        _ => {}
                    }
                }
                if !closed {
                    return Some(ParseError::new(
                        ParseErrorKind::UnterminatedString,
                        Span(i..source.len()),
                    ));
                }
            }
            '(' => open.push(i),
            ')' => {
                if open.pop().is_none() {
                    return Some(ParseError::new(
                        ParseErrorKind::UnmatchedDelimiter,
                        Span(i..i + 1),
                    ));
                }
            }
            _ => {}
        }
    }
    open.last()
        .map(|&i| ParseError::new(ParseErrorKind::UnclosedDelimiter, Span(i..i + 1)))
}

/// Format expected rules in a human-readable way
fn format_expected_rules(rules: &[Rule]) -> String {
    if rules.is_empty() {
        return "something else".to_string();
    }

    let mut concepts = Vec::new();
    for rule in rules {
        let concept = match rule {
            Rule::list => "'('",
            Rule::string | Rule::content | Rule::escape => "string",
            Rule::token => "token",
            Rule::EOI => "end of input",
            _ => "item",
        };
        if !concepts.contains(&concept) {
            concepts.push(concept);
        }
    }

    match concepts.as_slice() {
        [one] => one.to_string(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
        [] => "something else".to_string(),
    }
}
