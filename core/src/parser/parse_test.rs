use super::*;
use crate::space::NodeSpace;
use bumpalo::Bump;
use pretty_assertions::assert_eq;

fn reparse(source: &str) -> String {
    let arena = Bump::new();
    let mut space = NodeSpace::new(&arena);
    let parsed = parse(&mut space, source).expect("parse failed");
    space.display(parsed.root)
}

fn parse_err(source: &str) -> ParseError {
    let arena = Bump::new();
    let mut space = NodeSpace::new(&arena);
    parse(&mut space, source).expect_err("expected a parse error")
}

#[test]
fn test_empty_program() {
    assert_eq!(reparse(""), "()");
    assert_eq!(reparse("   \n\t "), "()");
}

#[test]
fn test_tokens_and_lists() {
    assert_eq!(reparse("(+ 1 2)"), "((+ 1 2))");
    assert_eq!(reparse("1 2 let a b in"), "(1 2 let a b in)");
    assert_eq!(
        reparse("(def (addOne x) (+ x 1)) (addOne 4)"),
        "((def (addOne x) (+ x 1)) (addOne 4))"
    );
}

#[test]
fn test_parens_split_tokens() {
    assert_eq!(reparse("(a(b)c)"), "((a (b) c))");
}

#[test]
fn test_comments_are_skipped() {
    assert_eq!(reparse("1 ; one\n2;two\n"), "(1 2)");
    assert_eq!(reparse("; only a comment"), "()");
}

#[test]
fn test_strings() {
    let arena = Bump::new();
    let mut space = NodeSpace::new(&arena);
    let parsed = parse(&mut space, r#""a b" "x\"y\n" plain"#).unwrap();
    let items = space.elements(parsed.root);
    assert_eq!(items.len(), 3);
    assert!(space.is_quoted(items[0]));
    assert_eq!(space.text(items[0]), Some("a b"));
    assert_eq!(space.text(items[1]), Some("x\"y\n"));
    assert!(!space.is_quoted(items[2]));
}

#[test]
fn test_empty_string_and_semicolon_inside() {
    let arena = Bump::new();
    let mut space = NodeSpace::new(&arena);
    let parsed = parse(&mut space, r#""" "a;b""#).unwrap();
    let items = space.elements(parsed.root);
    assert_eq!(space.text(items[0]), Some(""));
    assert_eq!(space.text(items[1]), Some("a;b"));
}

#[test]
fn test_spans() {
    let arena = Bump::new();
    let mut space = NodeSpace::new(&arena);
    let source = "1\n  (+ 2 3)";
    let parsed = parse(&mut space, source).unwrap();
    let call = space.elements(parsed.root)[1];
    let span = parsed.spans.span_of(call).unwrap();
    assert_eq!(span.str_of(source), "(+ 2 3)");
    assert_eq!(parsed.spans.line_col(source, call), Some((2, 3)));
    let three = space.elements(call)[2];
    assert_eq!(parsed.spans.span_of(three).unwrap().str_of(source), "3");
}

#[test]
fn test_unclosed_paren() {
    let err = parse_err("(+ 1 2");
    assert!(matches!(err.kind, ParseErrorKind::UnclosedDelimiter));
    assert_eq!(err.span, Span(0..1));
}

#[test]
fn test_unmatched_paren() {
    let err = parse_err("1 2)");
    assert!(matches!(err.kind, ParseErrorKind::UnmatchedDelimiter));
    assert_eq!(err.span, Span(3..4));
}

#[test]
fn test_unterminated_string() {
    let err = parse_err("1 \"abc");
    assert!(matches!(err.kind, ParseErrorKind::UnterminatedString));
}

#[test]
fn test_max_depth() {
    let arena = Bump::new();
    let mut space = NodeSpace::new(&arena);
    let err = parse_with_max_depth(&mut space, "((((1))))", 3).unwrap_err();
    assert!(matches!(
        err.kind,
        ParseErrorKind::MaxDepthExceeded { max_depth: 3, .. }
    ));

    let mut space = NodeSpace::new(&arena);
    assert!(parse_with_max_depth(&mut space, "(((1)))", 3).is_ok());
}

#[test]
fn test_diagnostic_codes() {
    assert_eq!(parse_err("(").to_diagnostic().code.as_deref(), Some("P002"));
    assert_eq!(parse_err(")").to_diagnostic().code.as_deref(), Some("P003"));
}
