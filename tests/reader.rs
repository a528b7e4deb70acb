//! Reader behavior observed through the engine.

mod common;

use bumpalo::Bump;
use common::{compile_error_code, num, run};
use pretty_assertions::assert_eq;
use tacit::{Engine, EngineOptions, Error, ParseOptions, Value};

#[test]
fn comments_are_ignored() {
    let source = "; leading comment\n(+ 1 ; inline\n 2) ; trailing";
    assert_eq!(run(source), vec![num(3.0)]);
}

#[test]
fn semicolon_inside_string_is_not_a_comment() {
    assert_eq!(run(r#""a;b""#), vec![Value::str("a;b")]);
}

#[test]
fn string_escapes() {
    assert_eq!(run(r#""say \"hi\"""#), vec![Value::str("say \"hi\"")]);
    assert_eq!(run(r#""back\\slash""#), vec![Value::str("back\\slash")]);
    assert_eq!(run(r#"(length "a\tb\n")"#), vec![num(4.0)]);
}

#[test]
fn quoted_tokens_are_never_names() {
    // A quoted `+` is a string, not the native.
    assert_eq!(run(r#""+""#), vec![Value::str("+")]);
}

#[test]
fn numbers_and_booleans() {
    assert_eq!(run("-2.5 true"), vec![num(-2.5), Value::Bool(true)]);
}

#[test]
fn unbalanced_parentheses() {
    assert_eq!(compile_error_code("(+ 1 2"), "P002");
    assert_eq!(compile_error_code("(+ 1 2))"), "P003");
}

#[test]
fn unterminated_string() {
    assert_eq!(compile_error_code(r#"(concat "a" "b)"#), "P004");
}

#[test]
fn nesting_depth_is_bounded() {
    let arena = Bump::new();
    let options = EngineOptions {
        parse_options: ParseOptions { max_depth: 4 },
        ..EngineOptions::default()
    };
    let engine = Engine::with_prelude(&arena, options).unwrap();

    assert!(engine.compile("(blk (blk 1))", &[]).is_ok());
    match engine.compile("(blk (blk (blk (blk (blk 1)))))", &[]) {
        Err(err @ Error::Compilation { .. }) => {
            assert_eq!(err.diagnostics()[0].code.as_deref(), Some("P005"));
        }
        Err(other) => panic!("expected a compilation error, got {other}"),
        Ok(_) => panic!("expected nesting to be rejected"),
    }
}

#[test]
fn unreadable_file() {
    let arena = Bump::new();
    let engine = Engine::with_prelude(&arena, EngineOptions::default()).unwrap();
    match engine.compile_file("/nonexistent/program.tc", &[]) {
        Err(Error::Source(message)) => assert!(message.contains("program.tc")),
        Err(other) => panic!("expected a source error, got {other}"),
        Ok(_) => panic!("expected the read to fail"),
    }
}
