//! Error rendering using ariadne
//!
//! Renders tacit errors with source snippets, error codes, labels and help
//! text.

use crate::{Diagnostic, Error};
use ariadne::{ColorGenerator, Config, Label, Report, ReportKind, Source};
use core::ops::Range;
use std::io::Write;

/// Render an error with formatting to stderr
///
/// # Example
/// ```no_run
/// use tacit::{Engine, EngineOptions, render_error};
/// use bumpalo::Bump;
///
/// let arena = Bump::new();
/// let engine = Engine::with_prelude(&arena, EngineOptions::default()).unwrap();
///
/// if let Err(e) = engine.compile("(+ 1 \"two\")", &[]) {
///     render_error(&e);
/// }
/// ```
pub fn render_error(error: &Error) {
    render_error_to_writer(error, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
///
/// This is useful when you want to control where the error is written,
/// such as to a file, a buffer, or a custom output stream.
pub fn render_error_to(error: &Error, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(error, writer, true)
}

/// Render an error to a String (useful for logs, editors, etc.)
pub fn render_error_to_string(error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
///
/// This is the same as `render_error_to_string` but without ANSI color codes,
/// making the output easier to compare in tests.
pub fn render_error_to_string_no_color(error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(
    error: &Error,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    match error {
        Error::Compilation {
            diagnostics,
            source,
        } => render_diagnostics(source, diagnostics, writer, use_color),
        Error::Runtime {
            diagnostic,
            source,
        } => render_diagnostics(source, core::slice::from_ref(diagnostic), writer, use_color),
        Error::ResourceExceeded(msg) => {
            writeln!(writer, "Resource limit exceeded: {}", msg)
        }
        Error::Source(msg) => {
            writeln!(writer, "Source unreadable: {}", msg)
        }
    }
}

/// Every diagnostic is an error; the reader and verifier stop at the first.
fn render_diagnostics(
    source: &str,
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    let mut cache = (SOURCE_ID, Source::from(source));
    for diag in diagnostics {
        build_report(diag, use_color).write(&mut cache, &mut *writer)?;
    }
    Ok(())
}

const SOURCE_ID: &str = "<source>";

fn build_report(diag: &Diagnostic, use_color: bool) -> Report<'_, (&'static str, Range<usize>)> {
    let mut colors = ColorGenerator::new();
    let mut report = Report::build(ReportKind::Error, (SOURCE_ID, diag.span.0.clone()))
        .with_message(&diag.message)
        .with_config(Config::default().with_color(use_color));
    if let Some(code) = &diag.code {
        report = report.with_code(code);
    }

    // The primary span first, then the places that explain it.
    let primary = (&diag.span.0, diag.message.as_str());
    let secondary = diag.related.iter().map(|r| (&r.span.0, r.message.as_str()));
    let labels = core::iter::once(primary)
        .chain(secondary)
        .enumerate()
        .map(|(order, (span, note))| {
            Label::new((SOURCE_ID, span.clone()))
                .with_message(note)
                .with_color(colors.next())
                .with_order(order as i32)
        });
    report.add_labels(labels);

    for help in &diag.help {
        report = report.with_help(help);
    }
    report.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Engine, EngineOptions, ExecutionOptions};
    use bumpalo::Bump;

    fn compile_error(source: &str) -> Error {
        let arena = Bump::new();
        let engine = Engine::with_prelude(&arena, EngineOptions::default()).unwrap();
        match engine.compile(source, &[]) {
            Err(e) => e,
            Ok(_) => panic!("expected `{source}` to fail"),
        }
    }

    #[test]
    fn test_render_parse_error() {
        let output = render_error_to_string_no_color(&compile_error("(+ 1 2"));

        assert!(output.contains("Error"));
        assert!(output.contains("P00"));
        assert!(output.contains("(+ 1 2"));
    }

    #[test]
    fn test_render_type_error() {
        let output = render_error_to_string_no_color(&compile_error(r#"(+ 1 "two")"#));

        assert!(output.contains("E003"));
        assert!(output.contains(r#"(+ 1 "two")"#));
    }

    #[test]
    fn test_render_branch_arms_as_secondary_labels() {
        let err = compile_error(r#"(if true 1 "one")"#);
        let related = &err.diagnostics()[0].related;
        assert_eq!(related.len(), 2);

        let output = render_error_to_string_no_color(&err);
        assert!(output.contains("E004"), "{output}");
        assert!(output.contains("then arm"), "{output}");
        assert!(output.contains("else arm"), "{output}");
    }

    #[test]
    fn test_render_callee_definition() {
        let output = render_error_to_string_no_color(&compile_error("(def (f x) x) (f 1 2)"));

        assert!(output.contains("E003"), "{output}");
        assert!(output.contains("`f` is defined here"), "{output}");
    }

    #[test]
    fn test_render_undefined_name() {
        let output = render_error_to_string_no_color(&compile_error("1 frobnicate"));

        assert!(output.contains("frobnicate"));
        // ariadne adds a header, the snippet and the label
        assert!(output.lines().count() > 1);
    }

    #[test]
    fn test_render_resource_exceeded() {
        let arena = Bump::new();
        let engine = Engine::with_prelude(&arena, EngineOptions::default()).unwrap();
        let program = engine
            .compile(
                "(def (sum n) (if (> n 0) (+ n (sum (- n 1))) 0)) (sum 100)",
                &[],
            )
            .unwrap();
        let err = program
            .run_with(Vec::new(), ExecutionOptions { max_frames: 10 })
            .unwrap_err();

        let output = render_error_to_string_no_color(&err);
        assert!(output.starts_with("Resource limit exceeded"));
    }

    #[test]
    fn test_color_output_differs() {
        let err = compile_error("(+ 1 2");
        let plain = render_error_to_string_no_color(&err);
        let colored = render_error_to_string(&err);

        assert!(!plain.contains('\u{1b}'));
        assert!(colored.contains('\u{1b}'));
    }
}
