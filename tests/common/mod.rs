#![allow(dead_code)]

use bumpalo::Bump;
use tacit::{CompiledProgram, Engine, EngineOptions, Error, ExecutionOptions, Value};

/// Compiles `source` with the prelude and hands the engine and the result to `f`.
pub fn with_program<R>(
    source: &str,
    params: &[&str],
    f: impl FnOnce(&Engine<'_>, Result<CompiledProgram<'_, '_>, Error>) -> R,
) -> R {
    let arena = Bump::new();
    let engine = Engine::with_prelude(&arena, EngineOptions::default()).unwrap();
    let result = engine.compile(source, params);
    f(&engine, result)
}

pub fn signature(source: &str, params: &[&str]) -> String {
    with_program(source, params, |_, program| {
        program
            .unwrap_or_else(|e| panic!("{source}: {e}"))
            .signature_string()
    })
}

pub fn run_with_args(source: &str, params: &[&str], args: Vec<Value>) -> Vec<Value> {
    with_program(source, params, |_, program| {
        program
            .unwrap_or_else(|e| panic!("{source}: {e}"))
            .run(args)
            .unwrap_or_else(|e| panic!("{source}: {e}"))
    })
}

pub fn run(source: &str) -> Vec<Value> {
    run_with_args(source, &[], Vec::new())
}

pub fn run_limited(source: &str, max_frames: usize) -> Result<Vec<Value>, Error> {
    with_program(source, &[], |_, program| {
        program
            .unwrap_or_else(|e| panic!("{source}: {e}"))
            .run_with(Vec::new(), ExecutionOptions { max_frames })
    })
}

/// Error code of the first diagnostic produced while compiling `source`.
pub fn compile_error_code(source: &str) -> String {
    with_program(source, &[], |_, program| match program {
        Ok(_) => panic!("expected `{source}` to be rejected"),
        Err(err) => err
            .diagnostics()
            .first()
            .and_then(|d| d.code.clone())
            .unwrap_or_else(|| panic!("{source}: no diagnostic code in {err}")),
    })
}

pub fn num(n: f64) -> Value {
    Value::Num(n)
}
