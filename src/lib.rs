//! Tacit - a small homoiconic, concatenative stack language
//!
//! # Overview
//!
//! Programs are sequences of nodes. Each node pushes a value, calls a native
//! or user function, or opens a scope. A static verifier infers the stack
//! effect of every block before anything runs; the evaluator then executes
//! the program on an explicit frame stack, so tail calls run in constant
//! depth.
//!
//! # Quick Start
//!
//! ```
//! use tacit::{Engine, EngineOptions, Value};
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let engine = Engine::with_prelude(&arena, EngineOptions::default()).unwrap();
//!
//! let program = engine
//!     .compile("(def (count n) (if (> n 0) (count (- n 1)) n)) (count 10)", &[])
//!     .unwrap();
//! assert_eq!(program.signature_string(), "() -> (num)");
//! assert_eq!(program.run(Vec::new()).unwrap(), vec![Value::Num(0.0)]);
//! ```
//!
//! # Native functions
//!
//! Natives declare their stack signature when they are registered and are
//! checked by the verifier like any other call:
//!
//! ```
//! use tacit::{Engine, EngineOptions, Value};
//! use tacit::registry::{NativeError, Outputs};
//! use bumpalo::Bump;
//!
//! fn twice(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
//!     let n = args[0].as_num().ok_or_else(|| NativeError::new("expected num"))?;
//!     out.push(Value::Num(n * 2.0))
//! }
//!
//! let arena = Bump::new();
//! let engine = Engine::new(&arena, EngineOptions::default(), |types, registry| {
//!     tacit::stdlib::install(registry)?;
//!     registry.native("twice", &[types.num()], &[types.num()], twice)?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! let program = engine.compile("(twice 21)", &[]).unwrap();
//! assert_eq!(program.run(Vec::new()).unwrap(), vec![Value::Num(42.0)]);
//! ```

mod error_renderer;

// Re-export public API from tacit_core
pub use tacit_core::api::{
    CompiledProgram, Diagnostic, Engine, EngineOptions, Error, ExecutionOptions, ParseOptions,
    RelatedInfo, VerifierOptions,
};

// Re-export commonly used modules and values
pub use tacit_core::types::{self, TypeId, manager::TypeManager};
pub use tacit_core::values::{self, CustomValue, Value, format_stack};
pub use tacit_core::{registry, stdlib};

// Re-export errors
pub use tacit_core::errors::ErrorKind;

pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};
