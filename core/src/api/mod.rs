//! Public API for the tacit language.
//!
//! Compiling a program runs the reader and the verifier; running it drives
//! the evaluator over an operand stack the caller provides.
//!
//! # Example
//!
//! ```
//! use tacit_core::api::{Engine, EngineOptions};
//! use tacit_core::values::Value;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let engine = Engine::with_prelude(&arena, EngineOptions::default()).unwrap();
//!
//! // `a` is taken from the operand stack.
//! let program = engine.compile("(if (> a 0) a (- 0 a))", &["a"]).unwrap();
//! assert_eq!(program.signature_string(), "(num) -> (num)");
//!
//! let result = program.run(vec![Value::Num(-5.0)]).unwrap();
//! assert_eq!(result, vec![Value::Num(5.0)]);
//! ```

pub mod engine;
pub mod error;
pub mod options;
pub mod program;

pub use engine::Engine;
pub use error::{Diagnostic, Error, RelatedInfo};
pub use options::{EngineOptions, ExecutionOptions, ParseOptions, VerifierOptions};
pub use program::CompiledProgram;
