//! Frame-stack interpreter for verified programs.
//!
//! The evaluator walks the program with the same [`ScopeStack`] the
//! verifier uses and dispatches purely on the verifier's annotations, so
//! it never resolves a name.
//!
//! ## Design Principles
//!
//! - **Never panic**: a run that goes wrong returns a [`RuntimeError`]
//! - **Bounded frames**: tail calls collapse exhausted frames first, and
//!   `max_frames` stops runaway non-tail recursion
//! - **Exact ownership**: every value is dropped exactly once, on success
//!   and on failure
//!
//! ## Example
//!
//! ```ignore
//! let verified = verify(&space, parsed.root, types, &registry, &[], &VerifierOptions::default())?;
//! let mut evaluator = Evaluator::new(&space, &verified, &registry, types, ExecutionOptions::default());
//! let mut stack = Vec::new();
//! evaluator.run(&mut stack)?;
//! ```
//!
//! [`ScopeStack`]: crate::scope_stack::ScopeStack

mod error;
mod eval;


pub use error::RuntimeError;
pub use eval::Evaluator;
