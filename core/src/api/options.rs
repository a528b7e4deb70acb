//! Configuration options for the tacit engine.

/// Configuration options for reading source text.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Maximum sequence nesting depth.
    ///
    /// Default: 256
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

/// Configuration options for verification.
///
/// # Example
///
/// ```
/// use tacit_core::api::VerifierOptions;
///
/// // Reject programs that read values the caller did not declare.
/// let options = VerifierOptions {
///     infer_root_inputs: false,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct VerifierOptions {
    /// Whether the program body may consume values it never pushed,
    /// inferring them as inputs of the whole program.
    ///
    /// Default: true
    pub infer_root_inputs: bool,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            infer_root_inputs: true,
        }
    }
}

/// Configuration options for program execution.
///
/// # Example
///
/// ```
/// use tacit_core::api::ExecutionOptions;
///
/// let options = ExecutionOptions { max_frames: 500 };
/// ```
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Maximum frame-stack depth. Tail calls do not count against it.
    ///
    /// Default: 100000
    pub max_frames: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_frames: 100_000,
        }
    }
}

/// Configuration options for the tacit engine.
///
/// These set the defaults for compilation and execution, which can be
/// overridden on a per-call basis.
///
/// # Example
///
/// ```
/// use tacit_core::api::{EngineOptions, ExecutionOptions};
///
/// let options = EngineOptions {
///     default_execution_options: ExecutionOptions { max_frames: 500 },
///     ..EngineOptions::default()
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub parse_options: ParseOptions,
    pub verifier_options: VerifierOptions,

    /// Default options for execution.
    ///
    /// These can be overridden with `CompiledProgram::run_with()`.
    pub default_execution_options: ExecutionOptions,
}
