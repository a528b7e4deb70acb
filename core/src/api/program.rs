//! Compiled tacit programs.

use super::{Engine, Error, ExecutionOptions};
use crate::errors::ErrorKind;
use crate::evaluator::{Evaluator, RuntimeError};
use crate::parser::SourceMap;
use crate::space::NodeSpace;
use crate::values::Value;
use crate::verifier::{BlockSignature, Verified};

/// A verified program ready for execution.
///
/// Compiled programs borrow their engine and can be run any number of
/// times, each run over a fresh operand stack.
///
/// # Example
///
/// ```ignore
/// let program = engine.compile("(if (> a 0) a (- 0 a))", &["a"])?;
/// assert_eq!(program.signature_string(), "(num) -> (num)");
/// let result = program.run(vec![Value::Num(-5.0)])?;
/// ```
pub struct CompiledProgram<'e, 'arena> {
    engine: &'e Engine<'arena>,
    space: NodeSpace<'arena>,
    spans: SourceMap,
    verified: Verified,
    source: String,
}

impl<'e, 'arena> CompiledProgram<'e, 'arena> {
    pub(crate) fn new(
        engine: &'e Engine<'arena>,
        space: NodeSpace<'arena>,
        spans: SourceMap,
        verified: Verified,
        source: String,
    ) -> Self {
        Self {
            engine,
            space,
            spans,
            verified,
            source,
        }
    }

    /// Net stack effect of the whole program.
    pub fn signature(&self) -> &BlockSignature {
        self.verified.root_signature()
    }

    /// The signature rendered as `(ins) -> (outs)`.
    pub fn signature_string(&self) -> String {
        self.signature()
            .display(self.engine.type_manager())
            .to_string()
    }

    pub fn verified(&self) -> &Verified {
        &self.verified
    }

    pub fn space(&self) -> &NodeSpace<'arena> {
        &self.space
    }

    pub fn spans(&self) -> &SourceMap {
        &self.spans
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Execute with the engine's default execution options.
    ///
    /// `args` is the initial operand stack, deepest value first. Returns the
    /// final operand stack.
    pub fn run(&self, args: Vec<Value>) -> Result<Vec<Value>, Error> {
        self.run_with(args, self.engine.options().default_execution_options.clone())
    }

    pub fn run_with(&self, args: Vec<Value>, options: ExecutionOptions) -> Result<Vec<Value>, Error> {
        let mut stack = args;
        let mut evaluator = Evaluator::new(
            &self.space,
            &self.verified,
            self.engine.registry(),
            self.engine.type_manager(),
            options,
        );
        evaluator
            .run(&mut stack)
            .map_err(|err| self.runtime_error(err))?;
        Ok(stack)
    }

    fn runtime_error(&self, err: RuntimeError) -> Error {
        match err.kind {
            ErrorKind::ResourceExceeded => Error::ResourceExceeded(err.message),
            _ => Error::Runtime {
                diagnostic: err.to_diagnostic(&self.spans),
                source: self.source.clone(),
            },
        }
    }
}
