//! The tacit compilation engine.

use std::path::Path;

use bumpalo::Bump;
use tracing::debug;

use super::{CompiledProgram, EngineOptions, Error};
use crate::registry::{Registry, RegistryBuilder, RegistryError};
use crate::space::NodeSpace;
use crate::types::manager::TypeManager;
use crate::{parser, stdlib, verifier};

/// The tacit compilation and execution engine.
///
/// The engine manages:
/// - Type table (TypeManager)
/// - Value types and native functions (Registry)
/// - Runtime configuration (EngineOptions)
///
/// # Lifetimes
///
/// - `'arena`: Lifetime of the arena holding types and program nodes.
///   All compiled programs borrow from this arena.
///
/// # Example
///
/// ```
/// use tacit_core::api::{Engine, EngineOptions};
/// use tacit_core::values::Value;
/// use bumpalo::Bump;
///
/// let arena = Bump::new();
/// let engine = Engine::with_prelude(&arena, EngineOptions::default()).unwrap();
///
/// let program = engine.compile("(def (addOne x) (+ x 1)) (addOne 4)", &[]).unwrap();
/// assert_eq!(program.run(Vec::new()).unwrap(), vec![Value::Num(5.0)]);
/// ```
pub struct Engine<'arena> {
    arena: &'arena Bump,
    types: &'arena TypeManager<'arena>,
    registry: Registry,
    options: EngineOptions,
}

impl<'arena> Engine<'arena> {
    /// Create a new engine with a custom registry.
    ///
    /// The initialization closure receives:
    /// - `types`: The type table, for minting atoms and signatures
    /// - `registry`: The builder for registering value types and natives
    ///
    /// # Example
    ///
    /// ```ignore
    /// let engine = Engine::new(&arena, options, |types, registry| {
    ///     stdlib::install(registry)?;
    ///     registry.native("twice", &[types.num()], &[types.num()], twice)?;
    ///     Ok(())
    /// })?;
    /// ```
    pub fn new(
        arena: &'arena Bump,
        options: EngineOptions,
        init: impl FnOnce(
            &'arena TypeManager<'arena>,
            &mut RegistryBuilder<'arena, 'arena>,
        ) -> Result<(), RegistryError>,
    ) -> Result<Self, RegistryError> {
        let types = TypeManager::new(arena);
        let mut builder = RegistryBuilder::new(types);
        init(types, &mut builder)?;
        let registry = builder.build();
        debug!(
            natives = registry.natives().len(),
            value_types = registry.value_types().len(),
            "engine ready"
        );

        Ok(Self {
            arena,
            types,
            registry,
            options,
        })
    }

    /// Create an engine with the standard prelude installed.
    pub fn with_prelude(arena: &'arena Bump, options: EngineOptions) -> Result<Self, RegistryError> {
        Self::new(arena, options, |_, registry| stdlib::install(registry))
    }

    pub fn type_manager(&self) -> &'arena TypeManager<'arena> {
        self.types
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Read and verify a program.
    ///
    /// `params` name the values the caller will leave on the operand stack,
    /// the deepest value first.
    pub fn compile(&self, source: &str, params: &[&str]) -> Result<CompiledProgram<'_, 'arena>, Error> {
        let mut space = NodeSpace::new(self.arena);
        let parsed = parser::parse_with_max_depth(
            &mut space,
            source,
            self.options.parse_options.max_depth,
        )
        .map_err(|err| Error::Compilation {
            diagnostics: vec![err.to_diagnostic()],
            source: source.to_string(),
        })?;

        let verified = verifier::verify(
            &space,
            parsed.root,
            self.types,
            &self.registry,
            params,
            &self.options.verifier_options,
        )
        .map_err(|err| Error::Compilation {
            diagnostics: vec![err.to_diagnostic(&parsed.spans)],
            source: source.to_string(),
        })?;

        Ok(CompiledProgram::new(
            self,
            space,
            parsed.spans,
            verified,
            source.to_string(),
        ))
    }

    /// Read a source file and compile it.
    pub fn compile_file(
        &self,
        path: impl AsRef<Path>,
        params: &[&str],
    ) -> Result<CompiledProgram<'_, 'arena>, Error> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|err| Error::Source(format!("{}: {}", path.display(), err)))?;
        self.compile(&source, params)
    }
}
