//! Reader, verifier, and evaluator for tacit, a small concatenative language
//! whose programs are made of the same nodes they manipulate.
//!
//! Most embedders only need [`api::Engine`]; the lower layers are public for
//! tooling that wants to inspect annotations or drive the evaluator itself.

pub mod annotation;
pub mod api;
pub mod errors;
pub mod evaluator;
pub mod parser;
pub mod registry;
pub mod scope_stack;
pub mod space;
pub mod stdlib;
pub mod types;
pub mod values;
pub mod verifier;

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_recursion_recheck() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
