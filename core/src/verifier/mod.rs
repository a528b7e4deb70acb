//! Static verification: abstract-stack type inference over the node space.

mod block;
mod error;
mod verifier;

pub use block::{BlockSignature, DisplaySignature, InferState, OutType};
pub use error::TypeError;
pub use verifier::{Verified, verify};

#[cfg(test)]
mod verifier_test;
