pub mod manager;
mod types;
pub mod unification;

#[cfg(test)]
mod manager_test;

pub use manager::TypeManager;
pub use types::{TypeDesc, TypeId};
