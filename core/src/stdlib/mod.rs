//! Prelude: primitive literal hooks and the native function tables.
//!
//! - Prim: `bool` and `num` literal hooks
//! - Math: `+ - * / mod min max neg`
//! - Compare: `= != > < >= <=`
//! - Logic: `and or not`
//! - String: `concat length str`
//! - Stack: `dup swap`
//!
//! Each group registers into a [`RegistryBuilder`]; [`install`] registers
//! all of them in order.

use crate::registry::{NativeError, RegistryBuilder, RegistryError};
use crate::values::Value;

pub mod compare;
pub mod logic;
pub mod math;
pub mod prim;
pub mod stack;
pub mod string;

/// Registers every prelude group.
///
/// # Example
///
/// ```ignore
/// let engine = Engine::new(&arena, options, |_types, registry| {
///     stdlib::install(registry).expect("prelude registration should succeed");
/// });
/// ```
pub fn install(builder: &mut RegistryBuilder<'_, '_>) -> Result<(), RegistryError> {
    prim::register(builder)?;
    math::register(builder)?;
    compare::register(builder)?;
    logic::register(builder)?;
    string::register(builder)?;
    stack::register(builder)?;
    Ok(())
}

pub(crate) fn num_arg(args: &[Value], index: usize) -> Result<f64, NativeError> {
    args.get(index)
        .and_then(Value::as_num)
        .ok_or_else(|| NativeError::new(format!("argument {} is not a num", index)))
}

pub(crate) fn bool_arg(args: &[Value], index: usize) -> Result<bool, NativeError> {
    args.get(index)
        .and_then(Value::as_bool)
        .ok_or_else(|| NativeError::new(format!("argument {} is not a bool", index)))
}

pub(crate) fn str_arg(args: &[Value], index: usize) -> Result<&str, NativeError> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| NativeError::new(format!("argument {} is not a string", index)))
}

pub(crate) fn any_arg(args: &[Value], index: usize) -> Result<&Value, NativeError> {
    args.get(index)
        .ok_or_else(|| NativeError::new(format!("missing argument {}", index)))
}
