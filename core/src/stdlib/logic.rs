//! Boolean connectives.

use super::bool_arg;
use crate::registry::{NativeError, Outputs, RegistryBuilder, RegistryError};
use crate::values::Value;

pub fn register(builder: &mut RegistryBuilder<'_, '_>) -> Result<(), RegistryError> {
    let bool = builder.types().bool();
    builder.native("and", &[bool, bool], &[bool], and)?;
    builder.native("or", &[bool, bool], &[bool], or)?;
    builder.native("not", &[bool], &[bool], not)?;
    Ok(())
}

// Both operands are already evaluated; there is no short-circuiting.
fn and(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    out.push(Value::Bool(bool_arg(args, 0)? && bool_arg(args, 1)?))
}

fn or(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    out.push(Value::Bool(bool_arg(args, 0)? || bool_arg(args, 1)?))
}

fn not(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    out.push(Value::Bool(!bool_arg(args, 0)?))
}
