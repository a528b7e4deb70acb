//! Numeric comparisons.

use super::num_arg;
use crate::registry::{NativeError, Outputs, RegistryBuilder, RegistryError};
use crate::values::Value;

pub fn register(builder: &mut RegistryBuilder<'_, '_>) -> Result<(), RegistryError> {
    let types = builder.types();
    let (num, bool) = (types.num(), types.bool());
    builder.native("=", &[num, num], &[bool], eq)?;
    builder.native("!=", &[num, num], &[bool], ne)?;
    builder.native(">", &[num, num], &[bool], gt)?;
    builder.native("<", &[num, num], &[bool], lt)?;
    builder.native(">=", &[num, num], &[bool], ge)?;
    builder.native("<=", &[num, num], &[bool], le)?;
    Ok(())
}

fn compare(
    args: &[Value],
    out: &mut Outputs,
    op: impl Fn(f64, f64) -> bool,
) -> Result<(), NativeError> {
    let a = num_arg(args, 0)?;
    let b = num_arg(args, 1)?;
    out.push(Value::Bool(op(a, b)))
}

fn eq(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    compare(args, out, |a, b| a == b)
}

fn ne(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    compare(args, out, |a, b| a != b)
}

fn gt(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    compare(args, out, |a, b| a > b)
}

fn lt(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    compare(args, out, |a, b| a < b)
}

fn ge(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    compare(args, out, |a, b| a >= b)
}

fn le(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    compare(args, out, |a, b| a <= b)
}
