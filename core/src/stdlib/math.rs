//! Arithmetic over `num`.

use super::num_arg;
use crate::registry::{NativeError, Outputs, RegistryBuilder, RegistryError};
use crate::values::Value;

pub fn register(builder: &mut RegistryBuilder<'_, '_>) -> Result<(), RegistryError> {
    let num = builder.types().num();
    builder.native("+", &[num, num], &[num], add)?;
    builder.native("-", &[num, num], &[num], sub)?;
    builder.native("*", &[num, num], &[num], mul)?;
    builder.native("/", &[num, num], &[num], div)?;
    builder.native("mod", &[num, num], &[num], rem)?;
    builder.native("min", &[num, num], &[num], min)?;
    builder.native("max", &[num, num], &[num], max)?;
    builder.native("neg", &[num], &[num], neg)?;
    Ok(())
}

fn binary(
    args: &[Value],
    out: &mut Outputs,
    op: impl Fn(f64, f64) -> f64,
) -> Result<(), NativeError> {
    let a = num_arg(args, 0)?;
    let b = num_arg(args, 1)?;
    out.push(Value::Num(op(a, b)))
}

fn add(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    binary(args, out, |a, b| a + b)
}

fn sub(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    binary(args, out, |a, b| a - b)
}

fn mul(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    binary(args, out, |a, b| a * b)
}

/// IEEE division; dividing by zero yields an infinity or `nan`.
fn div(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    binary(args, out, |a, b| a / b)
}

fn rem(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    binary(args, out, |a, b| a % b)
}

fn min(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    binary(args, out, f64::min)
}

fn max(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    binary(args, out, f64::max)
}

fn neg(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    out.push(Value::Num(-num_arg(args, 0)?))
}
