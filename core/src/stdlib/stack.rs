//! Polymorphic stack shufflers.
//!
//! Signatures use positional vars: `dup` is `('0) -> ('0 '0)` and `swap`
//! is `('0 '1) -> ('1 '0)`. Outputs are copies; the evaluator drops the
//! arguments afterwards.

use super::any_arg;
use crate::registry::{NativeError, Outputs, RegistryBuilder, RegistryError};
use crate::values::Value;

pub fn register(builder: &mut RegistryBuilder<'_, '_>) -> Result<(), RegistryError> {
    let types = builder.types();
    let (a, b) = (types.var(0), types.var(1));
    builder.native("dup", &[a], &[a, a], dup)?;
    builder.native("swap", &[a, b], &[b, a], swap)?;
    Ok(())
}

fn dup(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    let value = any_arg(args, 0)?;
    out.push(value.clone())?;
    out.push(value.clone())
}

fn swap(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    out.push(any_arg(args, 1)?.clone())?;
    out.push(any_arg(args, 0)?.clone())
}
