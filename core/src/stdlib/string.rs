//! String operations.

use super::{num_arg, str_arg};
use crate::registry::{NativeError, Outputs, RegistryBuilder, RegistryError};
use crate::values::Value;

pub fn register(builder: &mut RegistryBuilder<'_, '_>) -> Result<(), RegistryError> {
    let types = builder.types();
    let (string, num) = (types.string(), types.num());
    builder.native("concat", &[string, string], &[string], concat)?;
    builder.native("length", &[string], &[num], length)?;
    builder.native("str", &[num], &[string], to_str)?;
    Ok(())
}

fn concat(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    let a = str_arg(args, 0)?;
    let b = str_arg(args, 1)?;
    let mut joined = String::with_capacity(a.len() + b.len());
    joined.push_str(a);
    joined.push_str(b);
    out.push(Value::Str(joined))
}

/// Length in Unicode scalar values.
fn length(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    let s = str_arg(args, 0)?;
    out.push(Value::Num(s.chars().count() as f64))
}

fn to_str(args: &[Value], out: &mut Outputs) -> Result<(), NativeError> {
    let n = num_arg(args, 0)?;
    out.push(Value::Str(Value::Num(n).to_string()))
}
