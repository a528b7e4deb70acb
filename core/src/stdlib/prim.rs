//! Literal hooks for the primitive value types.
//!
//! Quoted tokens never reach these hooks; they are `string` literals as-is.

use crate::registry::{RegistryBuilder, RegistryError};
use crate::types::TypeId;
use crate::values::Value;

pub fn register(builder: &mut RegistryBuilder<'_, '_>) -> Result<(), RegistryError> {
    let types = builder.types();
    builder.literal_hook(types.bool(), bool_from_symbol)?;
    builder.literal_hook(types.num(), num_from_symbol)?;
    Ok(())
}

fn bool_from_symbol(text: &str, _ty: TypeId) -> Option<Value> {
    match text {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => None,
    }
}

/// Decimal numbers with optional sign, fraction and exponent.
///
/// The leading-digit check keeps words such as `inf` or `nan` out, which
/// `f64::from_str` would otherwise accept. Literals that overflow to an
/// infinity are not numbers either.
fn num_from_symbol(text: &str, _ty: TypeId) -> Option<Value> {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let digits = unsigned.strip_prefix('.').unwrap_or(unsigned);
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Value::Num)
}
