use core::any::Any;
use core::fmt;

use crate::types::{TypeId, manager::TypeManager};

/// Extra owned value kinds an embedder can register.
///
/// `clone_boxed` is the copy hook and `Drop` on the concrete type is the
/// destructor. The evaluator clones a value whenever it is read from a
/// variable or a literal slot, and drops it exactly once when the owning
/// stack slot goes away.
pub trait CustomValue: Any + fmt::Debug + fmt::Display {
    fn clone_boxed(&self) -> Box<dyn CustomValue>;

    fn as_any(&self) -> &dyn Any;

    /// Structural equality with another custom value. Defaults to never equal.
    fn equals(&self, other: &dyn CustomValue) -> bool {
        let _ = other;
        false
    }
}

/// A runtime value owned by exactly one operand or variable slot.
#[derive(Debug)]
pub enum Value {
    Bool(bool),
    Num(f64),
    Str(String),
    Custom {
        ty: TypeId,
        data: Box<dyn CustomValue>,
    },
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Bool(b) => Value::Bool(*b),
            Value::Num(n) => Value::Num(*n),
            Value::Str(s) => Value::Str(s.clone()),
            Value::Custom { ty, data } => Value::Custom {
                ty: *ty,
                data: data.clone_boxed(),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Custom { ty: ta, data: a }, Value::Custom { ty: tb, data: b }) => {
                ta == tb && a.equals(b.as_ref())
            }
            _ => false,
        }
    }
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn custom(ty: TypeId, data: impl CustomValue) -> Self {
        Value::Custom {
            ty,
            data: Box::new(data),
        }
    }

    /// The registered type this value inhabits.
    pub fn ty(&self, types: &TypeManager<'_>) -> TypeId {
        match self {
            Value::Bool(_) => types.bool(),
            Value::Num(_) => types.num(),
            Value::Str(_) => types.string(),
            Value::Custom { ty, .. } => *ty,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Downcasts a custom payload.
    pub fn downcast_ref<T: CustomValue>(&self) -> Option<&T> {
        match self {
            Value::Custom { data, .. } => data.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Num(n) => format_num(f, *n),
            Value::Str(s) => write!(f, "\"{}\"", escape_string(s)),
            Value::Custom { data, .. } => write!(f, "{}", data),
        }
    }
}

// Integral values print without a fraction, matching how they are written.
fn format_num(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_nan() {
        write!(f, "nan")
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            write!(f, "inf")
        } else {
            write!(f, "-inf")
        }
    } else {
        write!(f, "{}", value)
    }
}

pub(crate) fn escape_string(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\r' => vec!['\\', 'r'],
            '\t' => vec!['\\', 't'],
            c => vec![c],
        })
        .collect()
}

/// Renders an operand stack bottom to top, e.g. `[3 "hi" true]`.
pub fn format_stack(values: &[Value]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(" "))
}
