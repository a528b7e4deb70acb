use core::fmt;

/// Interned handle to a [`TypeDesc`]. Equal shapes share one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Structural type descriptor.
///
/// `Var(k)` has two readings. In native descriptors and finished block
/// signatures it is positional: "the type at input `k`", which accepts any
/// type as an input and echoes input `k` as an output. During verification
/// the same shape serves as an inference placeholder created by stack
/// growth; placeholders never survive into finished signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeDesc<'a> {
    /// Registered value type, numbered by registration order.
    Atom(u32),
    Var(u32),
    Function {
        ins: &'a [TypeId],
        outs: &'a [TypeId],
    },
    Tuple(&'a [TypeId]),
    Array(TypeId),
}

impl TypeDesc<'_> {
    pub fn is_var(&self) -> bool {
        matches!(self, TypeDesc::Var(_))
    }
}
