//! Value-type and native-function descriptor tables.
//!
//! Both tables are append-only while a [`RegistryBuilder`] is alive and
//! frozen into a [`Registry`] afterwards. Lookups scan newest first, so a
//! later registration shadows an earlier one of the same name.

use core::fmt;

use smallvec::SmallVec;
use thiserror::Error;

use crate::types::{TypeId, manager::TypeManager};
use crate::values::Value;

/// Hard bound on how many values a native may produce.
pub const MAX_NATIVE_OUTS: usize = 8;

/// Builds a value from literal text, or declines.
pub type LiteralHook = fn(&str, TypeId) -> Option<Value>;

pub type NativeFn = fn(&[Value], &mut Outputs) -> Result<(), NativeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeId(pub(crate) u32);

impl NativeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct ValueType {
    pub name: String,
    pub ty: TypeId,
    pub from_symbol: Option<LiteralHook>,
}

#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub ins: Vec<TypeId>,
    pub outs: Vec<TypeId>,
    pub call: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("ins", &self.ins)
            .field("outs", &self.outs)
            .finish_non_exhaustive()
    }
}

/// Failure raised by a native callable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NativeError {
    pub message: String,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("native `{name}` declares {outs} outputs, at most {MAX_NATIVE_OUTS} are allowed")]
    TooManyOutputs { name: String, outs: usize },
    #[error("`{0}` is not a registered value type")]
    UnknownValueType(String),
}

/// Fixed-capacity output buffer handed to native callables.
#[derive(Debug, Default)]
pub struct Outputs {
    values: SmallVec<[Value; MAX_NATIVE_OUTS]>,
}

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Value) -> Result<(), NativeError> {
        if self.values.len() == MAX_NATIVE_OUTS {
            return Err(NativeError::new(format!(
                "native output buffer is full ({} values)",
                MAX_NATIVE_OUTS
            )));
        }
        self.values.push(value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> impl Iterator<Item = Value> {
        self.values.into_iter()
    }
}

pub struct RegistryBuilder<'t, 'a> {
    types: &'t TypeManager<'a>,
    value_types: Vec<ValueType>,
    natives: Vec<NativeFunction>,
}

impl<'t, 'a> RegistryBuilder<'t, 'a> {
    /// Starts with the primitive `bool`, `num` and `string` types, without
    /// literal hooks.
    pub fn new(types: &'t TypeManager<'a>) -> Self {
        let value_types = [types.bool(), types.num(), types.string()]
            .into_iter()
            .map(|ty| ValueType {
                name: types.display(ty),
                ty,
                from_symbol: None,
            })
            .collect();
        Self {
            types,
            value_types,
            natives: Vec::new(),
        }
    }

    pub fn types(&self) -> &'t TypeManager<'a> {
        self.types
    }

    /// Registers a new value type backed by a fresh atom.
    pub fn value_type(&mut self, name: &str, from_symbol: Option<LiteralHook>) -> TypeId {
        let ty = self.types.new_atom(name);
        self.value_types.push(ValueType {
            name: name.to_string(),
            ty,
            from_symbol,
        });
        ty
    }

    /// Installs or replaces the literal hook of an already registered type.
    pub fn literal_hook(&mut self, ty: TypeId, hook: LiteralHook) -> Result<(), RegistryError> {
        let entry = self
            .value_types
            .iter_mut()
            .find(|vt| vt.ty == ty)
            .ok_or_else(|| RegistryError::UnknownValueType(self.types.display(ty)))?;
        entry.from_symbol = Some(hook);
        Ok(())
    }

    pub fn native(
        &mut self,
        name: &str,
        ins: &[TypeId],
        outs: &[TypeId],
        call: NativeFn,
    ) -> Result<NativeId, RegistryError> {
        if outs.len() > MAX_NATIVE_OUTS {
            return Err(RegistryError::TooManyOutputs {
                name: name.to_string(),
                outs: outs.len(),
            });
        }
        let id = NativeId(self.natives.len() as u32);
        self.natives.push(NativeFunction {
            name: name.to_string(),
            ins: ins.to_vec(),
            outs: outs.to_vec(),
            call,
        });
        Ok(id)
    }

    pub fn build(self) -> Registry {
        Registry {
            value_types: self.value_types,
            natives: self.natives,
        }
    }
}

/// Immutable descriptor tables shared by the verifier and the evaluator.
#[derive(Debug)]
pub struct Registry {
    value_types: Vec<ValueType>,
    natives: Vec<NativeFunction>,
}

impl Registry {
    pub fn native(&self, id: NativeId) -> &NativeFunction {
        &self.natives[id.index()]
    }

    pub fn natives(&self) -> &[NativeFunction] {
        &self.natives
    }

    pub fn value_types(&self) -> &[ValueType] {
        &self.value_types
    }

    pub fn find_native(&self, name: &str) -> Option<NativeId> {
        self.natives
            .iter()
            .rposition(|n| n.name == name)
            .map(|i| NativeId(i as u32))
    }

    /// Probes the literal hooks, newest type first.
    pub fn parse_literal(&self, text: &str) -> Option<(TypeId, Value)> {
        self.value_types.iter().rev().find_map(|vt| {
            let hook = vt.from_symbol?;
            hook(text, vt.ty).map(|value| (vt.ty, value))
        })
    }
}
