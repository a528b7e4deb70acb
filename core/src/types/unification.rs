//! Placeholder refinement for the verifier.
//!
//! `TypeManager::unify` is a pure, table-level operation: a `Var` simply
//! yields the other side. During verification, stack-growth placeholders
//! must instead remember what they were unified with, so later uses see the
//! refined type. That bookkeeping lives here.

use hashbrown::HashMap;
use thiserror::Error;

use crate::types::{TypeDesc, TypeId, manager::TypeManager};

/// Types of unification errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("cannot construct infinite type {type_var} = {ty}")]
    OccursCheckFailed { type_var: String, ty: String },
    #[error("expected {expected} types, found {found}")]
    ArityMismatch { expected: usize, found: usize },
    #[error("{left} is not compatible with {right}")]
    TypeMismatch { left: String, right: String },
}

/// Substitution over inference placeholders.
///
/// Placeholder ids come from a counter local to this instance, so two
/// verification runs over the same program number their placeholders
/// identically.
pub struct Unification<'t, 'a> {
    types: &'t TypeManager<'a>,
    subst: HashMap<u32, TypeId>,
    next_var: u32,
}

impl<'t, 'a> Unification<'t, 'a> {
    pub fn new(types: &'t TypeManager<'a>) -> Self {
        Self {
            types,
            subst: HashMap::new(),
            next_var: 0,
        }
    }

    pub fn fresh(&mut self) -> TypeId {
        let id = self.next_var;
        self.next_var += 1;
        self.types.var(id)
    }

    /// Resolve a type by following the substitution chain.
    pub fn resolve(&self, mut ty: TypeId) -> TypeId {
        while let TypeDesc::Var(id) = self.types.lookup(ty) {
            match self.subst.get(&id) {
                Some(&next) => ty = next,
                None => break,
            }
        }
        ty
    }

    /// Resolve placeholders everywhere inside `ty`, not only at the top.
    pub fn resolve_deep(&self, ty: TypeId) -> TypeId {
        let ty = self.resolve(ty);
        match self.types.lookup(ty) {
            TypeDesc::Atom(_) | TypeDesc::Var(_) => ty,
            TypeDesc::Array(elem) => self.types.array(self.resolve_deep(elem)),
            TypeDesc::Tuple(elems) => {
                let elems: Vec<_> = elems.iter().map(|&e| self.resolve_deep(e)).collect();
                self.types.tuple(&elems)
            }
            TypeDesc::Function { ins, outs } => {
                let ins: Vec<_> = ins.iter().map(|&e| self.resolve_deep(e)).collect();
                let outs: Vec<_> = outs.iter().map(|&e| self.resolve_deep(e)).collect();
                self.types.function(&ins, &outs)
            }
        }
    }

    /// Check if placeholder `id` occurs in type `t`.
    ///
    /// Prevents creating infinite types like `a = [a]`.
    fn occurs_in(&self, id: u32, t: TypeId) -> bool {
        match self.types.lookup(self.resolve(t)) {
            TypeDesc::Var(other) => other == id,
            TypeDesc::Atom(_) => false,
            TypeDesc::Array(elem) => self.occurs_in(id, elem),
            TypeDesc::Tuple(elems) => elems.iter().any(|&e| self.occurs_in(id, e)),
            TypeDesc::Function { ins, outs } => ins
                .iter()
                .chain(outs.iter())
                .any(|&e| self.occurs_in(id, e)),
        }
    }

    fn bind(&mut self, id: u32, ty: TypeId) -> Result<TypeId, Error> {
        if self.occurs_in(id, ty) {
            return Err(Error::OccursCheckFailed {
                type_var: format!("'{}", id),
                ty: self.types.display(ty),
            });
        }
        self.subst.insert(id, ty);
        Ok(ty)
    }

    /// Checks an actual stack type against an expected input type.
    ///
    /// An expected `Var` accepts anything without recording a binding. An
    /// unresolved actual placeholder is refined to the expected type.
    pub fn expect(&mut self, expected: TypeId, actual: TypeId) -> Result<(), Error> {
        if self.types.is_var(expected) {
            return Ok(());
        }
        let actual = self.resolve(actual);
        if let TypeDesc::Var(id) = self.types.lookup(actual) {
            self.bind(id, expected)?;
            return Ok(());
        }
        if self.types.matches(expected, actual) {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                left: self.types.display(expected),
                right: self.types.display(actual),
            })
        }
    }

    /// Unify two types, binding placeholders along the way.
    pub fn unifies_to(&mut self, t1: TypeId, t2: TypeId) -> Result<TypeId, Error> {
        let t1 = self.resolve(t1);
        let t2 = self.resolve(t2);

        if t1 == t2 {
            return Ok(t1);
        }

        match (self.types.lookup(t1), self.types.lookup(t2)) {
            (TypeDesc::Var(id), _) => self.bind(id, t2),
            (_, TypeDesc::Var(id)) => self.bind(id, t1),
            (TypeDesc::Array(e1), TypeDesc::Array(e2)) => {
                let elem = self.unifies_to(e1, e2)?;
                Ok(self.types.array(elem))
            }
            (TypeDesc::Tuple(e1), TypeDesc::Tuple(e2)) => {
                let elems = self.unify_all(e1, e2)?;
                Ok(self.types.tuple(&elems))
            }
            (
                TypeDesc::Function { ins: i1, outs: o1 },
                TypeDesc::Function { ins: i2, outs: o2 },
            ) => {
                let ins = self.unify_all(i1, i2)?;
                let outs = self.unify_all(o1, o2)?;
                Ok(self.types.function(&ins, &outs))
            }
            _ => self.types.unify(t1, t2).ok_or_else(|| Error::TypeMismatch {
                left: self.types.display(t1),
                right: self.types.display(t2),
            }),
        }
    }

    fn unify_all(&mut self, a: &[TypeId], b: &[TypeId]) -> Result<Vec<TypeId>, Error> {
        if a.len() != b.len() {
            return Err(Error::ArityMismatch {
                expected: a.len(),
                found: b.len(),
            });
        }
        a.iter()
            .zip(b)
            .map(|(&x, &y)| self.unifies_to(x, y))
            .collect()
    }

    /// Copies `ty`, replacing each positional `Var` with a placeholder fresh
    /// to this call site. `fresh` memoizes so repeated vars stay shared.
    pub fn instantiate(&mut self, ty: TypeId, fresh: &mut HashMap<u32, TypeId>) -> TypeId {
        match self.types.lookup(ty) {
            TypeDesc::Atom(_) => ty,
            TypeDesc::Var(id) => {
                if let Some(&t) = fresh.get(&id) {
                    return t;
                }
                let t = self.fresh();
                fresh.insert(id, t);
                t
            }
            TypeDesc::Array(elem) => {
                let elem = self.instantiate(elem, fresh);
                self.types.array(elem)
            }
            TypeDesc::Tuple(elems) => {
                let elems: Vec<_> = elems.iter().map(|&e| self.instantiate(e, fresh)).collect();
                self.types.tuple(&elems)
            }
            TypeDesc::Function { ins, outs } => {
                let ins: Vec<_> = ins.iter().map(|&e| self.instantiate(e, fresh)).collect();
                let outs: Vec<_> = outs.iter().map(|&e| self.instantiate(e, fresh)).collect();
                self.types.function(&ins, &outs)
            }
        }
    }
}
