use crate::types::types::{TypeDesc, TypeId};
use bumpalo::Bump;
use core::cell::RefCell;
use hashbrown::{DefaultHashBuilder, HashMap};

/// Atom indices every type manager starts with.
pub const BOOL_ATOM: u32 = 0;
pub const NUM_ATOM: u32 = 1;
pub const STRING_ATOM: u32 = 2;

/// Interning table for type descriptors.
///
/// Descriptors and their element slices live in the arena; ids index into
/// `descs`. All methods take `&self` so the table can be shared by the
/// registry, the verifier and the evaluator at once.
pub struct TypeManager<'a> {
    // Arena holding all descriptor slices from this TypeManager.
    arena: &'a Bump,
    descs: RefCell<Vec<TypeDesc<'a>>>,
    interned: RefCell<HashMap<TypeDesc<'a>, TypeId, DefaultHashBuilder, &'a Bump>>,
    atom_names: RefCell<Vec<&'a str>>,
}

impl<'a> TypeManager<'a> {
    pub fn new(arena: &'a Bump) -> &'a Self {
        let manager = arena.alloc(Self {
            arena,
            descs: RefCell::new(Vec::new()),
            interned: RefCell::new(HashMap::new_in(arena)),
            atom_names: RefCell::new(Vec::new()),
        });
        manager.new_atom("bool");
        manager.new_atom("num");
        manager.new_atom("string");
        manager
    }

    fn intern(&self, desc: TypeDesc<'a>) -> TypeId {
        if let Some(&id) = self.interned.borrow().get(&desc) {
            return id;
        }
        let mut descs = self.descs.borrow_mut();
        let id = TypeId(descs.len() as u32);
        descs.push(desc);
        self.interned.borrow_mut().insert(desc, id);
        id
    }

    pub fn lookup(&self, id: TypeId) -> TypeDesc<'a> {
        self.descs.borrow()[id.index()]
    }

    /// Registers a new atomic type and returns its id.
    pub fn new_atom(&self, name: &str) -> TypeId {
        let mut names = self.atom_names.borrow_mut();
        let index = names.len() as u32;
        names.push(self.arena.alloc_str(name));
        drop(names);
        self.intern(TypeDesc::Atom(index))
    }

    pub fn atom_count(&self) -> usize {
        self.atom_names.borrow().len()
    }

    pub fn atom_name(&self, index: u32) -> Option<&'a str> {
        self.atom_names.borrow().get(index as usize).copied()
    }

    // Factory methods for types.
    pub fn atom(&self, index: u32) -> TypeId {
        debug_assert!((index as usize) < self.atom_count(), "unregistered atom");
        self.intern(TypeDesc::Atom(index))
    }
    pub fn bool(&self) -> TypeId {
        self.atom(BOOL_ATOM)
    }
    pub fn num(&self) -> TypeId {
        self.atom(NUM_ATOM)
    }
    pub fn string(&self) -> TypeId {
        self.atom(STRING_ATOM)
    }
    pub fn var(&self, index: u32) -> TypeId {
        self.intern(TypeDesc::Var(index))
    }
    pub fn array(&self, elem: TypeId) -> TypeId {
        self.intern(TypeDesc::Array(elem))
    }
    pub fn tuple(&self, elems: &[TypeId]) -> TypeId {
        let elems = self.arena.alloc_slice_copy(elems);
        self.intern(TypeDesc::Tuple(elems))
    }
    pub fn function(&self, ins: &[TypeId], outs: &[TypeId]) -> TypeId {
        let ins = self.arena.alloc_slice_copy(ins);
        let outs = self.arena.alloc_slice_copy(outs);
        self.intern(TypeDesc::Function { ins, outs })
    }

    pub fn is_var(&self, id: TypeId) -> bool {
        self.lookup(id).is_var()
    }

    /// Structural compatibility check. A `Var` on either side matches
    /// anything.
    pub fn matches(&self, expected: TypeId, actual: TypeId) -> bool {
        if expected == actual {
            return true;
        }
        match (self.lookup(expected), self.lookup(actual)) {
            (TypeDesc::Var(_), _) | (_, TypeDesc::Var(_)) => true,
            (TypeDesc::Atom(a), TypeDesc::Atom(b)) => a == b,
            (TypeDesc::Array(a), TypeDesc::Array(b)) => self.matches(a, b),
            (TypeDesc::Tuple(a), TypeDesc::Tuple(b)) => self.all_match(a, b),
            (
                TypeDesc::Function { ins: ia, outs: oa },
                TypeDesc::Function { ins: ib, outs: ob },
            ) => self.all_match(ia, ib) && self.all_match(oa, ob),
            _ => false,
        }
    }

    fn all_match(&self, expected: &[TypeId], actual: &[TypeId]) -> bool {
        expected.len() == actual.len()
            && expected
                .iter()
                .zip(actual)
                .all(|(&e, &a)| self.matches(e, a))
    }

    /// Most specific type compatible with both sides, or `None`.
    ///
    /// A `Var` unifies with anything, yielding the other side. Arrays unify
    /// element-wise; tuples and functions only when their arities agree.
    pub fn unify(&self, a: TypeId, b: TypeId) -> Option<TypeId> {
        if a == b {
            return Some(a);
        }
        match (self.lookup(a), self.lookup(b)) {
            (TypeDesc::Var(_), _) => Some(b),
            (_, TypeDesc::Var(_)) => Some(a),
            (TypeDesc::Atom(_), TypeDesc::Atom(_)) => None,
            (TypeDesc::Array(ea), TypeDesc::Array(eb)) => {
                self.unify(ea, eb).map(|elem| self.array(elem))
            }
            (TypeDesc::Tuple(ea), TypeDesc::Tuple(eb)) => {
                let elems = self.unify_all(ea, eb)?;
                Some(self.tuple(&elems))
            }
            (
                TypeDesc::Function { ins: ia, outs: oa },
                TypeDesc::Function { ins: ib, outs: ob },
            ) => {
                let ins = self.unify_all(ia, ib)?;
                let outs = self.unify_all(oa, ob)?;
                Some(self.function(&ins, &outs))
            }
            _ => None,
        }
    }

    fn unify_all(&self, a: &[TypeId], b: &[TypeId]) -> Option<Vec<TypeId>> {
        if a.len() != b.len() {
            return None;
        }
        a.iter().zip(b).map(|(&x, &y)| self.unify(x, y)).collect()
    }

    /// Human-readable rendering, e.g. `num`, `[num]`, `(num num) -> (bool)`.
    pub fn display(&self, id: TypeId) -> String {
        match self.lookup(id) {
            TypeDesc::Atom(index) => self.atom_name(index).unwrap_or("?").to_string(),
            TypeDesc::Var(index) => format!("'{}", index),
            TypeDesc::Array(elem) => format!("[{}]", self.display(elem)),
            TypeDesc::Tuple(elems) => format!("{{{}}}", self.display_list(elems)),
            TypeDesc::Function { ins, outs } => {
                format!("({}) -> ({})", self.display_list(ins), self.display_list(outs))
            }
        }
    }

    pub fn display_list(&self, ids: &[TypeId]) -> String {
        ids.iter()
            .map(|&id| self.display(id))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
