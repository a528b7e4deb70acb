use core::fmt;

use crate::space::Node;
use crate::types::{TypeId, manager::TypeManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InferState {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutType {
    Concrete(TypeId),
    /// Whatever type was at input position `k`.
    SameAsInput(usize),
}

/// Net stack effect of a scope: consumes `ins` (top-most last) and
/// produces `outs`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockSignature {
    pub ins: Vec<TypeId>,
    pub outs: Vec<OutType>,
}

impl BlockSignature {
    /// The type an output has when the inputs are exactly `ins`.
    pub fn out_type(&self, index: usize) -> Option<TypeId> {
        match *self.outs.get(index)? {
            OutType::Concrete(ty) => Some(ty),
            OutType::SameAsInput(k) => self.ins.get(k).copied(),
        }
    }

    pub fn display<'s, 't>(&'s self, types: &'s TypeManager<'t>) -> DisplaySignature<'s, 't> {
        DisplaySignature { sig: self, types }
    }
}

pub struct DisplaySignature<'s, 't> {
    sig: &'s BlockSignature,
    types: &'s TypeManager<'t>,
}

impl fmt::Display for DisplaySignature<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outs: Vec<String> = (0..self.sig.outs.len())
            .filter_map(|i| self.sig.out_type(i))
            .map(|ty| self.types.display(ty))
            .collect();
        write!(
            f,
            "({}) -> ({})",
            self.types.display_list(&self.sig.ins),
            outs.join(" ")
        )
    }
}

/// Verification record of one scope-defining node.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Block {
    pub state: InferState,
    pub signature: Option<BlockSignature>,
    /// Lexically enclosing scope.
    pub parent: Option<Node>,
    pub vars: u32,
    /// Sequence and index the node was last entered from (`if` nodes).
    pub origin: Option<(Node, usize)>,
    /// Binding counter when the node was last entered.
    pub horizon: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DefKind {
    Variable { ty: TypeId, scope: Node, slot: u32 },
    Function { def: Node },
}

/// A name binding visible to its owning scope and everything nested in it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Def<'v> {
    pub name: &'v str,
    /// Monotonic binding counter.
    pub seq: u32,
    pub kind: DefKind,
}
