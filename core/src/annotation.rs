//! Per-node resolved roles.
//!
//! The verifier writes one [`NodeRole`] per visited node (rewriting it when
//! a node is rechecked); the evaluator only reads. Scope nodes also record
//! how many variable slots they introduce.

use crate::registry::NativeId;
use crate::space::Node;
use crate::values::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeRole {
    /// Constant pushed by copy.
    Literal(Value),
    /// Read of slot `slot` owned by the innermost active frame over `scope`.
    Variable { scope: Node, slot: u32 },
    /// Bare native reference: consumes its inputs straight off the stack.
    Native(NativeId),
    /// Bare reference to the function defined by the given `def` node.
    Function(Node),
    /// `(native args...)`
    CallNative(NativeId),
    /// `(function args...)`
    CallFunction(Node),
    /// `let` token binding the next `count` names.
    Bind { count: u32 },
    BindName,
    /// `in` token closing a binding.
    BindEnd,
    Drop,
    /// `(def ...)` form; `params` names bound on body entry.
    Def { params: u32 },
    /// `(if c then [else])`
    If,
    /// `(blk ...)`
    Block,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    pub role: Option<NodeRole>,
    /// Variable slots the scope rooted at this node introduces.
    pub vars: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationTable {
    slots: Vec<Annotation>,
}

impl AnnotationTable {
    pub fn new(nodes: usize) -> Self {
        Self {
            slots: vec![Annotation::default(); nodes],
        }
    }

    pub fn role(&self, node: Node) -> Option<&NodeRole> {
        self.slots.get(node.index()).and_then(|a| a.role.as_ref())
    }

    pub fn set_role(&mut self, node: Node, role: NodeRole) {
        self.slots[node.index()].role = Some(role);
    }

    pub fn vars(&self, node: Node) -> u32 {
        self.slots.get(node.index()).map_or(0, |a| a.vars)
    }

    pub fn set_vars(&mut self, node: Node, vars: u32) {
        self.slots[node.index()].vars = vars;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
