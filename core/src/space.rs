//! Immutable program store.
//!
//! A program is a tree of tokens and ordered sequences. Nodes are small
//! copyable handles into a `NodeSpace`; token text and child lists live in
//! the arena the space borrows, so the space can hand out `&'a` data that
//! outlives any borrow of the space itself.

use bumpalo::Bump;
use core::fmt;
use static_assertions::assert_eq_size;

use crate::values::escape_string;

/// Handle to a token or sequence in a [`NodeSpace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node(pub(crate) u32);

assert_eq_size!(Node, u32);

impl Node {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy)]
enum NodeData<'a> {
    Token { text: &'a str, quoted: bool },
    Seq(&'a [Node]),
}

pub struct NodeSpace<'a> {
    arena: &'a Bump,
    nodes: Vec<NodeData<'a>>,
}

impl<'a> NodeSpace<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            arena,
            nodes: Vec::new(),
        }
    }

    pub fn token(&mut self, text: &str, quoted: bool) -> Node {
        let text = self.arena.alloc_str(text);
        self.push(NodeData::Token { text, quoted })
    }

    /// Creates a sequence over already-built children.
    pub fn seq(&mut self, elements: &[Node]) -> Node {
        debug_assert!(elements.iter().all(|n| n.index() < self.nodes.len()));
        let elements = self.arena.alloc_slice_copy(elements);
        self.push(NodeData::Seq(elements))
    }

    fn push(&mut self, data: NodeData<'a>) -> Node {
        let id = u32::try_from(self.nodes.len()).unwrap_or(u32::MAX);
        self.nodes.push(data);
        Node(id)
    }

    /// Number of nodes ever created; valid handles are `0..len()`.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_token(&self, node: Node) -> bool {
        matches!(self.nodes[node.index()], NodeData::Token { .. })
    }

    pub fn is_seq(&self, node: Node) -> bool {
        matches!(self.nodes[node.index()], NodeData::Seq(_))
    }

    /// Token text, or `None` for sequences.
    pub fn text(&self, node: Node) -> Option<&'a str> {
        match self.nodes[node.index()] {
            NodeData::Token { text, .. } => Some(text),
            NodeData::Seq(_) => None,
        }
    }

    pub fn is_quoted(&self, node: Node) -> bool {
        matches!(self.nodes[node.index()], NodeData::Token { quoted: true, .. })
    }

    /// Children of a sequence; empty for tokens.
    pub fn elements(&self, node: Node) -> &'a [Node] {
        match self.nodes[node.index()] {
            NodeData::Seq(elements) => elements,
            NodeData::Token { .. } => &[],
        }
    }

    pub fn seq_len(&self, node: Node) -> usize {
        self.elements(node).len()
    }

    /// Renders a node back to source form, mostly for logs and test output.
    pub fn display(&self, node: Node) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    fn write_node(&self, node: Node, out: &mut String) {
        match self.nodes[node.index()] {
            NodeData::Token { text, quoted: false } => out.push_str(text),
            NodeData::Token { text, quoted: true } => {
                out.push('"');
                out.push_str(&escape_string(text));
                out.push('"');
            }
            NodeData::Seq(elements) => {
                out.push('(');
                for (i, &child) in elements.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    self.write_node(child, out);
                }
                out.push(')');
            }
        }
    }
}
