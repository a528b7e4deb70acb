//! Generic frame stack shared by the verifier and the evaluator.
//!
//! Both phases walk the program the same way: a frame visits the elements
//! `[cursor, end)` of one sequence node, and when the cursor reaches `end`
//! the frame's [`Pending`] callback decides what happens next. The verifier
//! carries abstract types on its operand stack and the evaluator concrete
//! values; everything phase-specific lives in the frame's `ext` payload.
//!
//! ```text
//! (def (f x) (+ x 1))   frame { scope: def, seq: def, cursor: 2, end: 3 }
//!            (+ x 1)    frame { scope: call, seq: call, cursor: 1, end: 3,
//!                               pending: InvokeNative(+) }
//! ```

use core::ops::{Index, IndexMut};

use crate::registry::NativeId;
use crate::space::{Node, NodeSpace};

/// What to do when a frame's cursor reaches its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    /// Plain scope; pop and continue in the parent.
    None,
    /// The values pushed since entry are the arguments of a native call.
    InvokeNative(NativeId),
    /// The values pushed since entry are the arguments of a function call.
    InvokeFunction(Node),
    /// The condition of an `if` has been pushed; choose an arm.
    Conditional,
    /// Verifier only: arm 0 has been simulated.
    Branch0Taken,
    /// Verifier only: arm 1 has been simulated; unify it with arm 0.
    BranchUnify,
}

#[derive(Debug, Clone)]
pub struct Frame<X> {
    /// Node whose variables and bindings this frame owns.
    pub scope: Node,
    /// Sequence whose elements are visited.
    pub seq: Node,
    pub cursor: usize,
    pub end: usize,
    /// Operand-stack length at entry.
    pub base: usize,
    pub pending: Pending,
    pub ext: X,
}

impl<X> Frame<X> {
    pub fn at_end(&self) -> bool {
        self.cursor >= self.end
    }
}

/// One step of the shared traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The top frame yielded its next element; the cursor has moved past it.
    Element(Node),
    /// The top frame is exhausted; run its pending callback.
    End,
    /// No frames are left.
    Done,
}

/// Frame stack with peak-depth tracking.
#[derive(Debug)]
pub struct ScopeStack<X> {
    frames: Vec<Frame<X>>,
    peak: usize,
}

impl<X> Default for ScopeStack<X> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X> ScopeStack<X> {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            peak: 0,
        }
    }

    pub fn push(&mut self, frame: Frame<X>) {
        self.frames.push(frame);
        self.peak = self.peak.max(self.frames.len());
    }

    pub fn pop(&mut self) -> Option<Frame<X>> {
        self.frames.pop()
    }

    pub fn top(&self) -> Option<&Frame<X>> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Frame<X>> {
        self.frames.last_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Frame<X>> {
        self.frames.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Frame<X>> {
        self.frames.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Deepest the stack has been since creation or the last [`clear`](Self::clear).
    pub fn peak(&self) -> usize {
        self.peak
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.peak = 0;
    }

    /// Frames from bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Frame<X>> {
        self.frames.iter()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut Frame<X>> {
        self.frames.iter_mut()
    }

    /// Advances the top frame by one element.
    pub fn step(&mut self, space: &NodeSpace<'_>) -> Step {
        match self.frames.last_mut() {
            None => Step::Done,
            Some(frame) if frame.at_end() => Step::End,
            Some(frame) => {
                let node = space.elements(frame.seq)[frame.cursor];
                frame.cursor += 1;
                Step::Element(node)
            }
        }
    }
}

impl<X> Index<usize> for ScopeStack<X> {
    type Output = Frame<X>;

    fn index(&self, index: usize) -> &Frame<X> {
        &self.frames[index]
    }
}

impl<X> IndexMut<usize> for ScopeStack<X> {
    fn index_mut(&mut self, index: usize) -> &mut Frame<X> {
        &mut self.frames[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;

    fn frame(scope: Node, end: usize) -> Frame<()> {
        Frame {
            scope,
            seq: scope,
            cursor: 0,
            end,
            base: 0,
            pending: Pending::None,
            ext: (),
        }
    }

    #[test]
    fn test_step_walks_elements_then_ends() {
        let arena = Bump::new();
        let mut space = NodeSpace::new(&arena);
        let a = space.token("a", false);
        let b = space.token("b", false);
        let seq = space.seq(&[a, b]);

        let mut stack = ScopeStack::new();
        assert_eq!(stack.step(&space), Step::Done);

        stack.push(frame(seq, 2));
        assert_eq!(stack.step(&space), Step::Element(a));
        assert_eq!(stack.step(&space), Step::Element(b));
        assert_eq!(stack.step(&space), Step::End);
        assert!(stack.top().is_some_and(Frame::at_end));
        stack.pop();
        assert_eq!(stack.step(&space), Step::Done);
    }

    #[test]
    fn test_peak_tracking() {
        let arena = Bump::new();
        let mut space = NodeSpace::new(&arena);
        let seq = space.seq(&[]);

        let mut stack = ScopeStack::new();
        for _ in 0..3 {
            stack.push(frame(seq, 0));
        }
        stack.pop();
        stack.pop();
        stack.push(frame(seq, 0));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.peak(), 3);
        stack.clear();
        assert_eq!(stack.peak(), 0);
    }
}
