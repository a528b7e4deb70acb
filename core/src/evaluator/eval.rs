//! Core evaluation loop.

use tracing::{debug, trace};

use crate::annotation::NodeRole;
use crate::api::ExecutionOptions;
use crate::evaluator::RuntimeError;
use crate::registry::{NativeId, Outputs, Registry};
use crate::scope_stack::{Frame, Pending, ScopeStack, Step};
use crate::space::{Node, NodeSpace};
use crate::types::manager::TypeManager;
use crate::values::Value;
use crate::verifier::Verified;

#[derive(Debug)]
struct EvalExt {
    /// Index of this frame's first variable slot.
    vars_base: usize,
}

type EvalFrame = Frame<EvalExt>;

/// Executes a verified program over a caller-owned operand stack.
///
/// Values move between three owners: the operand stack, the variable
/// slots and the native output buffer. Every value is dropped exactly once,
/// including when a run fails halfway.
pub struct Evaluator<'e, 't> {
    space: &'e NodeSpace<'e>,
    verified: &'e Verified,
    registry: &'e Registry,
    types: &'e TypeManager<'t>,
    options: ExecutionOptions,
    frames: ScopeStack<EvalExt>,
    vars: Vec<Value>,
}

impl<'e, 't> Evaluator<'e, 't> {
    pub fn new(
        space: &'e NodeSpace<'e>,
        verified: &'e Verified,
        registry: &'e Registry,
        types: &'e TypeManager<'t>,
        options: ExecutionOptions,
    ) -> Self {
        Self {
            space,
            verified,
            registry,
            types,
            options,
            frames: ScopeStack::new(),
            vars: Vec::new(),
        }
    }

    /// Deepest frame stack reached by the last run.
    pub fn peak_depth(&self) -> usize {
        self.frames.peak()
    }

    /// Runs the program. On success its outputs replace its inputs on
    /// `stack`; on failure `stack` holds whatever was left when it stopped.
    pub fn run(&mut self, stack: &mut Vec<Value>) -> Result<(), RuntimeError> {
        self.frames.clear();
        self.vars.clear();
        self.check_inputs(stack)?;

        debug!(inputs = stack.len(), "running program");
        let result = self.start(stack);
        if result.is_err() {
            self.teardown();
        }
        debug!(
            outputs = stack.len(),
            peak_depth = self.frames.peak(),
            ok = result.is_ok(),
            "run finished"
        );
        result
    }

    fn start(&mut self, stack: &mut Vec<Value>) -> Result<(), RuntimeError> {
        self.push_frame(self.verified.root(), 0, Pending::None, stack.len())?;
        self.bind(self.verified.root_params(), None, stack)?;
        self.drive(stack)
    }

    fn check_inputs(&self, stack: &[Value]) -> Result<(), RuntimeError> {
        let ins = &self.verified.root_signature().ins;
        if stack.len() < ins.len() {
            return Err(RuntimeError::mismatch(
                None,
                format!(
                    "program expects {} input(s), {} given",
                    ins.len(),
                    stack.len()
                ),
            ));
        }
        let start = stack.len() - ins.len();
        for (k, (&expected, value)) in ins.iter().zip(&stack[start..]).enumerate() {
            let actual = value.ty(self.types);
            if !self.types.matches(expected, actual) {
                return Err(RuntimeError::mismatch(
                    None,
                    format!(
                        "input {} should be {}, found {}",
                        k + 1,
                        self.types.display(expected),
                        self.types.display(actual)
                    ),
                ));
            }
        }
        Ok(())
    }

    fn drive(&mut self, stack: &mut Vec<Value>) -> Result<(), RuntimeError> {
        loop {
            match self.frames.step(self.space) {
                Step::Done => return Ok(()),
                Step::End => self.finish_frame(stack)?,
                Step::Element(node) => self.dispatch(node, stack)?,
            }
        }
    }

    fn dispatch(&mut self, node: Node, stack: &mut Vec<Value>) -> Result<(), RuntimeError> {
        trace!(node = %node, depth = self.frames.len(), stack = stack.len(), "step");
        let verified = self.verified;
        let Some(role) = verified.annotations().role(node) else {
            return Err(RuntimeError::mismatch(
                Some(node),
                format!("`{}` was never verified", self.space.display(node)),
            ));
        };

        match role {
            NodeRole::Literal(value) => stack.push(value.clone()),
            NodeRole::Variable { scope, slot } => {
                let value = self.read_var(*scope, *slot, node)?;
                stack.push(value);
            }
            NodeRole::Native(id) => self.call_native(*id, node, stack)?,
            NodeRole::Function(def) => self.enter_function(*def, node, stack)?,
            NodeRole::CallNative(id) => {
                self.push_frame(node, 1, Pending::InvokeNative(*id), stack.len())?
            }
            NodeRole::CallFunction(def) => {
                self.push_frame(node, 1, Pending::InvokeFunction(*def), stack.len())?
            }
            NodeRole::Bind { count } => {
                let count = *count as usize;
                self.bind(count, Some(node), stack)?;
                if let Some(frame) = self.frames.top_mut() {
                    frame.cursor += count + 1;
                }
            }
            NodeRole::Drop => {
                if stack.pop().is_none() {
                    return Err(RuntimeError::mismatch(Some(node), "`drop` on an empty stack"));
                }
            }
            NodeRole::Def { .. } | NodeRole::BindName | NodeRole::BindEnd => {}
            NodeRole::If => self.push_frame(node, 1, Pending::Conditional, stack.len())?,
            NodeRole::Block => self.push_frame(node, 1, Pending::None, stack.len())?,
        }
        Ok(())
    }

    fn finish_frame(&mut self, stack: &mut Vec<Value>) -> Result<(), RuntimeError> {
        let Some(frame) = self.frames.top() else {
            return Ok(());
        };
        let (pending, call, base) = (frame.pending, frame.scope, frame.base);
        match pending {
            Pending::None | Pending::Branch0Taken | Pending::BranchUnify => {
                self.leave_frame();
                Ok(())
            }
            Pending::InvokeNative(id) => {
                self.check_arguments(call, self.registry.native(id).ins.len(), base, stack)?;
                self.leave_frame();
                self.call_native(id, call, stack)
            }
            Pending::InvokeFunction(def) => {
                let arity = self.verified.signature(def).map_or(0, |sig| sig.ins.len());
                self.check_arguments(call, arity, base, stack)?;
                self.leave_frame();
                self.enter_function(def, call, stack)
            }
            Pending::Conditional => self.choose_arm(stack),
        }
    }

    /// A call form's arguments are exactly the values pushed since it was
    /// entered.
    pub(super) fn check_arguments(
        &self,
        call: Node,
        arity: usize,
        base: usize,
        stack: &[Value],
    ) -> Result<(), RuntimeError> {
        if stack.len().checked_sub(base) == Some(arity) {
            return Ok(());
        }
        Err(RuntimeError::mismatch(
            Some(call),
            format!(
                "`{}` needs {} argument(s), its call left {} value(s) above {}",
                self.space.display(call),
                arity,
                stack.len().saturating_sub(base),
                base
            ),
        ))
    }

    fn choose_arm(&mut self, stack: &mut Vec<Value>) -> Result<(), RuntimeError> {
        let node = self.frames.top().map(|f| f.scope);
        let condition = match stack.pop() {
            Some(Value::Bool(b)) => b,
            Some(other) => {
                return Err(RuntimeError::mismatch(
                    node,
                    format!("`if` condition is {}, not a bool", other),
                ));
            }
            None => return Err(RuntimeError::mismatch(node, "`if` condition is missing")),
        };
        let has_else = node.is_some_and(|n| self.space.seq_len(n) == 4);
        trace!(condition, "branch");

        let arm = match (condition, has_else) {
            (true, _) => 2,
            (false, true) => 3,
            (false, false) => {
                self.leave_frame();
                return Ok(());
            }
        };
        if let Some(frame) = self.frames.top_mut() {
            frame.cursor = arm;
            frame.end = arm + 1;
            frame.pending = Pending::None;
        }
        Ok(())
    }

    fn call_native(
        &mut self,
        id: NativeId,
        node: Node,
        stack: &mut Vec<Value>,
    ) -> Result<(), RuntimeError> {
        let native = self.registry.native(id);
        let arity = native.ins.len();
        if stack.len() < arity {
            return Err(RuntimeError::mismatch(
                Some(node),
                format!(
                    "`{}` needs {} value(s), {} on the stack",
                    native.name,
                    arity,
                    stack.len()
                ),
            ));
        }
        let start = stack.len() - arity;
        for (&expected, value) in native.ins.iter().zip(&stack[start..]) {
            let actual = value.ty(self.types);
            if !self.types.matches(expected, actual) {
                return Err(RuntimeError::mismatch(
                    Some(node),
                    format!(
                        "`{}` expects {}, found {}",
                        native.name,
                        self.types.display(expected),
                        self.types.display(actual)
                    ),
                ));
            }
        }

        let mut out = Outputs::new();
        (native.call)(&stack[start..], &mut out).map_err(|err| {
            RuntimeError::mismatch(Some(node), format!("`{}` failed: {}", native.name, err))
        })?;
        if out.len() != native.outs.len() {
            return Err(RuntimeError::mismatch(
                Some(node),
                format!(
                    "`{}` produced {} value(s) instead of {}",
                    native.name,
                    out.len(),
                    native.outs.len()
                ),
            ));
        }
        stack.truncate(start);
        stack.extend(out.into_values());
        Ok(())
    }

    fn enter_function(
        &mut self,
        def: Node,
        node: Node,
        stack: &mut Vec<Value>,
    ) -> Result<(), RuntimeError> {
        self.collapse(def);
        let params = match self.verified.annotations().role(def) {
            Some(NodeRole::Def { params }) => *params as usize,
            _ => 0,
        };
        self.push_frame(def, 2, Pending::None, stack.len())?;
        self.bind(params, Some(node), stack)
    }

    /// Pops exhausted plain frames before a call so that tail calls run in
    /// constant frame depth. Frames of scopes enclosing `def` stay, since
    /// the callee may read their variables.
    fn collapse(&mut self, def: Node) {
        while let Some(frame) = self.frames.top() {
            if !frame.at_end()
                || frame.pending != Pending::None
                || self.verified.encloses(frame.scope, def)
            {
                break;
            }
            self.leave_frame();
        }
    }

    /// Moves the top `count` operands into new variable slots of the top
    /// frame, deepest value first.
    fn bind(
        &mut self,
        count: usize,
        node: Option<Node>,
        stack: &mut Vec<Value>,
    ) -> Result<(), RuntimeError> {
        if stack.len() < count {
            return Err(RuntimeError::mismatch(
                node,
                format!("binding needs {} value(s), {} on the stack", count, stack.len()),
            ));
        }
        let values = stack.split_off(stack.len() - count);
        self.vars.extend(values);
        Ok(())
    }

    fn read_var(&self, scope: Node, slot: u32, node: Node) -> Result<Value, RuntimeError> {
        self.frames
            .iter()
            .rev()
            .find(|frame| frame.scope == scope)
            .and_then(|frame| self.vars.get(frame.ext.vars_base + slot as usize))
            .cloned()
            .ok_or_else(|| {
                RuntimeError::mismatch(
                    Some(node),
                    format!("`{}` is not bound here", self.space.display(node)),
                )
            })
    }

    fn push_frame(
        &mut self,
        node: Node,
        cursor: usize,
        pending: Pending,
        base: usize,
    ) -> Result<(), RuntimeError> {
        if self.frames.len() >= self.options.max_frames {
            return Err(RuntimeError::resource(
                Some(node),
                format!(
                    "frame stack exceeds the limit of {} frames",
                    self.options.max_frames
                ),
            ));
        }
        let end = match pending {
            Pending::Conditional => 2,
            _ => self.space.seq_len(node),
        };
        self.frames.push(EvalFrame {
            scope: node,
            seq: node,
            cursor,
            end,
            base,
            pending,
            ext: EvalExt {
                vars_base: self.vars.len(),
            },
        });
        Ok(())
    }

    /// Pops the top frame, dropping its variables newest first.
    fn leave_frame(&mut self) {
        if let Some(frame) = self.frames.pop() {
            while self.vars.len() > frame.ext.vars_base {
                self.vars.pop();
            }
        }
    }

    fn teardown(&mut self) {
        while !self.frames.is_empty() {
            self.leave_frame();
        }
        while self.vars.pop().is_some() {}
    }
}
