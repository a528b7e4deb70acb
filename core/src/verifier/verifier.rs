//! Abstract-stack type inference.
//!
//! The verifier walks the program with the same frame machinery the
//! evaluator uses, but its operand stack holds types. Every scope-defining
//! node (root, function body, call form, `if`, `blk`) ends up with a
//! canonical [`BlockSignature`], and every visited node gets a [`NodeRole`]
//! the evaluator dispatches on without further lookups.
//!
//! Function bodies are inferred lazily at their first use. A reference to a
//! function whose body is still being inferred is recursion; the verifier
//! then abandons the innermost open `if` arm in favour of the other one and
//! queues that `if` for a second look once the function's signature is known.

use core::mem;
use core::ops::Range;
use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet, hash_map::Entry};
use tracing::{debug, trace};

use super::block::{Block, BlockSignature, Def, DefKind, InferState, OutType};
use super::error::TypeError;
use crate::annotation::{AnnotationTable, NodeRole};
use crate::api::VerifierOptions;
use crate::errors::ErrorKind;
use crate::registry::{NativeId, Registry};
use crate::scope_stack::{Frame, Pending, ScopeStack, Step};
use crate::space::{Node, NodeSpace};
use crate::types::unification::{self, Unification};
use crate::types::{TypeDesc, TypeId, manager::TypeManager};
use crate::values::Value;

const KEYWORDS: [&str; 6] = ["let", "in", "drop", "def", "if", "blk"];

static EMPTY_SIGNATURE: BlockSignature = BlockSignature {
    ins: Vec::new(),
    outs: Vec::new(),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Root,
    Body,
    /// `(blk ...)`
    Block,
    /// Call arguments and `if` conditions/arms.
    Inline,
    Recheck,
}

impl FrameKind {
    /// Isolated frames own a floor the abstract stack may grow under.
    fn is_isolated(self) -> bool {
        matches!(self, FrameKind::Root | FrameKind::Body | FrameKind::Recheck)
    }

    fn allows_defs(self) -> bool {
        matches!(self, FrameKind::Root | FrameKind::Body | FrameKind::Block)
    }
}

#[derive(Debug)]
struct VerifyExt {
    kind: FrameKind,
    floor: usize,
    /// Types consumed from below the frame's region, deepest first.
    ins: Vec<TypeId>,
    /// Raw effect of arm 0 while arm 1 is simulated.
    arm0: Option<(Vec<TypeId>, Vec<TypeId>)>,
}

impl VerifyExt {
    fn new(kind: FrameKind, floor: usize) -> Self {
        Self {
            kind,
            floor,
            ins: Vec::new(),
            arm0: None,
        }
    }
}

type VerifyFrame = Frame<VerifyExt>;

/// Start of the stack region a frame is accountable for.
fn region_start(frame: &VerifyFrame) -> usize {
    frame.base - frame.ext.ins.len()
}

fn prepend(ins: &mut Vec<TypeId>, mut front: Vec<TypeId>) {
    front.append(ins);
    *ins = front;
}

/// Result of a successful verification.
///
/// Holds everything the evaluator needs: node roles, per-scope variable
/// counts and every scope's signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Verified {
    root: Node,
    root_params: usize,
    annotations: AnnotationTable,
    blocks: HashMap<Node, Block>,
    arms: HashMap<Node, BlockSignature>,
}

impl Verified {
    pub fn root(&self) -> Node {
        self.root
    }

    /// Number of ambient names the root binds from the operand stack.
    pub fn root_params(&self) -> usize {
        self.root_params
    }

    pub fn annotations(&self) -> &AnnotationTable {
        &self.annotations
    }

    pub fn state(&self, node: Node) -> InferState {
        self.blocks.get(&node).map_or(InferState::NotStarted, |b| b.state)
    }

    pub fn signature(&self, node: Node) -> Option<&BlockSignature> {
        self.blocks.get(&node).and_then(|b| b.signature.as_ref())
    }

    /// Unified signature of an `if` arm.
    pub fn arm_signature(&self, arm: Node) -> Option<&BlockSignature> {
        self.arms.get(&arm)
    }

    pub fn root_signature(&self) -> &BlockSignature {
        self.signature(self.root).unwrap_or(&EMPTY_SIGNATURE)
    }

    /// Lexically enclosing scope of a scope-defining node.
    pub fn parent(&self, node: Node) -> Option<Node> {
        self.blocks.get(&node).and_then(|b| b.parent)
    }

    /// Whether `ancestor` strictly encloses `node`.
    pub fn encloses(&self, ancestor: Node, node: Node) -> bool {
        let mut current = self.parent(node);
        while let Some(scope) = current {
            if scope == ancestor {
                return true;
            }
            current = self.parent(scope);
        }
        false
    }
}

/// Infers signatures for the program rooted at `root`.
///
/// `params` name values the caller leaves on the operand stack; the root
/// binds them like function parameters, the deepest value to the first name.
pub fn verify<'v>(
    space: &'v NodeSpace<'v>,
    root: Node,
    types: &'v TypeManager<'_>,
    registry: &'v Registry,
    params: &[&'v str],
    options: &VerifierOptions,
) -> Result<Verified, TypeError> {
    let mut verifier = Verifier::new(space, types, registry, options);
    verifier.enter_root(root, params)?;
    verifier.run()?;
    verifier.settle()?;
    debug!(
        signature = %verifier.signature_of(root).display(types),
        blocks = verifier.blocks.len(),
        "verification finished"
    );
    Ok(Verified {
        root,
        root_params: params.len(),
        annotations: verifier.annotations,
        blocks: verifier.blocks,
        arms: verifier.arms,
    })
}

struct Verifier<'v, 't> {
    space: &'v NodeSpace<'v>,
    types: &'v TypeManager<'t>,
    registry: &'v Registry,
    infer_root_inputs: bool,
    unify: Unification<'v, 't>,
    stack: Vec<TypeId>,
    frames: ScopeStack<VerifyExt>,
    blocks: HashMap<Node, Block>,
    arms: HashMap<Node, BlockSignature>,
    bindings: HashMap<Node, Vec<Def<'v>>>,
    annotations: AnnotationTable,
    next_seq: u32,
    /// Every `def` hoisted so far, in discovery order.
    hoisted: Vec<Node>,
    recheck: VecDeque<Node>,
    rechecked: HashSet<Node>,
    /// Binding sequence numbers invisible to lookups during a recheck.
    hidden: Option<Range<u32>>,
    binding_root_params: bool,
}

impl<'v, 't> Verifier<'v, 't> {
    fn new(
        space: &'v NodeSpace<'v>,
        types: &'v TypeManager<'t>,
        registry: &'v Registry,
        options: &VerifierOptions,
    ) -> Self {
        Self {
            space,
            types,
            registry,
            infer_root_inputs: options.infer_root_inputs,
            unify: Unification::new(types),
            stack: Vec::new(),
            frames: ScopeStack::new(),
            blocks: HashMap::new(),
            arms: HashMap::new(),
            bindings: HashMap::new(),
            annotations: AnnotationTable::new(space.len()),
            next_seq: 0,
            hoisted: Vec::new(),
            recheck: VecDeque::new(),
            rechecked: HashSet::new(),
            hidden: None,
            binding_root_params: false,
        }
    }

    fn run(&mut self) -> Result<(), TypeError> {
        loop {
            match self.frames.step(self.space) {
                Step::Done => return Ok(()),
                Step::End => self.finish_frame()?,
                Step::Element(node) => self.dispatch(node)?,
            }
        }
    }

    /// Sweeps unreferenced definitions and rechecks queued `if` nodes until
    /// neither has work left.
    fn settle(&mut self) -> Result<(), TypeError> {
        loop {
            self.sweep()?;
            if self.recheck.is_empty() {
                return Ok(());
            }
            while let Some(node) = self.recheck.pop_front() {
                if self.rechecked.insert(node) {
                    self.recheck_if(node)?;
                }
            }
        }
    }

    fn sweep(&mut self) -> Result<(), TypeError> {
        let mut i = 0;
        while i < self.hoisted.len() {
            let def = self.hoisted[i];
            i += 1;
            if self.state(def) != InferState::NotStarted {
                continue;
            }
            debug!(function = self.def_name(def), "verifying unreferenced definition");
            self.stack.clear();
            self.enter_body(def)?;
            self.run()?;
        }
        Ok(())
    }

    fn recheck_if(&mut self, node: Node) -> Result<(), TypeError> {
        let Some(block) = self.blocks.get(&node) else {
            return Ok(());
        };
        let (Some((seq, index)), Some(parent)) = (block.origin, block.parent) else {
            return Ok(());
        };
        debug!(node = %self.space.display(node), "recheck");

        self.stack.clear();
        self.hidden = Some(block.horizon..self.next_seq);
        self.frames.push(Frame {
            scope: parent,
            seq,
            cursor: index,
            end: index + 1,
            base: 0,
            pending: Pending::None,
            ext: VerifyExt::new(FrameKind::Recheck, 0),
        });
        let result = self.run();
        self.hidden = None;
        result
    }

    // ---- dispatch ----

    fn dispatch(&mut self, node: Node) -> Result<(), TypeError> {
        trace!(
            node = %self.space.display(node),
            depth = self.frames.len(),
            stack = self.stack.len(),
            "visit"
        );
        if self.space.is_token(node) {
            self.dispatch_token(node)
        } else {
            self.dispatch_form(node)
        }
    }

    fn dispatch_token(&mut self, node: Node) -> Result<(), TypeError> {
        let text = self.space.text(node).unwrap_or_default();
        if self.space.is_quoted(node) {
            return self.push_literal(node, self.types.string(), Value::str(text));
        }

        match text {
            "let" => return self.bind(node),
            "drop" => {
                self.reserve(1, node)?;
                self.stack.pop();
                self.annotations.set_role(node, NodeRole::Drop);
                return Ok(());
            }
            "in" | "def" | "if" | "blk" => {
                return Err(TypeError::syntax(
                    node,
                    format!("`{}` cannot be used on its own here", text),
                ));
            }
            _ => {}
        }

        if let Some(id) = self.registry.find_native(text) {
            self.apply_native(id, node)?;
            self.annotations.set_role(node, NodeRole::Native(id));
            return Ok(());
        }

        if let Some(def) = self.lookup(text) {
            return match def.kind {
                DefKind::Variable { ty, scope, slot } => {
                    self.stack.push(ty);
                    self.annotations
                        .set_role(node, NodeRole::Variable { scope, slot });
                    Ok(())
                }
                DefKind::Function { def } => self.reference_function(node, def, false),
            };
        }

        if let Some((ty, value)) = self.registry.parse_literal(text) {
            return self.push_literal(node, ty, value);
        }

        Err(TypeError::new(
            ErrorKind::NameUndefined,
            node,
            format!("`{}` is not defined", text),
        ))
    }

    fn dispatch_form(&mut self, node: Node) -> Result<(), TypeError> {
        let Some(&head) = self.space.elements(node).first() else {
            return Err(TypeError::syntax(node, "empty call form"));
        };
        let text = match self.space.text(head) {
            Some(text) if !self.space.is_quoted(head) => text,
            _ => return Err(TypeError::syntax(head, "call head must be a name")),
        };

        match text {
            "def" => {
                let frame = self.top();
                if frame.pending != Pending::None || !frame.ext.kind.allows_defs() {
                    return Err(TypeError::syntax(
                        node,
                        "`def` is only allowed in the program body, a function body or a `blk`",
                    ));
                }
                // Hoisted when the enclosing scope was entered.
                return Ok(());
            }
            "if" => return self.enter_if(node),
            "blk" => return self.enter_block(node),
            "let" | "in" | "drop" => {
                return Err(TypeError::syntax(
                    head,
                    format!("`{}` cannot head a call form", text),
                ));
            }
            _ => {}
        }

        if let Some(id) = self.registry.find_native(text) {
            self.enter_call(node, Pending::InvokeNative(id));
            self.annotations.set_role(node, NodeRole::CallNative(id));
            return Ok(());
        }

        match self.lookup(text) {
            Some(Def {
                kind: DefKind::Function { def },
                ..
            }) => self.reference_function(node, def, true),
            Some(_) => Err(TypeError::syntax(
                head,
                format!("`{}` is a variable and cannot be called", text),
            )),
            None => Err(TypeError::new(
                ErrorKind::NameUndefined,
                head,
                format!("`{}` is not defined", text),
            )),
        }
    }

    fn reference_function(&mut self, node: Node, def: Node, call: bool) -> Result<(), TypeError> {
        match self.state(def) {
            InferState::NotStarted => {
                // Revisit the reference once the body has a signature.
                self.top_mut().cursor -= 1;
                self.enter_body(def)
            }
            InferState::InProgress => self.defer_recursion(node, def),
            InferState::Done if call => {
                self.enter_call(node, Pending::InvokeFunction(def));
                self.annotations.set_role(node, NodeRole::CallFunction(def));
                Ok(())
            }
            InferState::Done => {
                let sig = self.signature_of(def).clone();
                let callee = format!("`{}`", self.def_name(def));
                self.apply_signature(&sig.ins, &sig.outs, node, &callee)?;
                self.annotations.set_role(node, NodeRole::Function(def));
                Ok(())
            }
        }
    }

    fn push_literal(&mut self, node: Node, ty: TypeId, value: Value) -> Result<(), TypeError> {
        self.stack.push(ty);
        self.annotations.set_role(node, NodeRole::Literal(value));
        Ok(())
    }

    // ---- scopes ----

    fn enter_root(&mut self, root: Node, params: &[&'v str]) -> Result<(), TypeError> {
        if !self.space.is_seq(root) {
            return Err(TypeError::syntax(root, "a program must be a sequence"));
        }
        debug!(nodes = self.space.len(), params = params.len(), "verifying program");
        self.begin_block(root, None);
        self.frames.push(Frame {
            scope: root,
            seq: root,
            cursor: 0,
            end: self.space.seq_len(root),
            base: 0,
            pending: Pending::None,
            ext: VerifyExt::new(FrameKind::Root, 0),
        });
        self.hoist(root, 0)?;

        let names: Vec<_> = params.iter().map(|&name| (name, None)).collect();
        self.binding_root_params = true;
        let result = self.bind_names(root, &names, root);
        self.binding_root_params = false;
        result
    }

    fn enter_body(&mut self, def: Node) -> Result<(), TypeError> {
        let (name, params) = self.def_header(def)?;
        debug!(function = name, depth = self.frames.len(), "inferring body");
        self.begin_block(def, None);
        let base = self.stack.len();
        self.frames.push(Frame {
            scope: def,
            seq: def,
            cursor: 2,
            end: self.space.seq_len(def),
            base,
            pending: Pending::None,
            ext: VerifyExt::new(FrameKind::Body, base),
        });
        self.hoist(def, 2)?;

        let names: Vec<_> = params.iter().map(|&(name, node)| (name, Some(node))).collect();
        self.bind_names(def, &names, def)
    }

    fn enter_block(&mut self, node: Node) -> Result<(), TypeError> {
        let parent = self.top().scope;
        self.begin_block(node, Some(parent));
        self.frames.push(Frame {
            scope: node,
            seq: node,
            cursor: 1,
            end: self.space.seq_len(node),
            base: self.stack.len(),
            pending: Pending::None,
            ext: VerifyExt::new(FrameKind::Block, 0),
        });
        self.annotations.set_role(node, NodeRole::Block);
        self.hoist(node, 1)
    }

    fn enter_if(&mut self, node: Node) -> Result<(), TypeError> {
        let len = self.space.seq_len(node);
        if len != 3 && len != 4 {
            return Err(TypeError::syntax(
                node,
                "`if` takes a condition and one or two arms",
            ));
        }
        let frame = self.top();
        let (parent, origin) = (frame.scope, (frame.seq, frame.cursor - 1));
        self.begin_block(node, Some(parent));
        if let Some(block) = self.blocks.get_mut(&node) {
            block.origin = Some(origin);
        }
        self.frames.push(Frame {
            scope: node,
            seq: node,
            cursor: 1,
            end: 2,
            base: self.stack.len(),
            pending: Pending::Conditional,
            ext: VerifyExt::new(FrameKind::Inline, 0),
        });
        self.annotations.set_role(node, NodeRole::If);
        Ok(())
    }

    fn enter_call(&mut self, node: Node, pending: Pending) {
        let parent = self.top().scope;
        self.begin_block(node, Some(parent));
        self.frames.push(Frame {
            scope: node,
            seq: node,
            cursor: 1,
            end: self.space.seq_len(node),
            base: self.stack.len(),
            pending,
            ext: VerifyExt::new(FrameKind::Inline, 0),
        });
    }

    /// Resets a scope's record on entry. Definitions keep the parent they
    /// were hoisted into.
    fn begin_block(&mut self, node: Node, parent: Option<Node>) {
        let horizon = self.next_seq;
        let block = self.blocks.entry(node).or_default();
        block.state = InferState::InProgress;
        block.signature = None;
        block.vars = 0;
        block.horizon = horizon;
        if parent.is_some() {
            block.parent = parent;
        }
        self.bindings.remove(&node);
    }

    fn hoist(&mut self, scope: Node, start: usize) -> Result<(), TypeError> {
        let elements = self.space.elements(scope);
        for &node in elements.iter().skip(start) {
            if self.head_text(node) != Some("def") {
                continue;
            }
            let (name, params) = self.def_header(node)?;
            let seq = self.next_seq();
            self.bindings.entry(scope).or_default().push(Def {
                name,
                seq,
                kind: DefKind::Function { def: node },
            });
            match self.blocks.entry(node) {
                Entry::Vacant(entry) => {
                    entry.insert(Block {
                        parent: Some(scope),
                        ..Block::default()
                    });
                    self.hoisted.push(node);
                }
                Entry::Occupied(mut entry) => entry.get_mut().parent = Some(scope),
            }
            self.annotations.set_role(
                node,
                NodeRole::Def {
                    params: params.len() as u32,
                },
            );
        }
        Ok(())
    }

    fn def_header(&self, def: Node) -> Result<(&'v str, Vec<(&'v str, Node)>), TypeError> {
        let Some(&header) = self.space.elements(def).get(1) else {
            return Err(TypeError::syntax(def, "`def` needs a name"));
        };
        if let Some(name) = self.name_token(header) {
            return Ok((name, Vec::new()));
        }
        let mut names = Vec::new();
        for &part in self.space.elements(header) {
            match self.name_token(part) {
                Some(name) => names.push((name, part)),
                None => return Err(TypeError::syntax(part, "expected a parameter name")),
            }
        }
        match names.split_first() {
            Some((&(name, _), params)) => Ok((name, params.to_vec())),
            None => Err(TypeError::syntax(
                header,
                "`def` expects a name or `(name params...)`",
            )),
        }
    }

    fn def_name(&self, def: Node) -> &'v str {
        self.def_header(def).map_or("?", |(name, _)| name)
    }

    /// Unquoted, non-keyword token text.
    fn name_token(&self, node: Node) -> Option<&'v str> {
        if self.space.is_quoted(node) {
            return None;
        }
        self.space.text(node).filter(|text| !KEYWORDS.contains(text))
    }

    fn head_text(&self, node: Node) -> Option<&'v str> {
        let &head = self.space.elements(node).first()?;
        if self.space.is_quoted(head) {
            return None;
        }
        self.space.text(head)
    }

    // ---- bindings ----

    fn bind(&mut self, node: Node) -> Result<(), TypeError> {
        let frame = self.top();
        if frame.pending != Pending::None {
            return Err(TypeError::syntax(
                node,
                "`let` is not allowed in call arguments or conditions",
            ));
        }
        let elements = self.space.elements(frame.seq);
        let mut names = Vec::new();
        let mut close = None;
        for &element in &elements[frame.cursor..frame.end] {
            if !self.space.is_quoted(element) && self.space.text(element) == Some("in") {
                close = Some(element);
                break;
            }
            match self.name_token(element) {
                Some(name) => names.push((name, Some(element))),
                None => return Err(TypeError::syntax(element, "expected a name to bind")),
            }
        }
        let Some(close) = close else {
            return Err(TypeError::syntax(node, "`let` without a matching `in`"));
        };
        if names.is_empty() {
            return Err(TypeError::syntax(node, "`let` binds no names"));
        }

        let scope = self.top().scope;
        self.bind_names(scope, &names, node)?;
        self.annotations.set_role(
            node,
            NodeRole::Bind {
                count: names.len() as u32,
            },
        );
        self.annotations.set_role(close, NodeRole::BindEnd);
        self.top_mut().cursor += names.len() + 1;
        Ok(())
    }

    /// Pops one value per name and binds them in order, deepest first.
    fn bind_names(
        &mut self,
        scope: Node,
        names: &[(&'v str, Option<Node>)],
        at: Node,
    ) -> Result<(), TypeError> {
        if names.is_empty() {
            return Ok(());
        }
        self.reserve(names.len(), at)?;
        let start = self.stack.len() - names.len();
        let tys = self.stack.split_off(start);

        let block = self.blocks.entry(scope).or_default();
        let defs = self.bindings.entry(scope).or_default();
        for (&(name, node), ty) in names.iter().zip(tys) {
            let slot = block.vars;
            block.vars += 1;
            let seq = self.next_seq;
            self.next_seq += 1;
            defs.push(Def {
                name,
                seq,
                kind: DefKind::Variable { ty, scope, slot },
            });
            if let Some(node) = node {
                self.annotations.set_role(node, NodeRole::BindName);
            }
        }
        self.annotations.set_vars(scope, block.vars);
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<Def<'v>> {
        let mut scope = self.frames.top().map(|f| f.scope);
        while let Some(current) = scope {
            let found = self.bindings.get(&current).and_then(|defs| {
                defs.iter()
                    .rev()
                    .find(|def| def.name == name && !self.is_hidden(def.seq))
            });
            if let Some(def) = found {
                return Some(*def);
            }
            scope = self.blocks.get(&current).and_then(|b| b.parent);
        }
        None
    }

    fn is_hidden(&self, seq: u32) -> bool {
        self.hidden.as_ref().is_some_and(|range| range.contains(&seq))
    }

    fn next_seq(&mut self) -> u32 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    // ---- stack effects ----

    /// Ensures `k` values are available to the top frame, growing the stack
    /// under the nearest isolated frame if needed.
    fn reserve(&mut self, k: usize, at: Node) -> Result<(), TypeError> {
        let top = self.frames.len() - 1;
        let iso = (0..=top)
            .rev()
            .find(|&i| self.frames[i].ext.kind.is_isolated())
            .unwrap_or(0);

        let floor = self.frames[iso].ext.floor;
        let available = self.stack.len() - floor;
        if available < k {
            let may_grow = match self.frames[iso].ext.kind {
                FrameKind::Root => self.infer_root_inputs || self.binding_root_params,
                _ => true,
            };
            if !may_grow {
                return Err(TypeError::mismatch(
                    at,
                    format!("needs {} value(s) but only {} are available", k, available),
                ));
            }
            let missing = k - available;
            let fresh: Vec<TypeId> = (0..missing).map(|_| self.unify.fresh()).collect();
            trace!(missing, "growing abstract stack");
            let above = self.stack.split_off(floor);
            self.stack.extend_from_slice(&fresh);
            self.stack.extend(above);
            for i in iso..=top {
                self.frames[i].base += missing;
            }
            prepend(&mut self.frames[iso].ext.ins, fresh);
        }

        let needed_from = self.stack.len() - k;
        for i in iso + 1..=top {
            let low = region_start(&self.frames[i]);
            if needed_from < low {
                let consumed = self.stack[needed_from..low].to_vec();
                prepend(&mut self.frames[i].ext.ins, consumed);
            }
        }
        Ok(())
    }

    fn apply_native(&mut self, id: NativeId, at: Node) -> Result<(), TypeError> {
        let native = self.registry.native(id);
        let outs: Vec<OutType> = native
            .outs
            .iter()
            .map(|&ty| match self.types.lookup(ty) {
                TypeDesc::Var(k) if (k as usize) < native.ins.len() => {
                    OutType::SameAsInput(k as usize)
                }
                _ => OutType::Concrete(ty),
            })
            .collect();
        let callee = format!("`{}`", native.name);
        self.apply_signature(&native.ins, &outs, at, &callee)
    }

    fn apply_signature(
        &mut self,
        ins: &[TypeId],
        outs: &[OutType],
        at: Node,
        callee: &str,
    ) -> Result<(), TypeError> {
        self.reserve(ins.len(), at)?;
        let start = self.stack.len() - ins.len();
        for (i, &expected) in ins.iter().enumerate() {
            let actual = self.stack[start + i];
            self.unify.expect(expected, actual).map_err(|err| {
                let kind = match err {
                    unification::Error::OccursCheckFailed { .. } => {
                        ErrorKind::TypeUnificationFailed
                    }
                    _ => ErrorKind::ArityOrTypeMismatch,
                };
                TypeError::new(
                    kind,
                    at,
                    format!(
                        "{} expects {} as argument {}, found {}",
                        callee,
                        self.types.display(expected),
                        i + 1,
                        self.types.display(self.unify.resolve_deep(actual))
                    ),
                )
            })?;
        }

        let actual = self.stack.split_off(start);
        let mut fresh = HashMap::new();
        for out in outs {
            let ty = match *out {
                OutType::Concrete(ty) => self.unify.instantiate(ty, &mut fresh),
                OutType::SameAsInput(k) => match actual.get(k) {
                    Some(&ty) => ty,
                    None => self.unify.fresh(),
                },
            };
            self.stack.push(ty);
        }
        Ok(())
    }

    /// Fixes a raw effect into a signature: unresolved input placeholders
    /// become positional vars, outputs that are one of them become
    /// `SameAsInput`.
    fn canonical(&self, ins: &[TypeId], outs: &[TypeId]) -> BlockSignature {
        let ins: Vec<TypeId> = ins.iter().map(|&ty| self.unify.resolve_deep(ty)).collect();
        let canonical_ins = ins
            .iter()
            .enumerate()
            .map(|(k, &ty)| {
                if self.types.is_var(ty) {
                    self.types.var(k as u32)
                } else {
                    ty
                }
            })
            .collect();
        let outs = outs
            .iter()
            .enumerate()
            .map(|(j, &ty)| {
                let ty = self.unify.resolve_deep(ty);
                if !self.types.is_var(ty) {
                    return OutType::Concrete(ty);
                }
                match ins.iter().position(|&input| input == ty) {
                    Some(k) => OutType::SameAsInput(k),
                    None => OutType::Concrete(self.types.var((ins.len() + j) as u32)),
                }
            })
            .collect();
        BlockSignature {
            ins: canonical_ins,
            outs,
        }
    }

    fn complete(&mut self, node: Node, sig: BlockSignature) {
        trace!(node = %node, signature = %sig.display(self.types), "done");
        let block = self.blocks.entry(node).or_default();
        block.state = InferState::Done;
        block.signature = Some(sig);
    }

    // ---- frame callbacks ----

    fn finish_frame(&mut self) -> Result<(), TypeError> {
        match self.top().pending {
            Pending::None => {
                self.leave_scope();
                Ok(())
            }
            Pending::InvokeNative(id) => {
                let native = self.registry.native(id);
                let arity = native.ins.len();
                let callee = format!("`{}`", native.name);
                let frame = self.pop_call(arity, &callee, None)?;
                self.apply_native(id, frame.scope)?;
                self.complete_call(frame.scope, native.outs.len());
                Ok(())
            }
            Pending::InvokeFunction(def) => {
                let sig = self.signature_of(def).clone();
                let callee = format!("`{}`", self.def_name(def));
                let frame = self.pop_call(sig.ins.len(), &callee, Some(def))?;
                self.apply_signature(&sig.ins, &sig.outs, frame.scope, &callee)?;
                self.complete_call(frame.scope, sig.outs.len());
                Ok(())
            }
            Pending::Conditional => self.finish_condition(),
            Pending::Branch0Taken => self.finish_arm0(),
            Pending::BranchUnify => self.finish_arm1(),
        }
    }

    fn leave_scope(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        let ext = &frame.ext;
        match ext.kind {
            FrameKind::Recheck => {}
            FrameKind::Root | FrameKind::Body => {
                let sig = self.canonical(&ext.ins, &self.stack[ext.floor..]);
                if ext.kind == FrameKind::Body {
                    debug!(
                        function = self.def_name(frame.scope),
                        signature = %sig.display(self.types),
                        "inferred"
                    );
                    self.stack.truncate(ext.floor);
                }
                self.complete(frame.scope, sig);
            }
            FrameKind::Block | FrameKind::Inline => {
                let low = region_start(&frame);
                let sig = self.canonical(&ext.ins, &self.stack[low..]);
                self.complete(frame.scope, sig);
            }
        }
    }

    /// Pops a call-argument frame after checking it produced exactly the
    /// callee's inputs. `def` is the callee's definition, for user functions.
    fn pop_call(
        &mut self,
        arity: usize,
        callee: &str,
        def: Option<Node>,
    ) -> Result<VerifyFrame, TypeError> {
        let frame = self.top();
        let produced = self.stack.len() - frame.base;
        let err = if !frame.ext.ins.is_empty() {
            TypeError::mismatch(
                frame.scope,
                format!(
                    "arguments of {} consume {} value(s) from outside the call",
                    callee,
                    frame.ext.ins.len()
                ),
            )
        } else if produced != arity {
            TypeError::mismatch(
                frame.scope,
                format!("{} expects {} argument(s), got {}", callee, arity, produced),
            )
        } else {
            let scope = frame.scope;
            return self
                .frames
                .pop()
                .ok_or_else(|| TypeError::mismatch(scope, "call frame missing"));
        };
        Err(match def {
            Some(def) => {
                let note = format!(
                    "{} is defined here as {}",
                    callee,
                    self.signature_of(def).display(self.types)
                );
                err.with_related(def, note)
            }
            None => err,
        })
    }

    fn complete_call(&mut self, node: Node, produced: usize) {
        let start = self.stack.len() - produced;
        let sig = self.canonical(&[], &self.stack[start..]);
        self.complete(node, sig);
    }

    fn finish_condition(&mut self) -> Result<(), TypeError> {
        let frame = self.top();
        let cond = self.space.elements(frame.scope)[1];
        if !frame.ext.ins.is_empty() || self.stack.len() != frame.base + 1 {
            return Err(TypeError::mismatch(
                cond,
                "an `if` condition must push exactly one value",
            ));
        }
        let ty = self.stack[frame.base];
        if self.unify.expect(self.types.bool(), ty).is_err() {
            return Err(TypeError::mismatch(
                cond,
                format!(
                    "an `if` condition must be bool, found {}",
                    self.types.display(self.unify.resolve_deep(ty))
                ),
            ));
        }
        self.stack.pop();
        let frame = self.top_mut();
        frame.cursor = 2;
        frame.end = 3;
        frame.pending = Pending::Branch0Taken;
        Ok(())
    }

    fn finish_arm0(&mut self) -> Result<(), TypeError> {
        let top = self.frames.len() - 1;
        let node = self.frames[top].scope;
        let elements = self.space.elements(node);
        let (ins, outs) = self.arm_effect(top);
        let sig = self.canonical(&ins, &outs);
        self.arms.insert(elements[2], sig);

        if elements.len() == 4 {
            self.rebase(top);
            let frame = &mut self.frames[top];
            frame.ext.arm0 = Some((ins, outs));
            frame.cursor = 3;
            frame.end = 4;
            frame.pending = Pending::BranchUnify;
            Ok(())
        } else {
            let identity = (ins.clone(), ins.clone());
            self.unify_arms(top, (ins, outs), identity)
        }
    }

    fn finish_arm1(&mut self) -> Result<(), TypeError> {
        let top = self.frames.len() - 1;
        let arm1 = self.arm_effect(top);
        let arm0 = self.frames[top].ext.arm0.take().unwrap_or_default();
        self.unify_arms(top, arm0, arm1)
    }

    fn arm_effect(&self, index: usize) -> (Vec<TypeId>, Vec<TypeId>) {
        let frame = &self.frames[index];
        let low = region_start(frame);
        (frame.ext.ins.clone(), self.stack[low..].to_vec())
    }

    /// Restores the stack to what it was before the frame consumed anything.
    fn rebase(&mut self, index: usize) {
        let low = region_start(&self.frames[index]);
        let ins = mem::take(&mut self.frames[index].ext.ins);
        self.stack.truncate(low);
        self.stack.extend(ins);
    }

    fn unify_arms(
        &mut self,
        index: usize,
        (ins0, outs0): (Vec<TypeId>, Vec<TypeId>),
        (ins1, outs1): (Vec<TypeId>, Vec<TypeId>),
    ) -> Result<(), TypeError> {
        let node = self.frames[index].scope;
        let show = |this: &Self, ins: &[TypeId], outs: &[TypeId]| {
            let sig = this.canonical(ins, outs);
            sig.display(this.types).to_string()
        };
        // Labels each arm with its own effect; a missing else is the identity.
        let label = |this: &Self, err: TypeError| {
            let arms = this.space.elements(node);
            let err = err.with_related(
                arms[2],
                format!("then arm: {}", show(this, &ins0, &outs0)),
            );
            match arms.get(3) {
                Some(&arm) => {
                    err.with_related(arm, format!("else arm: {}", show(this, &ins1, &outs1)))
                }
                None => err,
            }
        };
        if ins0.len() != ins1.len() || outs0.len() != outs1.len() {
            let err = TypeError::new(
                ErrorKind::BranchSignatureMismatch,
                node,
                format!(
                    "arms have different stack effects: {} and {}",
                    show(self, &ins0, &outs0),
                    show(self, &ins1, &outs1)
                ),
            );
            return Err(label(self, err));
        }

        let mut ins = Vec::with_capacity(ins0.len());
        let mut outs = Vec::with_capacity(outs0.len());
        for (a, b) in ins0.iter().zip(&ins1).chain(outs0.iter().zip(&outs1)) {
            let unified = match self.unify.unifies_to(*a, *b) {
                Ok(unified) => unified,
                Err(err) => {
                    let err = TypeError::new(
                        ErrorKind::BranchSignatureMismatch,
                        node,
                        format!("arms disagree: {}", err),
                    );
                    return Err(label(self, err));
                }
            };
            if ins.len() < ins0.len() {
                ins.push(unified);
            } else {
                outs.push(unified);
            }
        }

        let start = self.stack.len() - outs.len();
        self.stack.truncate(start);
        self.stack.extend(&outs);

        let sig = self.canonical(&ins, &outs);
        for &arm in &self.space.elements(node)[2..] {
            self.arms.insert(arm, sig.clone());
        }
        self.frames.pop();
        self.complete(node, sig);
        Ok(())
    }

    // ---- recursion ----

    /// Handles a reference to a function whose body is still open by
    /// abandoning the innermost `if` arm that can be swapped for the other.
    fn defer_recursion(&mut self, trigger: Node, def: Node) -> Result<(), TypeError> {
        debug!(at = %self.space.display(trigger), "recursion deferred");
        loop {
            let Some(top) = self.frames.len().checked_sub(1) else {
                return Err(TypeError::new(
                    ErrorKind::RecursionWithoutBaseCase,
                    trigger,
                    format!(
                        "`{}` recurses on every path before its type is known",
                        self.space.display(trigger)
                    ),
                )
                .with_related(def, format!("`{}` is defined here", self.def_name(def))));
            };
            let node = self.frames[top].scope;
            match self.frames[top].pending {
                Pending::Branch0Taken if self.space.seq_len(node) == 4 => {
                    self.rebase(top);
                    let frame = &mut self.frames[top];
                    frame.cursor = 3;
                    frame.end = 4;
                    frame.pending = Pending::None;
                    self.queue_recheck(node);
                    return Ok(());
                }
                Pending::BranchUnify => {
                    self.rebase(top);
                    let frame = &mut self.frames[top];
                    frame.cursor = 2;
                    frame.end = 3;
                    frame.pending = Pending::None;
                    frame.ext.arm0 = None;
                    self.queue_recheck(node);
                    return Ok(());
                }
                _ => self.cancel_top(),
            }
        }
    }

    fn cancel_top(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        trace!(node = %frame.scope, "cancel");
        if frame.ext.kind.is_isolated() {
            self.stack.truncate(frame.ext.floor);
        } else {
            let low = region_start(&frame);
            self.stack.truncate(low);
            self.stack.extend(frame.ext.ins);
        }
        if frame.ext.kind != FrameKind::Recheck {
            if let Some(block) = self.blocks.get_mut(&frame.scope) {
                block.state = InferState::NotStarted;
            }
        }
    }

    fn queue_recheck(&mut self, node: Node) {
        if !self.recheck.contains(&node) {
            self.recheck.push_back(node);
        }
    }

    // ---- helpers ----

    fn state(&self, node: Node) -> InferState {
        self.blocks.get(&node).map_or(InferState::NotStarted, |b| b.state)
    }

    fn signature_of(&self, node: Node) -> &BlockSignature {
        self.blocks
            .get(&node)
            .and_then(|b| b.signature.as_ref())
            .unwrap_or(&EMPTY_SIGNATURE)
    }

    fn top(&self) -> &VerifyFrame {
        &self.frames[self.frames.len() - 1]
    }

    fn top_mut(&mut self) -> &mut VerifyFrame {
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }
}
