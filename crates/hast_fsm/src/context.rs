//! State shared by the lowering of one member.

use crate::error::TransformError;
use crate::hdl::{DataType, HdlStmt};
use crate::naming::ObjectName;
use crate::state_machine::{BlockStep, MemberStateMachine};
use hast_common::{Ident, Interner};
use hast_config::ProjectConfig;
use hast_diagnostics::Diagnostic;
use hast_ir::{Design, Method, Type, TypeId};
use std::collections::{BTreeMap, BTreeSet};

/// Where the next operation is appended: a state and a path into nested blocks.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Cursor {
    /// Index of the state.
    pub state: usize,
    /// Path from the state body into the current block.
    pub path: Vec<BlockStep>,
}

impl Cursor {
    /// The top-level block of `state`.
    pub fn root(state: usize) -> Self {
        Self {
            state,
            path: Vec::new(),
        }
    }

    /// The block one `step` below this one.
    pub fn child(&self, step: BlockStep) -> Self {
        let mut path = self.path.clone();
        path.push(step);
        Self {
            state: self.state,
            path,
        }
    }

    /// Returns `true` at the top-level block of the state.
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }
}

/// A construct a `break` can leave.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Breakable {
    /// A loop; `break` jumps to the state after it.
    Loop {
        /// The state after the loop.
        after: usize,
    },
    /// A switch section; `break` ends the section, which happens anyway.
    Switch,
}

/// Per-member lowering bookkeeping.
#[derive(Clone, Debug, Default)]
pub struct LoweringScope {
    /// State each label starts.
    pub labels: BTreeMap<Ident, usize>,
    /// Enclosing breakable constructs, innermost last.
    pub breakables: Vec<Breakable>,
    /// Per state, the `(member, index)` instances whose completion was
    /// observed on entry to it.
    pub finished_in_state: BTreeMap<usize, BTreeSet<(Ident, u32)>>,
    /// Source locals and parameters, mapped to their objects.
    pub variables: BTreeMap<Ident, ObjectName>,
}

impl LoweringScope {
    /// Records that instance `index` of `target` is known finished in `state`.
    pub fn record_finished(&mut self, state: usize, target: Ident, index: u32) {
        self.finished_in_state
            .entry(state)
            .or_default()
            .insert((target, index));
    }

    /// Returns `true` if instance `index` of `target` finished on entry to `state`.
    pub fn is_finished_in(&self, state: usize, target: Ident, index: u32) -> bool {
        self.finished_in_state
            .get(&state)
            .is_some_and(|set| set.contains(&(target, index)))
    }
}

/// Everything the lowering of one member reads and writes.
pub struct TransformContext<'a> {
    /// The whole design, for callee and global lookup.
    pub design: &'a Design,
    /// Project configuration, for parallelism limits.
    pub config: &'a ProjectConfig,
    /// Names of members, variables and labels.
    pub interner: &'a Interner,
    /// The member being lowered.
    pub method: &'a Method,
    /// The machine under construction.
    pub machine: MemberStateMachine,
    /// Lowering bookkeeping.
    pub scope: LoweringScope,
    /// Warnings raised while lowering.
    pub warnings: Vec<Diagnostic>,
}

impl<'a> TransformContext<'a> {
    /// Creates a context with a fresh machine for `method`.
    pub fn new(
        design: &'a Design,
        config: &'a ProjectConfig,
        interner: &'a Interner,
        method: &'a Method,
    ) -> Result<Self, TransformError> {
        Ok(Self {
            design,
            config,
            interner,
            method,
            machine: MemberStateMachine::new(method.name)?,
            scope: LoweringScope::default(),
            warnings: Vec::new(),
        })
    }

    /// Full name of the member being lowered.
    pub fn member_name(&self) -> String {
        self.interner.resolve(self.method.name).to_string()
    }

    /// The string an identifier stands for.
    pub fn resolve(&self, ident: Ident) -> String {
        self.interner.resolve(ident).to_string()
    }

    /// Appends a state whose body starts with `comment`.
    pub fn add_state(&mut self, comment: impl Into<String>) -> usize {
        self.machine.add_state(vec![HdlStmt::Comment(comment.into())])
    }

    /// Appends `stmt` to the block at `cursor`; returns its position there.
    pub fn emit(&mut self, cursor: &Cursor, stmt: HdlStmt) -> Result<usize, TransformError> {
        let block = self.machine.block_mut(cursor.state, &cursor.path)?;
        block.push(stmt);
        Ok(block.len() - 1)
    }

    /// Appends `state := to` at `cursor`.
    pub fn emit_state_change(&mut self, cursor: &Cursor, to: usize) -> Result<(), TransformError> {
        let stmt = self.machine.state_change(to);
        self.emit(cursor, stmt).map(|_| ())
    }

    /// Appends a transition to `to` that only fires if the state at `cursor`
    /// has not been left yet.
    pub fn emit_conditional_state_change(
        &mut self,
        cursor: &Cursor,
        to: usize,
    ) -> Result<(), TransformError> {
        let stmt = self.machine.conditional_state_change(to, cursor.state);
        self.emit(cursor, stmt).map(|_| ())
    }

    /// Adds an operation's cost to the state at `cursor`.
    pub fn add_cost(&mut self, cursor: &Cursor, cycles: f64) -> Result<(), TransformError> {
        Ok(self.machine.add_clock_cycles(cursor.state, cycles)?)
    }

    /// Returns `true` if the state at `cursor` holds nothing but comments.
    pub fn state_is_blank(&self, state: usize) -> bool {
        self.machine
            .states()
            .get(state)
            .is_some_and(|s| s.body.iter().all(HdlStmt::is_comment))
    }

    /// Records a warning about the member being lowered.
    pub fn warn(&mut self, diag: Diagnostic) {
        let diag = diag.with_member(self.member_name());
        self.warnings.push(diag);
    }

    /// The hardware type of values of `ty`; `what` names them in the error.
    pub fn declarable_type(
        &self,
        ty: TypeId,
        what: impl FnOnce() -> String,
    ) -> Result<DataType, TransformError> {
        declarable_type(self.design, ty).ok_or_else(|| TransformError::UndeclarableType {
            member: self.member_name(),
            what: what(),
        })
    }

    /// Error for an expression outside the supported set.
    pub fn unsupported_expression(&self, text: impl Into<String>) -> TransformError {
        TransformError::UnsupportedExpression {
            member: self.member_name(),
            text: text.into(),
        }
    }

    /// Error for a statement outside the supported set.
    pub fn unsupported_statement(&self, text: impl Into<String>) -> TransformError {
        TransformError::UnsupportedStatement {
            member: self.member_name(),
            text: text.into(),
        }
    }
}

/// The hardware type of values of `ty`, or `None` for void and foreign types.
pub fn declarable_type(design: &Design, ty: TypeId) -> Option<DataType> {
    match design.types.get(ty)? {
        Type::Void => None,
        Type::Bool => Some(DataType::Boolean),
        Type::Int {
            width,
            signed: true,
        } => Some(DataType::Signed(*width)),
        Type::Int {
            width,
            signed: false,
        } => Some(DataType::Unsigned(*width)),
        Type::Array { element, size } => Some(DataType::Array {
            element: Box::new(declarable_type(design, *element)?),
            size: *size,
        }),
    }
}
