//! Typed expression trees.
//!
//! Every [`Expr`] carries the [`TypeId`] of the value it produces. Invocations
//! of other members are explicit: [`ExprKind::Call`] is a synchronous call,
//! while [`ExprKind::StartInvocation`] and [`ExprKind::AwaitInvocations`]
//! express a parallel loop that starts several instances and then waits.

use crate::ids::TypeId;
use hast_common::Ident;
use serde::{Deserialize, Serialize};

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical NOT on booleans, bitwise NOT on integers.
    Not,
    /// Arithmetic negation.
    Neg,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// Bitwise `&`.
    And,
    /// Bitwise `|`.
    Or,
    /// Bitwise `^`.
    Xor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    LogicAnd,
    /// `||`
    LogicOr,
}

impl BinaryOp {
    /// Returns `true` for operators producing a boolean from two operands of
    /// another type.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

/// A literal constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    /// `true` / `false`.
    Bool(bool),
    /// An integer; its width comes from the expression type.
    Int(i64),
}

/// Whether a wait completes when every watched instance finished or any one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaitMode {
    /// Wait for every watched instance.
    All,
    /// Wait for at least one watched instance.
    Any,
}

/// A typed expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// What the expression computes.
    pub kind: ExprKind,
    /// Type of the produced value.
    pub ty: TypeId,
}

/// The expression forms accepted by the transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// A constant.
    Literal(Literal),
    /// A local variable, a parameter, or a design-level global.
    Variable(Ident),
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// Explicit conversion of the operand to this node's type.
    Cast {
        /// The value being converted.
        operand: Box<Expr>,
    },
    /// Array element access.
    Index {
        /// The array.
        array: Box<Expr>,
        /// The element index.
        index: Box<Expr>,
    },
    /// Assignment; its value is the assigned value.
    Assign {
        /// A variable or an indexed variable.
        target: Box<Expr>,
        /// The new value.
        value: Box<Expr>,
    },
    /// Synchronous invocation of another member: start one instance and wait
    /// for it.
    Call {
        /// Full name of the invoked member.
        member: Ident,
        /// Actual arguments, one per formal parameter.
        args: Vec<Expr>,
    },
    /// Start the next instance of a pool of `degree` instances, round robin.
    StartInvocation {
        /// Full name of the invoked member.
        member: Ident,
        /// Actual arguments, one per formal parameter.
        args: Vec<Expr>,
        /// Size of the instance pool.
        degree: u32,
    },
    /// Wait for a pool of `degree` instances; the value is the list of
    /// per-instance results in index order.
    AwaitInvocations {
        /// Full name of the invoked member.
        member: Ident,
        /// Size of the instance pool.
        degree: u32,
        /// Wait for all or for any.
        mode: WaitMode,
    },
    /// A construct the front end could not simplify.
    Unsupported {
        /// Source text of the construct.
        text: String,
    },
}

impl Expr {
    /// Creates an expression.
    pub fn new(kind: ExprKind, ty: TypeId) -> Self {
        Self { kind, ty }
    }

    /// A boolean literal.
    pub fn bool(value: bool, ty: TypeId) -> Self {
        Self::new(ExprKind::Literal(Literal::Bool(value)), ty)
    }

    /// An integer literal.
    pub fn int(value: i64, ty: TypeId) -> Self {
        Self::new(ExprKind::Literal(Literal::Int(value)), ty)
    }

    /// A reference to a variable, parameter or global.
    pub fn variable(name: Ident, ty: TypeId) -> Self {
        Self::new(ExprKind::Variable(name), ty)
    }

    /// A unary operation.
    pub fn unary(op: UnaryOp, operand: Expr, ty: TypeId) -> Self {
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            ty,
        )
    }

    /// A binary operation.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, ty: TypeId) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
        )
    }

    /// Conversion of `operand` to `ty`.
    pub fn cast(operand: Expr, ty: TypeId) -> Self {
        Self::new(
            ExprKind::Cast {
                operand: Box::new(operand),
            },
            ty,
        )
    }

    /// `target = value`, typed as the target.
    pub fn assign(target: Expr, value: Expr) -> Self {
        let ty = target.ty;
        Self::new(
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            ty,
        )
    }

    /// A synchronous call returning `ty`.
    pub fn call(member: Ident, args: Vec<Expr>, ty: TypeId) -> Self {
        Self::new(ExprKind::Call { member, args }, ty)
    }

    /// Short description of the expression form, used in diagnostics.
    pub fn describe(&self) -> String {
        match &self.kind {
            ExprKind::Literal(_) => "literal".to_string(),
            ExprKind::Variable(_) => "variable reference".to_string(),
            ExprKind::Unary { .. } => "unary expression".to_string(),
            ExprKind::Binary { .. } => "binary expression".to_string(),
            ExprKind::Cast { .. } => "conversion".to_string(),
            ExprKind::Index { .. } => "array access".to_string(),
            ExprKind::Assign { .. } => "assignment".to_string(),
            ExprKind::Call { .. } => "invocation".to_string(),
            ExprKind::StartInvocation { .. } => "parallel invocation".to_string(),
            ExprKind::AwaitInvocations { .. } => "invocation wait".to_string(),
            ExprKind::Unsupported { text } => text.clone(),
        }
    }
}
