//! The hardware description the transformer emits.
//!
//! This is a small, dialect-neutral model of a clocked process: typed data
//! objects, expressions over them, and sequential statements (assignments,
//! `if`, `case`, comments). The printer renders it as text and the simulator
//! executes it.

use crate::naming::ObjectName;
use hast_common::Ident;

/// Type of a hardware data object.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DataType {
    /// A boolean.
    Boolean,
    /// Two's complement integer of the given width.
    Signed(u32),
    /// Unsigned integer of the given width.
    Unsigned(u32),
    /// Integer constrained to `low..=high`; assignments wrap within the range.
    Range {
        /// Smallest value.
        low: i64,
        /// Largest value.
        high: i64,
    },
    /// Fixed-size array.
    Array {
        /// Element type.
        element: Box<DataType>,
        /// Number of elements.
        size: u32,
    },
    /// The enumeration of a state machine's states.
    State,
}

impl DataType {
    /// Value an object of this type holds when nothing else is declared.
    pub fn default_value(&self) -> Value {
        match self {
            DataType::Boolean => Value::Bool(false),
            DataType::Signed(_) | DataType::Unsigned(_) | DataType::State => Value::Int(0),
            DataType::Range { low, .. } => Value::Int(*low),
            DataType::Array { element, size } => {
                Value::Array(vec![element.default_value(); *size as usize])
            }
        }
    }
}

/// A constant value.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// Array elements in index order.
    Array(Vec<Value>),
}

impl Value {
    /// Returns the boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer, if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// Unary operators.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HdlUnaryOp {
    /// Logical or bitwise negation.
    Not,
    /// Arithmetic negation.
    Neg,
}

/// Binary operators.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HdlBinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `mod`
    Mod,
    /// `and`, logical on booleans.
    And,
    /// `or`, logical on booleans.
    Or,
    /// `xor`
    Xor,
    /// Shift left.
    ShiftLeft,
    /// Shift right (arithmetic for signed values).
    ShiftRight,
    /// `=`
    Eq,
    /// `/=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `|` between case choices.
    Alternative,
}

/// An expression.
#[derive(Clone, PartialEq, Debug)]
pub enum HdlExpr {
    /// The current value of a data object.
    Ref(ObjectName),
    /// A constant.
    Value(Value),
    /// The enumeration literal of state `i`.
    State(usize),
    /// A unary operation.
    Unary {
        /// The operator.
        op: HdlUnaryOp,
        /// The operand.
        operand: Box<HdlExpr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: HdlBinaryOp,
        /// Left operand.
        lhs: Box<HdlExpr>,
        /// Right operand.
        rhs: Box<HdlExpr>,
    },
    /// Type conversion.
    Convert {
        /// The converted value.
        value: Box<HdlExpr>,
        /// Target type.
        to: DataType,
    },
    /// Array element.
    Index {
        /// The array.
        array: Box<HdlExpr>,
        /// Element index.
        index: Box<HdlExpr>,
    },
    /// An array built from its elements.
    Aggregate(Vec<HdlExpr>),
}

impl HdlExpr {
    /// Reference to a data object.
    pub fn reference(name: ObjectName) -> Self {
        HdlExpr::Ref(name)
    }

    /// Boolean constant.
    pub fn bool(value: bool) -> Self {
        HdlExpr::Value(Value::Bool(value))
    }

    /// Integer constant.
    pub fn int(value: i64) -> Self {
        HdlExpr::Value(Value::Int(value))
    }

    /// A binary operation.
    pub fn binary(op: HdlBinaryOp, lhs: HdlExpr, rhs: HdlExpr) -> Self {
        HdlExpr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// `lhs = rhs`
    pub fn equals(lhs: HdlExpr, rhs: HdlExpr) -> Self {
        Self::binary(HdlBinaryOp::Eq, lhs, rhs)
    }
}

/// Folds `operands` into a left-associative chain `((a op b) op c) ...`.
///
/// A single operand is returned as is; no operands give `None`.
pub fn binary_chain(op: HdlBinaryOp, operands: Vec<HdlExpr>) -> Option<HdlExpr> {
    operands
        .into_iter()
        .reduce(|chain, next| HdlExpr::binary(op, chain, next))
}

/// Whether an assignment takes effect immediately or at the next clock edge.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AssignKind {
    /// Variable assignment: visible to the rest of the current cycle.
    Variable,
    /// Signal assignment: visible from the next clock cycle.
    Signal,
}

/// Which choice of a `case` an arm covers.
#[derive(Clone, PartialEq, Debug)]
pub enum Choice {
    /// Values, possibly an [`HdlBinaryOp::Alternative`] chain.
    Match(HdlExpr),
    /// Every value not matched by an earlier arm.
    Others,
}

/// One arm of a `case`.
#[derive(Clone, PartialEq, Debug)]
pub struct CaseArm {
    /// Values this arm covers.
    pub choice: Choice,
    /// Statements executed when selected.
    pub body: Vec<HdlStmt>,
}

/// A sequential statement.
#[derive(Clone, PartialEq, Debug)]
pub enum HdlStmt {
    /// `target := value` or `target <= value`.
    Assign {
        /// A [`HdlExpr::Ref`] or an [`HdlExpr::Index`] into one.
        target: HdlExpr,
        /// The assigned value.
        value: HdlExpr,
        /// Variable or signal semantics.
        kind: AssignKind,
    },
    /// `if`/`else`.
    If {
        /// The condition.
        condition: HdlExpr,
        /// Statements when true.
        then_body: Vec<HdlStmt>,
        /// Statements when false.
        else_body: Vec<HdlStmt>,
    },
    /// `case`.
    Case {
        /// Matched value.
        subject: HdlExpr,
        /// Arms in priority order.
        arms: Vec<CaseArm>,
    },
    /// A comment line.
    Comment(String),
}

impl HdlStmt {
    /// Returns `true` for [`HdlStmt::Comment`].
    pub fn is_comment(&self) -> bool {
        matches!(self, HdlStmt::Comment(_))
    }
}

/// A typed, named data object.
#[derive(Clone, PartialEq, Debug)]
pub struct DataObject {
    /// Name of the object.
    pub name: ObjectName,
    /// Type of the object.
    pub data_type: DataType,
    /// Value restored on reset; `None` leaves the object untouched by reset.
    pub initial: Option<Value>,
}

/// Assignment semantics of an object.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ObjectKind {
    /// Immediate update.
    Variable,
    /// Update at the next clock edge.
    Signal,
}

/// One declaration.
#[derive(Clone, PartialEq, Debug)]
pub enum Declaration {
    /// The state enumeration of a member state machine.
    StateType {
        /// The owning component.
        component: Ident,
        /// Number of enumeration literals.
        state_count: usize,
    },
    /// A signal or shared variable.
    Object {
        /// The object.
        object: DataObject,
        /// Signal or shared variable.
        kind: ObjectKind,
    },
}

/// A commented group of declarations.
#[derive(Clone, PartialEq, Debug)]
pub struct DeclarationSection {
    /// Human-readable heading.
    pub comment: String,
    /// The declarations.
    pub items: Vec<Declaration>,
}

/// The declarations a component contributes to the enclosing architecture.
#[derive(Clone, PartialEq, Debug)]
pub enum Declarations {
    /// Nothing to declare.
    Empty,
    /// Commented sections.
    Sections(Vec<DeclarationSection>),
}

impl Declarations {
    /// Returns `true` for [`Declarations::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Declarations::Empty)
    }
}

/// The clocked process of a component.
#[derive(Clone, PartialEq, Debug)]
pub struct Body {
    /// The owning component.
    pub component: Ident,
    /// Process-local variables.
    pub variables: Vec<DataObject>,
    /// Statements executed while reset is asserted.
    pub reset: Vec<HdlStmt>,
    /// Statements executed on every other clock edge.
    pub logic: Vec<HdlStmt>,
}
