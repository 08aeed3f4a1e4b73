//! The closed set of statements a member body may contain.

use crate::expr::Expr;
use crate::ids::TypeId;
use hast_common::Ident;
use serde::{Deserialize, Serialize};

/// Whether a declaration came from the source or was inserted by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclKind {
    /// A variable the program declares.
    User,
    /// A compiler-inserted declaration with no executable meaning.
    Placeholder,
}

/// One label of a switch section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CaseLabel {
    /// `case <value>:`
    Value(Expr),
    /// `default:`
    Default,
}

/// A group of labels sharing one body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchSection {
    /// The labels selecting this section.
    pub labels: Vec<CaseLabel>,
    /// The section body.
    pub body: Vec<Statement>,
}

impl SwitchSection {
    /// Returns `true` if one of the labels is `default`.
    pub fn is_default(&self) -> bool {
        self.labels.iter().any(|l| matches!(l, CaseLabel::Default))
    }
}

/// A statement of a member body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// A local variable declaration, optionally initialized.
    VarDecl {
        /// Variable name, unique within the member.
        name: Ident,
        /// Declared type.
        ty: TypeId,
        /// Initial value assigned where the declaration stands.
        init: Option<Expr>,
        /// Source or compiler-inserted.
        kind: DeclKind,
    },
    /// An expression evaluated for its effect.
    Expr(Expr),
    /// `return`, with a value for non-void members.
    Return(Option<Expr>),
    /// `if`/`else`.
    If {
        /// Condition.
        condition: Expr,
        /// Taken branch.
        then_body: Box<Statement>,
        /// Optional else branch.
        else_body: Option<Box<Statement>>,
    },
    /// `while`.
    While {
        /// Loop condition, tested before every iteration.
        condition: Expr,
        /// Loop body.
        body: Box<Statement>,
    },
    /// `switch`.
    Switch {
        /// The value being matched.
        subject: Expr,
        /// Sections in source order.
        sections: Vec<SwitchSection>,
    },
    /// `break`.
    Break,
    /// `goto <label>`.
    Goto(Ident),
    /// `<label>:`
    Label(Ident),
    /// `throw`; hardware drops it.
    Throw {
        /// Source text of the statement.
        text: String,
    },
    /// `{ ... }`
    Block(Vec<Statement>),
    /// `;`
    Empty,
    /// A statement kind the front end could not eliminate.
    Unsupported {
        /// Name of the statement kind, e.g. `"try"`.
        kind: String,
        /// Source text of the statement.
        text: String,
    },
}

impl Statement {
    /// Short description used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Statement::VarDecl { .. } => "variable declaration".to_string(),
            Statement::Expr(e) => format!("{} statement", e.describe()),
            Statement::Return(_) => "return statement".to_string(),
            Statement::If { .. } => "if statement".to_string(),
            Statement::While { .. } => "while statement".to_string(),
            Statement::Switch { .. } => "switch statement".to_string(),
            Statement::Break => "break statement".to_string(),
            Statement::Goto(_) => "goto statement".to_string(),
            Statement::Label(_) => "label".to_string(),
            Statement::Throw { text } => text.clone(),
            Statement::Block(_) => "block".to_string(),
            Statement::Empty => "empty statement".to_string(),
            Statement::Unsupported { kind, text } => format!("{kind} statement `{text}`"),
        }
    }

    /// Appends every label declared anywhere inside this statement, in
    /// source order.
    pub fn collect_labels(&self, out: &mut Vec<Ident>) {
        match self {
            Statement::Label(name) => out.push(*name),
            Statement::If {
                then_body,
                else_body,
                ..
            } => {
                then_body.collect_labels(out);
                if let Some(else_body) = else_body {
                    else_body.collect_labels(out);
                }
            }
            Statement::While { body, .. } => body.collect_labels(out),
            Statement::Switch { sections, .. } => {
                for stmt in sections.iter().flat_map(|s| &s.body) {
                    stmt.collect_labels(out);
                }
            }
            Statement::Block(stmts) => {
                for stmt in stmts {
                    stmt.collect_labels(out);
                }
            }
            Statement::VarDecl { .. }
            | Statement::Expr(_)
            | Statement::Return(_)
            | Statement::Break
            | Statement::Goto(_)
            | Statement::Throw { .. }
            | Statement::Empty
            | Statement::Unsupported { .. } => {}
        }
    }
}
