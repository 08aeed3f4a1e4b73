//! The simplified, fully-typed statement tree the transformer consumes.
//!
//! A front end hands hast a [`Design`]: every member is a [`Method`] whose
//! body is a [`Statement`] tree in which each [`Expr`] carries a resolved
//! fixed-width [`TypeId`], every array is statically sized and every implicit
//! numeric promotion is an explicit [`ExprKind::Cast`]. [`DesignFile`] is the
//! JSON interchange form of a design plus its name table.

#![warn(missing_docs)]

pub mod arena;
pub mod design;
pub mod design_file;
pub mod expr;
pub mod ids;
pub mod method;
pub mod stmt;
pub mod types;

pub use arena::{Arena, ArenaId};
pub use design::{Design, GlobalVariable};
pub use design_file::DesignFile;
pub use expr::{BinaryOp, Expr, ExprKind, Literal, UnaryOp, WaitMode};
pub use ids::{GlobalId, MethodId, TypeId};
pub use method::{Method, Parameter};
pub use stmt::{CaseLabel, DeclKind, Statement, SwitchSection};
pub use types::{Type, TypeDb};
