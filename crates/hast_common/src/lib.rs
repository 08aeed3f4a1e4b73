//! Shared foundational types used across the hast workspace.
//!
//! This crate provides interned identifiers for member, variable, and signal
//! names, and the result type used for internal compiler errors.

#![warn(missing_docs)]

pub mod ident;
pub mod result;

pub use ident::{Ident, Interner};
pub use result::{HastResult, InternalError};
