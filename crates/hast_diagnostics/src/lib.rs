//! Diagnostic creation, severity management, and rendering.
//!
//! The transformer reports unsupported input, configuration violations, and
//! degraded-but-continued lowering through structured [`Diagnostic`]s. The
//! thread-safe [`DiagnosticSink`] collects them while members are lowered in
//! parallel, and [`DiagnosticRenderer`] implementations format them for a
//! terminal or as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
