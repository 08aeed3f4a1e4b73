//! Errors that abort the transformation of one member.

use hast_common::InternalError;
use hast_diagnostics::{Category, Diagnostic, DiagnosticCode};

/// Stable diagnostic codes emitted by the transformer.
pub mod codes {
    use super::{Category, DiagnosticCode};

    /// A statement kind the lowering has no rule for.
    pub const UNSUPPORTED_STATEMENT: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);
    /// An expression kind the lowering has no rule for.
    pub const UNSUPPORTED_EXPRESSION: DiagnosticCode = DiagnosticCode::new(Category::Error, 102);
    /// `break` with no enclosing loop or switch.
    pub const BREAK_OUTSIDE_LOOP: DiagnosticCode = DiagnosticCode::new(Category::Error, 103);
    /// `goto` to a label the member does not declare.
    pub const UNKNOWN_LABEL: DiagnosticCode = DiagnosticCode::new(Category::Error, 104);
    /// Reference to an undeclared variable.
    pub const UNKNOWN_VARIABLE: DiagnosticCode = DiagnosticCode::new(Category::Error, 105);
    /// Invocation of, or entry point naming, a member not in the design.
    pub const UNKNOWN_MEMBER: DiagnosticCode = DiagnosticCode::new(Category::Error, 106);
    /// A value whose type has no hardware representation.
    pub const UNDECLARABLE_TYPE: DiagnosticCode = DiagnosticCode::new(Category::Error, 107);
    /// Argument list length differs from the parameter list.
    pub const ARGUMENT_COUNT_MISMATCH: DiagnosticCode = DiagnosticCode::new(Category::Error, 108);
    /// The same label declared twice in one member.
    pub const DUPLICATE_LABEL: DiagnosticCode = DiagnosticCode::new(Category::Error, 109);
    /// A bug in hast.
    pub const INTERNAL: DiagnosticCode = DiagnosticCode::new(Category::Error, 999);
    /// More parallel instances requested than configured.
    pub const PARALLELISM_EXCEEDED: DiagnosticCode =
        DiagnosticCode::new(Category::Configuration, 1);
    /// A `throw` was dropped.
    pub const THROW_OMITTED: DiagnosticCode = DiagnosticCode::new(Category::Warning, 1);
    /// A recursive member has no configured recursion depth.
    pub const RECURSION_WITHOUT_DEPTH: DiagnosticCode = DiagnosticCode::new(Category::Warning, 2);
}

/// A fatal problem with one member (or one of its call sites).
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// A call site asks for more concurrent instances than configured.
    #[error(
        "{caller} invokes {target} with {requested} parallel instance(s) but at most {configured} are configured"
    )]
    ParallelismExceeded {
        /// The invoking member.
        caller: String,
        /// The invoked member.
        target: String,
        /// Instances requested at the call site.
        requested: u32,
        /// The configured maximum degree of parallelism.
        configured: u32,
    },

    /// A statement kind outside the supported set.
    #[error("unsupported statement in {member}: {text}")]
    UnsupportedStatement {
        /// The enclosing member.
        member: String,
        /// The offending statement.
        text: String,
    },

    /// An expression kind outside the supported set.
    #[error("unsupported expression in {member}: {text}")]
    UnsupportedExpression {
        /// The enclosing member.
        member: String,
        /// The offending expression.
        text: String,
    },

    /// `break` with no enclosing loop or switch.
    #[error("break outside of a loop or switch in {member}")]
    BreakOutsideLoop {
        /// The enclosing member.
        member: String,
    },

    /// `goto` to an undeclared label.
    #[error("goto to unknown label '{label}' in {member}")]
    UnknownLabel {
        /// The enclosing member.
        member: String,
        /// The label.
        label: String,
    },

    /// A label declared more than once in the same member.
    #[error("label '{label}' is declared more than once in {member}")]
    DuplicateLabel {
        /// The enclosing member.
        member: String,
        /// The label.
        label: String,
    },

    /// A reference to something that is neither a local, a parameter nor a global.
    #[error("unknown variable '{name}' in {member}")]
    UnknownVariable {
        /// The enclosing member.
        member: String,
        /// The variable.
        name: String,
    },

    /// An invocation of a member the design does not contain.
    #[error("{member} invokes unknown member '{target}'")]
    UnknownMember {
        /// The invoking member.
        member: String,
        /// The missing member.
        target: String,
    },

    /// An invocation with the wrong number of arguments.
    #[error("{member} invokes {target} with {found} argument(s) but it takes {expected}")]
    ArgumentCountMismatch {
        /// The invoking member.
        member: String,
        /// The invoked member.
        target: String,
        /// Number of formal parameters.
        expected: usize,
        /// Number of arguments given.
        found: usize,
    },

    /// A value whose type cannot become a hardware data type.
    #[error("{what} in {member} has a type without a hardware representation")]
    UndeclarableType {
        /// The enclosing member.
        member: String,
        /// What has the type, e.g. `variable 'x'`.
        what: String,
    },

    /// A broken invariant of the transformer itself.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl TransformError {
    /// The diagnostic code of this error.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            TransformError::ParallelismExceeded { .. } => codes::PARALLELISM_EXCEEDED,
            TransformError::UnsupportedStatement { .. } => codes::UNSUPPORTED_STATEMENT,
            TransformError::UnsupportedExpression { .. } => codes::UNSUPPORTED_EXPRESSION,
            TransformError::BreakOutsideLoop { .. } => codes::BREAK_OUTSIDE_LOOP,
            TransformError::UnknownLabel { .. } => codes::UNKNOWN_LABEL,
            TransformError::DuplicateLabel { .. } => codes::DUPLICATE_LABEL,
            TransformError::UnknownVariable { .. } => codes::UNKNOWN_VARIABLE,
            TransformError::UnknownMember { .. } => codes::UNKNOWN_MEMBER,
            TransformError::ArgumentCountMismatch { .. } => codes::ARGUMENT_COUNT_MISMATCH,
            TransformError::UndeclarableType { .. } => codes::UNDECLARABLE_TYPE,
            TransformError::Internal(_) => codes::INTERNAL,
        }
    }

    /// Converts the error into an error diagnostic about `member`.
    pub fn to_diagnostic(&self, member: &str) -> Diagnostic {
        let diag = Diagnostic::error(self.code(), self.to_string()).with_member(member);
        match self {
            TransformError::ParallelismExceeded { target, .. } => diag
                .with_construct(format!("invocation of {target}"))
                .with_help(format!(
                    "raise max_degree_of_parallelism for \"{target}\" under [members] in hast.toml"
                )),
            TransformError::UnsupportedStatement { text, .. }
            | TransformError::UnsupportedExpression { text, .. } => diag.with_construct(text),
            TransformError::BreakOutsideLoop { .. } => diag.with_construct("break statement"),
            TransformError::UnknownLabel { label, .. } => {
                diag.with_construct(format!("goto {label}"))
            }
            TransformError::DuplicateLabel { label, .. } => {
                diag.with_construct(format!("{label}:"))
            }
            TransformError::ArgumentCountMismatch { target, .. }
            | TransformError::UnknownMember { target, .. } => {
                diag.with_construct(format!("invocation of {target}"))
            }
            TransformError::UndeclarableType { what, .. } => diag.with_construct(what),
            TransformError::UnknownVariable { .. } => diag,
            TransformError::Internal(_) => {
                diag.with_note("this is a bug in hast, not a problem with the design")
            }
        }
    }
}
