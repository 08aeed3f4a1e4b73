//! Transformation of member statement trees into hardware state machines.
//!
//! Every member of a [`Design`] becomes a [`MemberStateMachine`]: a clocked
//! process stepping through states, started and awaited by its callers over
//! a `Started`/`Finished` handshake. [`transform_design`] drives the whole
//! design, optionally lowering members in parallel, and reports problems
//! through a [`DiagnosticSink`].

#![warn(missing_docs)]

pub mod call_graph;
pub mod component;
pub mod context;
pub mod error;
pub mod hdl;
mod invocation;
mod lower_expr;
mod lower_stmt;
pub mod member;
pub mod naming;
pub mod printer;
pub mod sim;
pub mod state_machine;

pub use call_graph::InvocationGraph;
pub use component::{ArchitectureComponent, GlobalObject};
pub use error::{codes, TransformError};
pub use member::{transform_member, TransformedMember};
pub use naming::{NameTable, ObjectName, Purpose};
pub use printer::Printer;
pub use sim::{InstanceId, SimError, Simulator};
pub use state_machine::{MemberStateMachine, State, FINAL_STATE, FIRST_BODY_STATE, START_STATE};

use hast_common::Interner;
use hast_config::{resolve_member, DiagnosticsConfig, ProjectConfig};
use hast_diagnostics::{Diagnostic, DiagnosticSink, Severity};
use hast_ir::{Design, Method};
use rayon::prelude::*;

/// Every member that transformed successfully, and who invokes whom.
#[derive(Clone, Debug)]
pub struct TransformedDesign {
    /// Transformed members in design order.
    pub members: Vec<TransformedMember>,
    /// The invocation graph between them.
    pub graph: InvocationGraph,
}

impl TransformedDesign {
    /// Looks up a transformed member by name.
    pub fn member(&self, name: hast_common::Ident) -> Option<&TransformedMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// Applies the `[diagnostics]` policy to a warning: listed in `allow` drops
/// it, listed in `deny` raises it to an error. Errors pass through.
pub fn apply_policy(mut diag: Diagnostic, policy: &DiagnosticsConfig) -> Option<Diagnostic> {
    if diag.severity != Severity::Warning {
        return Some(diag);
    }
    let code = diag.code.to_string();
    if policy.allow.iter().any(|c| *c == code) {
        return None;
    }
    if policy.deny.iter().any(|c| *c == code) {
        diag.severity = Severity::Error;
    }
    Some(diag)
}

fn emit(sink: &DiagnosticSink, config: &ProjectConfig, diag: Diagnostic) {
    if let Some(diag) = apply_policy(diag, &config.diagnostics) {
        sink.emit(diag);
    }
}

/// The members to transform: the configured entry points and everything
/// they invoke, or every member when no entry point is configured.
fn select_members<'d>(
    design: &'d Design,
    config: &ProjectConfig,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> Vec<&'d Method> {
    let entry_points = &config.project.entry_points;
    if entry_points.is_empty() {
        return design.methods.values().collect();
    }

    let mut roots = Vec::with_capacity(entry_points.len());
    for entry in entry_points {
        match interner.get(entry).filter(|&i| design.method_by_name(i).is_some()) {
            Some(ident) => roots.push(ident),
            None => emit(
                sink,
                config,
                Diagnostic::error(
                    codes::UNKNOWN_MEMBER,
                    format!("entry point '{entry}' is not a member of the design"),
                )
                .with_help("entry points are full member names, e.g. \"Namespace::Class::Method\""),
            ),
        }
    }

    let mut reachable = design.reachable_from(&roots);
    reachable.sort();
    reachable
        .into_iter()
        .filter_map(|id| design.methods.get(id))
        .collect()
}

/// Transforms the members of `design` selected by `config`.
///
/// A member that fails is reported and left out; the others still transform.
/// Recursive members without a configured recursion depth get a warning.
pub fn transform_design(
    design: &Design,
    config: &ProjectConfig,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> TransformedDesign {
    let selected = select_members(design, config, interner, sink);

    let lower = |method: &&Method| match transform_member(method, design, config, interner) {
        Ok(member) => Some(member),
        Err(err) => {
            emit(sink, config, err.to_diagnostic(interner.resolve(method.name)));
            None
        }
    };
    let results: Vec<Option<TransformedMember>> = if config.transformer.parallel_lowering {
        selected.par_iter().map(lower).collect()
    } else {
        selected.iter().map(lower).collect()
    };

    let members: Vec<TransformedMember> = results.into_iter().flatten().collect();
    for member in &members {
        for warning in &member.warnings {
            emit(sink, config, warning.clone());
        }
    }

    let graph = InvocationGraph::build(&members);
    for recursive in graph.recursive_members() {
        let name = interner.resolve(recursive);
        if resolve_member(config, name).max_recursion_depth == 0 {
            emit(
                sink,
                config,
                Diagnostic::warning(
                    codes::RECURSION_WITHOUT_DEPTH,
                    format!("{name} is recursive but no recursion depth is configured"),
                )
                .with_member(name)
                .with_help(format!(
                    "set max_recursion_depth for \"{name}\" under [members] in hast.toml"
                )),
            );
        }
    }

    TransformedDesign { members, graph }
}
