//! Transformation of one member into its state machine.

use crate::context::{Cursor, TransformContext};
use crate::error::TransformError;
use crate::lower_stmt::lower_statement;
use crate::state_machine::{MemberStateMachine, FINAL_STATE, FIRST_BODY_STATE};
use hast_common::{Ident, Interner, InternalError};
use hast_config::ProjectConfig;
use hast_diagnostics::Diagnostic;
use hast_ir::{Design, Method};

/// The result of transforming one member.
#[derive(Clone, Debug)]
pub struct TransformedMember {
    /// The member's full name.
    pub name: Ident,
    /// The generated machine.
    pub machine: MemberStateMachine,
    /// Warnings raised while lowering it.
    pub warnings: Vec<Diagnostic>,
}

/// Builds the state machine of `method`.
///
/// Parameters become latched signals, the return value an internally driven
/// signal, and the body is lowered starting in state 2. Every label of the
/// body gets its state up front so a `goto` can jump forward.
pub fn transform_member(
    method: &Method,
    design: &Design,
    config: &ProjectConfig,
    interner: &Interner,
) -> Result<TransformedMember, TransformError> {
    let mut ctx = TransformContext::new(design, config, interner, method)?;

    for param in &method.params {
        let data_type = ctx.declarable_type(param.ty, || {
            format!("parameter '{}'", interner.resolve(param.name))
        })?;
        let variable = ctx.machine.add_parameter(param.name, data_type)?;
        ctx.scope.variables.insert(param.name, variable);
    }
    if !design.types.is_void(method.return_ty) {
        let data_type = ctx.declarable_type(method.return_ty, || "return value".to_string())?;
        ctx.machine.set_return_type(data_type)?;
    }

    let first = ctx.add_state(format!("First state of {}", interner.resolve(method.name)));
    if first != FIRST_BODY_STATE {
        return Err(InternalError::new(format!(
            "member body starts in state {first} instead of {FIRST_BODY_STATE}"
        ))
        .into());
    }

    let mut labels = Vec::new();
    method.body.collect_labels(&mut labels);
    for label in labels {
        if ctx.scope.labels.contains_key(&label) {
            return Err(TransformError::DuplicateLabel {
                member: ctx.member_name(),
                label: interner.resolve(label).to_string(),
            });
        }
        let state = ctx.add_state(format!("Label {}", interner.resolve(label)));
        ctx.scope.labels.insert(label, state);
    }

    let end = lower_statement(&mut ctx, Cursor::root(first), &method.body)?;
    ctx.emit_conditional_state_change(&end, FINAL_STATE)?;

    Ok(TransformedMember {
        name: method.name,
        machine: ctx.machine,
        warnings: ctx.warnings,
    })
}
