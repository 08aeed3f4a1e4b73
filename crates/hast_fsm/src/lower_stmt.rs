//! Statement lowering.
//!
//! Each statement is appended at a [`Cursor`] and returns the cursor the next
//! statement continues from. Control flow opens new states and links them
//! with transitions. A transition appended at the end of a block is
//! conditional on the machine still being in that block's state, so it never
//! overrides a jump (`return`, `break`, `goto`) taken earlier in the cycle.

use crate::context::{Breakable, Cursor, TransformContext};
use crate::error::{codes, TransformError};
use crate::hdl::{binary_chain, AssignKind, CaseArm, Choice, HdlBinaryOp, HdlExpr, HdlStmt};
use crate::lower_expr::{convert, lower_expr, lower_value};
use crate::naming::ObjectName;
use crate::state_machine::{BlockStep, FINAL_STATE};
use hast_diagnostics::Diagnostic;
use hast_ir::{CaseLabel, DeclKind, Expr, Statement, SwitchSection, TypeId};

/// Lowers one statement at `cursor`.
pub(crate) fn lower_statement(
    ctx: &mut TransformContext<'_>,
    cursor: Cursor,
    stmt: &Statement,
) -> Result<Cursor, TransformError> {
    match stmt {
        Statement::Block(stmts) => lower_block(ctx, cursor, stmts),
        Statement::Empty => Ok(cursor),

        Statement::VarDecl {
            name, ty, init, kind, ..
        } => {
            if *kind == DeclKind::Placeholder {
                return Ok(cursor);
            }
            let data_type =
                ctx.declarable_type(*ty, || format!("variable '{}'", ctx.resolve(*name)))?;
            let base = ObjectName::variable(ctx.method.name, *name);
            let object = ctx.machine.component_mut().create_variable_with_next_unused_indexed_name(
                &base,
                data_type.clone(),
                Some(data_type.default_value()),
            );
            ctx.scope.variables.insert(*name, object.clone());

            match init {
                Some(init) => {
                    let (cursor, value) = lower_value(ctx, cursor, init)?;
                    ctx.emit(
                        &cursor,
                        HdlStmt::Assign {
                            target: HdlExpr::Ref(object),
                            value: convert(value, init.ty, *ty, &data_type),
                            kind: AssignKind::Variable,
                        },
                    )?;
                    Ok(cursor)
                }
                None => Ok(cursor),
            }
        }

        Statement::Expr(expr) => {
            let (cursor, _) = lower_expr(ctx, cursor, expr)?;
            Ok(cursor)
        }

        Statement::Return(value) => lower_return(ctx, cursor, value.as_ref()),

        Statement::If {
            condition,
            then_body,
            else_body,
        } => lower_if(ctx, cursor, condition, then_body, else_body.as_deref()),

        Statement::While { condition, body } => lower_while(ctx, cursor, condition, body),

        Statement::Switch { subject, sections } => lower_switch(ctx, cursor, subject, sections),

        Statement::Break => {
            match ctx.scope.breakables.last().copied() {
                Some(Breakable::Switch) => {}
                Some(Breakable::Loop { after }) => ctx.emit_state_change(&cursor, after)?,
                None => {
                    return Err(TransformError::BreakOutsideLoop {
                        member: ctx.member_name(),
                    })
                }
            }
            Ok(cursor)
        }

        Statement::Goto(label) => {
            let target = *ctx
                .scope
                .labels
                .get(label)
                .ok_or_else(|| TransformError::UnknownLabel {
                    member: ctx.member_name(),
                    label: ctx.resolve(*label),
                })?;
            ctx.emit_state_change(&cursor, target)?;
            Ok(cursor)
        }

        Statement::Label(label) => {
            let target = *ctx
                .scope
                .labels
                .get(label)
                .ok_or_else(|| TransformError::UnknownLabel {
                    member: ctx.member_name(),
                    label: ctx.resolve(*label),
                })?;
            ctx.emit_conditional_state_change(&cursor, target)?;
            Ok(Cursor::root(target))
        }

        Statement::Throw { text } => {
            ctx.emit(&cursor, HdlStmt::Comment(format!("Omitted exception: {text}")))?;
            ctx.warn(
                Diagnostic::warning(
                    codes::THROW_OMITTED,
                    "throw statement omitted; hardware has no exceptions",
                )
                .with_construct(text.clone()),
            );
            Ok(cursor)
        }

        Statement::Unsupported { .. } => Err(ctx.unsupported_statement(stmt.describe())),
    }
}

/// Lowers a statement list in order.
///
/// Statements after a `return`, a `goto` or a loop `break` in the same list still get
/// lowered, into a state of their own, so they cannot run in the cycle the
/// jump is taken.
fn lower_block(
    ctx: &mut TransformContext<'_>,
    cursor: Cursor,
    stmts: &[Statement],
) -> Result<Cursor, TransformError> {
    let mut cursor = cursor;
    for (i, stmt) in stmts.iter().enumerate() {
        let jumps = match stmt {
            Statement::Return(_) | Statement::Goto(_) => true,
            Statement::Break => matches!(ctx.scope.breakables.last(), Some(Breakable::Loop { .. })),
            _ => false,
        };
        cursor = lower_statement(ctx, cursor, stmt)?;
        if jumps && i + 1 < stmts.len() {
            cursor = Cursor::root(ctx.add_state("Code after an unconditional jump"));
        }
    }
    Ok(cursor)
}

fn lower_return(
    ctx: &mut TransformContext<'_>,
    cursor: Cursor,
    value: Option<&Expr>,
) -> Result<Cursor, TransformError> {
    let mut cursor = cursor;
    if let Some(value) = value {
        let return_ty = ctx.method.return_ty;
        match ctx.machine.return_signal().cloned() {
            Some(signal) => {
                let (next, lowered) = lower_value(ctx, cursor, value)?;
                cursor = next;
                let data_type = ctx.declarable_type(return_ty, || "return value".to_string())?;
                ctx.emit(
                    &cursor,
                    HdlStmt::Assign {
                        target: HdlExpr::Ref(signal),
                        value: convert(lowered, value.ty, return_ty, &data_type),
                        kind: AssignKind::Signal,
                    },
                )?;
            }
            None => {
                let (next, _) = lower_expr(ctx, cursor, value)?;
                cursor = next;
            }
        }
    }
    ctx.emit_state_change(&cursor, FINAL_STATE)?;
    Ok(cursor)
}

fn lower_if(
    ctx: &mut TransformContext<'_>,
    cursor: Cursor,
    condition: &Expr,
    then_body: &Statement,
    else_body: Option<&Statement>,
) -> Result<Cursor, TransformError> {
    let (cursor, condition) = lower_value(ctx, cursor, condition)?;
    let true_state = ctx.add_state("True branch of an if statement");
    let false_state = else_body.map(|_| ctx.add_state("False branch of an if statement"));
    let after = ctx.add_state("State after an if statement");

    ctx.emit(
        &cursor,
        HdlStmt::If {
            condition,
            then_body: vec![ctx.machine.state_change(true_state)],
            else_body: vec![ctx.machine.state_change(false_state.unwrap_or(after))],
        },
    )?;

    let end = lower_statement(ctx, Cursor::root(true_state), then_body)?;
    ctx.emit_conditional_state_change(&end, after)?;
    if let (Some(false_state), Some(else_body)) = (false_state, else_body) {
        let end = lower_statement(ctx, Cursor::root(false_state), else_body)?;
        ctx.emit_conditional_state_change(&end, after)?;
    }
    Ok(Cursor::root(after))
}

fn lower_while(
    ctx: &mut TransformContext<'_>,
    cursor: Cursor,
    condition: &Expr,
    body: &Statement,
) -> Result<Cursor, TransformError> {
    let loop_state = if cursor.is_root() && ctx.state_is_blank(cursor.state) {
        cursor.state
    } else {
        let state = ctx.add_state("Repeated state of a while loop");
        ctx.emit_conditional_state_change(&cursor, state)?;
        state
    };
    let after = ctx.add_state("State after a while loop");

    let (condition_end, condition) = lower_value(ctx, Cursor::root(loop_state), condition)?;
    let position = ctx.emit(
        &condition_end,
        HdlStmt::If {
            condition,
            then_body: Vec::new(),
            else_body: vec![ctx.machine.state_change(after)],
        },
    )?;

    ctx.scope.breakables.push(Breakable::Loop { after });
    let end = lower_statement(ctx, condition_end.child(BlockStep::Then(position)), body);
    ctx.scope.breakables.pop();
    let end = end?;

    ctx.emit_conditional_state_change(&end, loop_state)?;
    Ok(Cursor::root(after))
}

fn lower_switch(
    ctx: &mut TransformContext<'_>,
    cursor: Cursor,
    subject: &Expr,
    sections: &[SwitchSection],
) -> Result<Cursor, TransformError> {
    let (cursor, subject_value) = lower_value(ctx, cursor, subject)?;

    let mut arms = Vec::with_capacity(sections.len() + 1);
    let mut default_arm = None;
    let mut section_states = Vec::with_capacity(sections.len());
    for section in sections {
        let state = ctx.add_state("Case of a switch statement");
        section_states.push(state);
        let body = vec![ctx.machine.state_change(state)];
        if section.is_default() {
            default_arm = Some(CaseArm {
                choice: Choice::Others,
                body,
            });
            continue;
        }

        let mut alternatives = Vec::with_capacity(section.labels.len());
        for label in &section.labels {
            if let CaseLabel::Value(value) = label {
                alternatives.push(lower_case_label(ctx, &cursor, value, subject.ty)?);
            }
        }
        let choice = binary_chain(HdlBinaryOp::Alternative, alternatives)
            .ok_or_else(|| ctx.unsupported_statement("switch section without labels"))?;
        arms.push(CaseArm {
            choice: Choice::Match(choice),
            body,
        });
    }

    let after = ctx.add_state("State after a switch statement");
    arms.push(default_arm.unwrap_or_else(|| CaseArm {
        choice: Choice::Others,
        body: vec![ctx.machine.state_change(after)],
    }));
    ctx.emit(
        &cursor,
        HdlStmt::Case {
            subject: subject_value,
            arms,
        },
    )?;

    for (section, state) in sections.iter().zip(section_states) {
        ctx.scope.breakables.push(Breakable::Switch);
        let end = lower_block(ctx, Cursor::root(state), &section.body);
        ctx.scope.breakables.pop();
        let end = end?;
        ctx.emit_conditional_state_change(&end, after)?;
    }
    Ok(Cursor::root(after))
}

/// A case label, which must not need states of its own.
fn lower_case_label(
    ctx: &mut TransformContext<'_>,
    cursor: &Cursor,
    label: &Expr,
    subject_ty: TypeId,
) -> Result<HdlExpr, TransformError> {
    let (end, value) = lower_value(ctx, cursor.clone(), label)?;
    if &end != cursor {
        return Err(ctx.unsupported_expression(format!(
            "{} as a case label",
            label.describe()
        )));
    }
    if label.ty == subject_ty {
        return Ok(value);
    }
    let data_type = ctx.declarable_type(subject_ty, || "switch subject".to_string())?;
    Ok(convert(value, label.ty, subject_ty, &data_type))
}
