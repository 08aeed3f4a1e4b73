//! Expression lowering.
//!
//! An expression lowers to an [`HdlExpr`] plus the cursor after it: invoking
//! another member opens new states, so evaluation can end somewhere other
//! than where it began. Assignments and invocations are emitted as
//! statements along the way.

use crate::context::{Cursor, TransformContext};
use crate::error::TransformError;
use crate::hdl::{
    AssignKind, DataObject, DataType, HdlBinaryOp, HdlExpr, HdlStmt, HdlUnaryOp, ObjectKind, Value,
};
use crate::invocation::{build_invocation, build_multi_invocation_wait, build_single_invocation_wait};
use crate::naming::ObjectName;
use hast_common::{Ident, InternalError};
use hast_ir::{BinaryOp, Expr, ExprKind, Literal, TypeId, UnaryOp};

/// Approximate clock cycles one binary operation takes.
fn binary_cost(op: BinaryOp) -> f64 {
    match op {
        BinaryOp::Add | BinaryOp::Sub => 0.1,
        op if op.is_comparison() => 0.1,
        BinaryOp::Mul => 0.5,
        BinaryOp::Div | BinaryOp::Mod => 1.0,
        _ => 0.05,
    }
}

fn unary_cost(op: UnaryOp) -> f64 {
    match op {
        UnaryOp::Neg => 0.1,
        UnaryOp::Not => 0.05,
    }
}

fn binary_op(op: BinaryOp) -> HdlBinaryOp {
    match op {
        BinaryOp::Add => HdlBinaryOp::Add,
        BinaryOp::Sub => HdlBinaryOp::Sub,
        BinaryOp::Mul => HdlBinaryOp::Mul,
        BinaryOp::Div => HdlBinaryOp::Div,
        BinaryOp::Mod => HdlBinaryOp::Mod,
        BinaryOp::And | BinaryOp::LogicAnd => HdlBinaryOp::And,
        BinaryOp::Or | BinaryOp::LogicOr => HdlBinaryOp::Or,
        BinaryOp::Xor => HdlBinaryOp::Xor,
        BinaryOp::Shl => HdlBinaryOp::ShiftLeft,
        BinaryOp::Shr => HdlBinaryOp::ShiftRight,
        BinaryOp::Eq => HdlBinaryOp::Eq,
        BinaryOp::Ne => HdlBinaryOp::Ne,
        BinaryOp::Lt => HdlBinaryOp::Lt,
        BinaryOp::Le => HdlBinaryOp::Le,
        BinaryOp::Gt => HdlBinaryOp::Gt,
        BinaryOp::Ge => HdlBinaryOp::Ge,
    }
}

fn unary_op(op: UnaryOp) -> HdlUnaryOp {
    match op {
        UnaryOp::Not => HdlUnaryOp::Not,
        UnaryOp::Neg => HdlUnaryOp::Neg,
    }
}

/// The constant a literal denotes.
pub(crate) fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::Int(*i),
    }
}

/// Wraps `value` in a conversion unless both types are the same.
pub(crate) fn convert(value: HdlExpr, from: TypeId, to: TypeId, data_type: &DataType) -> HdlExpr {
    if from == to {
        value
    } else {
        HdlExpr::Convert {
            value: Box::new(value),
            to: data_type.clone(),
        }
    }
}

/// The object a source variable lives in.
///
/// Locals and parameters come first. A design-level global is added to the
/// component the first time it is referenced.
pub(crate) fn resolve_variable(
    ctx: &mut TransformContext<'_>,
    name: Ident,
) -> Result<ObjectName, TransformError> {
    if let Some(object) = ctx.scope.variables.get(&name) {
        return Ok(object.clone());
    }

    let design = ctx.design;
    let Some(global) = design.global_by_name(name) else {
        return Err(TransformError::UnknownVariable {
            member: ctx.member_name(),
            name: ctx.resolve(name),
        });
    };
    let object_name = ObjectName::global(name);
    if !ctx.machine.component().contains(&object_name) {
        let data_type =
            ctx.declarable_type(global.ty, || format!("global '{}'", ctx.resolve(name)))?;
        let initial = match &global.init {
            Some(literal) => literal_value(literal),
            None => data_type.default_value(),
        };
        ctx.machine.component_mut().add_global_variable(
            DataObject {
                name: object_name.clone(),
                data_type,
                initial: Some(initial),
            },
            global.shared,
        )?;
    }
    Ok(object_name)
}

/// Lowers an expression that must produce a value.
pub(crate) fn lower_value(
    ctx: &mut TransformContext<'_>,
    cursor: Cursor,
    expr: &Expr,
) -> Result<(Cursor, HdlExpr), TransformError> {
    let (cursor, value) = lower_expr(ctx, cursor, expr)?;
    match value {
        Some(value) => Ok((cursor, value)),
        None => Err(ctx.unsupported_expression(format!(
            "{} used as a value but produces none",
            expr.describe()
        ))),
    }
}

/// Lowers an expression; `None` for expressions without a value, such as the
/// invocation of a void member.
pub(crate) fn lower_expr(
    ctx: &mut TransformContext<'_>,
    cursor: Cursor,
    expr: &Expr,
) -> Result<(Cursor, Option<HdlExpr>), TransformError> {
    match &expr.kind {
        ExprKind::Literal(literal) => Ok((cursor, Some(HdlExpr::Value(literal_value(literal))))),

        ExprKind::Variable(name) => {
            let object = resolve_variable(ctx, *name)?;
            Ok((cursor, Some(HdlExpr::Ref(object))))
        }

        ExprKind::Unary { op, operand } => {
            let (cursor, operand) = lower_value(ctx, cursor, operand)?;
            ctx.add_cost(&cursor, unary_cost(*op))?;
            Ok((
                cursor,
                Some(HdlExpr::Unary {
                    op: unary_op(*op),
                    operand: Box::new(operand),
                }),
            ))
        }

        ExprKind::Binary { op, lhs, rhs } => {
            let (cursor, lhs) = lower_value(ctx, cursor, lhs)?;
            let (cursor, rhs) = lower_value(ctx, cursor, rhs)?;
            ctx.add_cost(&cursor, binary_cost(*op))?;
            Ok((cursor, Some(HdlExpr::binary(binary_op(*op), lhs, rhs))))
        }

        ExprKind::Cast { operand } => {
            let (cursor, value) = lower_value(ctx, cursor, operand)?;
            let data_type = ctx.declarable_type(expr.ty, || "conversion".to_string())?;
            Ok((cursor, Some(convert(value, operand.ty, expr.ty, &data_type))))
        }

        ExprKind::Index { array, index } => {
            let (cursor, array) = lower_value(ctx, cursor, array)?;
            let (cursor, index) = lower_value(ctx, cursor, index)?;
            Ok((
                cursor,
                Some(HdlExpr::Index {
                    array: Box::new(array),
                    index: Box::new(index),
                }),
            ))
        }

        ExprKind::Assign { target, value } => {
            let (cursor, place, kind) = lower_place(ctx, cursor, target)?;
            let (cursor, assigned) = lower_value(ctx, cursor, value)?;
            let data_type = ctx.declarable_type(target.ty, || "assignment target".to_string())?;
            ctx.emit(
                &cursor,
                HdlStmt::Assign {
                    target: place.clone(),
                    value: convert(assigned, value.ty, target.ty, &data_type),
                    kind,
                },
            )?;
            Ok((cursor, Some(place)))
        }

        ExprKind::Call { member, args } => {
            let cursor = build_invocation(ctx, cursor, *member, args, 1)?;
            build_single_invocation_wait(ctx, cursor, *member)
        }

        ExprKind::StartInvocation {
            member,
            args,
            degree,
        } => {
            let cursor = build_invocation(ctx, cursor, *member, args, *degree)?;
            Ok((cursor, None))
        }

        ExprKind::AwaitInvocations {
            member,
            degree,
            mode,
        } => {
            let (cursor, results) = build_multi_invocation_wait(ctx, cursor, *member, *degree, *mode)?;
            let values: Option<Vec<HdlExpr>> = results.into_iter().collect();
            Ok((cursor, values.map(HdlExpr::Aggregate)))
        }

        ExprKind::Unsupported { text } => Err(ctx.unsupported_expression(text.clone())),
    }
}

/// Lowers an assignment target: a variable, or an element of one.
fn lower_place(
    ctx: &mut TransformContext<'_>,
    cursor: Cursor,
    target: &Expr,
) -> Result<(Cursor, HdlExpr, AssignKind), TransformError> {
    match &target.kind {
        ExprKind::Variable(name) => {
            let object = resolve_variable(ctx, *name)?;
            let kind = match ctx.machine.component().object(&object) {
                Some((_, ObjectKind::Variable)) => AssignKind::Variable,
                Some((_, ObjectKind::Signal)) => AssignKind::Signal,
                None => {
                    return Err(InternalError::new(format!(
                        "resolved variable {object:?} is not owned by the component"
                    ))
                    .into())
                }
            };
            Ok((cursor, HdlExpr::Ref(object), kind))
        }
        ExprKind::Index { array, index } => {
            let (cursor, array, kind) = lower_place(ctx, cursor, array)?;
            let (cursor, index) = lower_value(ctx, cursor, index)?;
            Ok((
                cursor,
                HdlExpr::Index {
                    array: Box::new(array),
                    index: Box::new(index),
                },
                kind,
            ))
        }
        _ => Err(ctx.unsupported_expression(format!(
            "assignment to {}",
            target.describe()
        ))),
    }
}
