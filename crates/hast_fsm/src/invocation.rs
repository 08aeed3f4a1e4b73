//! The invocation protocol between a caller and the members it invokes.
//!
//! A caller talks to instance `i` of a target through a channel of signals
//! it owns or reads:
//!
//! - `<caller>.<target>._Started.<i>`: driven by the caller, high while the
//!   instance is requested.
//! - `<caller>.<target>._Finished.<i>`: driven by the instance, high once it
//!   reached its final state.
//! - `<caller>.<target>.<p>.parameter.<i>`: one per formal parameter, driven
//!   by the caller.
//! - `<caller>.<target>.return.<i>`: the result, driven by the instance.
//!
//! An instance is idle when `Started = Finished`: both low before it was ever
//! started, both high once it finished. Waiting therefore tests that equality
//! and then drops `Started`, which sends the instance back to its start state.

use crate::context::{Cursor, TransformContext};
use crate::error::TransformError;
use crate::hdl::{
    binary_chain, AssignKind, CaseArm, Choice, DataObject, DataType, HdlBinaryOp, HdlExpr,
    HdlStmt, Value,
};
use crate::lower_expr::{convert, lower_value};
use crate::naming::ObjectName;
use hast_common::{Ident, InternalError};
use hast_config::resolve_member;
use hast_ir::{Expr, TypeId, WaitMode};

/// A formal parameter of an invoked member.
struct CalleeParameter {
    name: Ident,
    ty: TypeId,
    data_type: DataType,
}

/// What a call site needs to know about the invoked member.
struct Callee {
    params: Vec<CalleeParameter>,
    return_type: Option<DataType>,
}

/// Looks up `target` and validates a request for `requested` instances of it.
///
/// Nothing is mutated, so a rejected call site leaves the machine as it was.
fn resolve_callee(
    ctx: &TransformContext<'_>,
    target: Ident,
    requested: u32,
) -> Result<Callee, TransformError> {
    let design = ctx.design;
    let target_name = ctx.resolve(target);
    let method = design
        .method_by_name(target)
        .ok_or_else(|| TransformError::UnknownMember {
            member: ctx.member_name(),
            target: target_name.clone(),
        })?;

    if requested == 0 {
        return Err(ctx.unsupported_expression(format!(
            "invocation of {target_name} with zero instances"
        )));
    }
    let configured = resolve_member(ctx.config, &target_name).max_degree_of_parallelism;
    if requested > configured {
        return Err(TransformError::ParallelismExceeded {
            caller: ctx.member_name(),
            target: target_name,
            requested,
            configured,
        });
    }

    let mut params = Vec::with_capacity(method.params.len());
    for param in &method.params {
        let data_type = ctx.declarable_type(param.ty, || {
            format!("parameter '{}' of {target_name}", ctx.resolve(param.name))
        })?;
        params.push(CalleeParameter {
            name: param.name,
            ty: param.ty,
            data_type,
        });
    }
    let return_type = if design.types.is_void(method.return_ty) {
        None
    } else {
        Some(ctx.declarable_type(method.return_ty, || {
            format!("return value of {target_name}")
        })?)
    };

    Ok(Callee {
        params,
        return_type,
    })
}

/// Creates the `Started`, `Finished` and parameter signals of one channel,
/// unless they already exist.
fn ensure_channel(
    ctx: &mut TransformContext<'_>,
    target: Ident,
    index: u32,
    callee: &Callee,
) -> Result<(), TransformError> {
    let caller = ctx.method.name;
    let component = ctx.machine.component_mut();

    let started = ObjectName::channel_started(caller, target, index);
    if !component.contains(&started) {
        component.add_internally_driven_signal(DataObject {
            name: started,
            data_type: DataType::Boolean,
            initial: Some(Value::Bool(false)),
        })?;
    }
    let finished = ObjectName::channel_finished(caller, target, index);
    if !component.contains(&finished) {
        component.add_externally_driven_signal(DataObject {
            name: finished,
            data_type: DataType::Boolean,
            initial: None,
        })?;
    }
    for param in &callee.params {
        let signal = ObjectName::channel_parameter(caller, target, param.name, index);
        if !component.contains(&signal) {
            component.add_internally_driven_signal(DataObject {
                name: signal,
                data_type: param.data_type.clone(),
                initial: None,
            })?;
        }
    }
    Ok(())
}

/// The return signal of one channel, created on first use.
fn ensure_return(
    ctx: &mut TransformContext<'_>,
    target: Ident,
    index: u32,
    data_type: &DataType,
) -> Result<ObjectName, TransformError> {
    let name = ObjectName::channel_return(ctx.method.name, target, index);
    let component = ctx.machine.component_mut();
    if !component.contains(&name) {
        component.add_externally_driven_signal(DataObject {
            name: name.clone(),
            data_type: data_type.clone(),
            initial: None,
        })?;
    }
    Ok(name)
}

/// The round-robin pointer into the instance pool of `target`, widened so it
/// can address `count` instances.
fn ensure_invocation_index(
    ctx: &mut TransformContext<'_>,
    target: Ident,
    count: u32,
) -> Result<ObjectName, TransformError> {
    let name = ObjectName::invocation_index(ctx.method.name, target);
    let high = i64::from(count) - 1;
    let component = ctx.machine.component_mut();
    match component.local_variable_mut(&name) {
        Some(object) => {
            if let DataType::Range { high: current, .. } = &mut object.data_type {
                *current = (*current).max(high);
            }
        }
        None => component.add_local_variable(DataObject {
            name: name.clone(),
            data_type: DataType::Range { low: 0, high },
            initial: Some(Value::Int(0)),
        })?,
    }
    Ok(name)
}

/// Parameter assignments followed by `Started <= true` for one instance.
fn invocation_block(
    caller: Ident,
    target: Ident,
    index: u32,
    callee: &Callee,
    arguments: &[HdlExpr],
) -> Vec<HdlStmt> {
    let mut block: Vec<HdlStmt> = callee
        .params
        .iter()
        .zip(arguments)
        .map(|(param, value)| HdlStmt::Assign {
            target: HdlExpr::Ref(ObjectName::channel_parameter(
                caller, target, param.name, index,
            )),
            value: value.clone(),
            kind: AssignKind::Signal,
        })
        .collect();
    block.push(assign_started(caller, target, index, true));
    block
}

fn assign_started(caller: Ident, target: Ident, index: u32, value: bool) -> HdlStmt {
    HdlStmt::Assign {
        target: HdlExpr::Ref(ObjectName::channel_started(caller, target, index)),
        value: HdlExpr::bool(value),
        kind: AssignKind::Signal,
    }
}

/// Starts `count` instances' worth of `target`: one instance when `count` is
/// 1, otherwise the next instance of the pool in round-robin order.
pub(crate) fn build_invocation(
    ctx: &mut TransformContext<'_>,
    cursor: Cursor,
    target: Ident,
    args: &[Expr],
    count: u32,
) -> Result<Cursor, TransformError> {
    let callee = resolve_callee(ctx, target, count)?;
    if args.len() != callee.params.len() {
        return Err(TransformError::ArgumentCountMismatch {
            member: ctx.member_name(),
            target: ctx.resolve(target),
            expected: callee.params.len(),
            found: args.len(),
        });
    }

    let mut cursor = cursor;
    let mut arguments = Vec::with_capacity(args.len());
    for (arg, param) in args.iter().zip(&callee.params) {
        let (next, value) = lower_value(ctx, cursor, arg)?;
        cursor = next;
        arguments.push(convert(value, arg.ty, param.ty, &param.data_type));
    }

    let caller = ctx.method.name;
    ctx.machine
        .component_mut()
        .record_invocation_instance_count(target, count);
    for index in 0..count {
        ensure_channel(ctx, target, index, &callee)?;
    }

    // Restarting an instance in the very state that observed it finish would
    // raise Started again before the instance saw it drop.
    if (0..count).any(|i| ctx.scope.is_finished_in(cursor.state, target, i)) {
        let comment = format!("Restarting {}", ctx.resolve(target));
        let restart = ctx.add_state(comment);
        ctx.emit_state_change(&cursor, restart)?;
        cursor = Cursor::root(restart);
    }

    if count == 1 {
        for stmt in invocation_block(caller, target, 0, &callee, &arguments) {
            ctx.emit(&cursor, stmt)?;
        }
        return Ok(cursor);
    }

    let index_variable = ensure_invocation_index(ctx, target, count)?;
    let mut arms: Vec<CaseArm> = (0..count)
        .map(|index| CaseArm {
            choice: Choice::Match(HdlExpr::int(i64::from(index))),
            body: invocation_block(caller, target, index, &callee, &arguments),
        })
        .collect();
    arms.push(CaseArm {
        choice: Choice::Others,
        body: Vec::new(),
    });
    ctx.emit(
        &cursor,
        HdlStmt::Case {
            subject: HdlExpr::Ref(index_variable.clone()),
            arms,
        },
    )?;
    ctx.emit(
        &cursor,
        HdlStmt::If {
            condition: HdlExpr::equals(
                HdlExpr::Ref(index_variable.clone()),
                HdlExpr::int(i64::from(count) - 1),
            ),
            then_body: vec![HdlStmt::Assign {
                target: HdlExpr::Ref(index_variable.clone()),
                value: HdlExpr::int(0),
                kind: AssignKind::Variable,
            }],
            else_body: vec![HdlStmt::Assign {
                target: HdlExpr::Ref(index_variable.clone()),
                value: HdlExpr::binary(
                    HdlBinaryOp::Add,
                    HdlExpr::Ref(index_variable),
                    HdlExpr::int(1),
                ),
                kind: AssignKind::Variable,
            }],
        },
    )?;
    Ok(cursor)
}

/// Waits for instance 0 of `target`; yields its result for non-void targets.
pub(crate) fn build_single_invocation_wait(
    ctx: &mut TransformContext<'_>,
    cursor: Cursor,
    target: Ident,
) -> Result<(Cursor, Option<HdlExpr>), TransformError> {
    let (cursor, mut results) =
        build_invocation_wait(ctx, cursor, target, 1, WaitMode::All, false)?;
    Ok((cursor, results.pop().flatten()))
}

/// Waits for all, or any, of the first `count` instances of `target`; yields
/// one result per instance for non-void targets.
pub(crate) fn build_multi_invocation_wait(
    ctx: &mut TransformContext<'_>,
    cursor: Cursor,
    target: Ident,
    count: u32,
    mode: WaitMode,
) -> Result<(Cursor, Vec<Option<HdlExpr>>), TransformError> {
    build_invocation_wait(ctx, cursor, target, count, mode, true)
}

fn build_invocation_wait(
    ctx: &mut TransformContext<'_>,
    cursor: Cursor,
    target: Ident,
    count: u32,
    mode: WaitMode,
    pooled: bool,
) -> Result<(Cursor, Vec<Option<HdlExpr>>), TransformError> {
    let callee = resolve_callee(ctx, target, count)?;
    let caller = ctx.method.name;
    for index in 0..count {
        ensure_channel(ctx, target, index, &callee)?;
    }
    let index_variable = if pooled {
        Some(ensure_invocation_index(ctx, target, count)?)
    } else {
        None
    };

    let target_name = ctx.resolve(target);
    let waiting = ctx.add_state(format!("Waiting for {target_name} to finish"));
    ctx.emit_state_change(&cursor, waiting)?;
    let done = ctx.add_state(format!("State after waiting for {target_name}"));

    let op = match mode {
        WaitMode::All => HdlBinaryOp::And,
        WaitMode::Any => HdlBinaryOp::Or,
    };
    let idle = (0..count)
        .map(|index| {
            HdlExpr::equals(
                HdlExpr::Ref(ObjectName::channel_started(caller, target, index)),
                HdlExpr::Ref(ObjectName::channel_finished(caller, target, index)),
            )
        })
        .collect();
    let condition = binary_chain(op, idle)
        .ok_or_else(|| InternalError::new("waiting for zero instances"))?;

    let mut then_body: Vec<HdlStmt> = (0..count)
        .map(|index| assign_started(caller, target, index, false))
        .collect();
    if let Some(index_variable) = index_variable {
        then_body.push(HdlStmt::Assign {
            target: HdlExpr::Ref(index_variable),
            value: HdlExpr::int(0),
            kind: AssignKind::Variable,
        });
    }
    then_body.push(ctx.machine.state_change(done));
    ctx.emit(
        &Cursor::root(waiting),
        HdlStmt::If {
            condition,
            then_body,
            else_body: Vec::new(),
        },
    )?;

    let mut results = Vec::with_capacity(count as usize);
    for index in 0..count {
        ctx.scope.record_finished(done, target, index);
        let result = match &callee.return_type {
            Some(data_type) => Some(HdlExpr::Ref(ensure_return(
                ctx, target, index, data_type,
            )?)),
            None => None,
        };
        results.push(result);
    }
    Ok((Cursor::root(done), results))
}
