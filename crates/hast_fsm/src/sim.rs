//! Cycle-level simulation of member state machines.
//!
//! Each [`MemberStateMachine`] added becomes an instance running its clocked
//! process once per [`Simulator::step`]. Variable assignments take effect
//! immediately; signal assignments are collected as pending updates and
//! committed after every instance ran, so all instances see the same values
//! within one cycle. Bindings then copy objects across instances, which is
//! how a caller's channel is wired to a callee.

use crate::hdl::{AssignKind, Choice, DataType, HdlBinaryOp, HdlExpr, HdlStmt, HdlUnaryOp, Value};
use crate::naming::ObjectName;
use crate::state_machine::MemberStateMachine;
use hast_common::Interner;
use std::collections::HashMap;

/// Errors raised while simulating.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// An expression or binding names an object the instance does not own.
    #[error("unknown object '{name}'")]
    UnknownObject {
        /// Rendered object name.
        name: String,
    },

    /// There is no instance with this ID.
    #[error("unknown instance {0}")]
    UnknownInstance(usize),

    /// An operation was applied to a value of the wrong kind.
    #[error("type mismatch: {reason}")]
    TypeMismatch {
        /// What went wrong.
        reason: String,
    },

    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,
}

/// Handle of a simulated instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct InstanceId(usize);

/// A signal assignment waiting for the end of the cycle.
#[derive(Clone, Debug)]
struct PendingUpdate {
    name: ObjectName,
    indices: Vec<usize>,
    value: Value,
}

#[derive(Clone, Debug)]
struct Slot {
    data_type: DataType,
    value: Value,
}

/// One running state machine.
#[derive(Clone, Debug)]
struct Instance {
    machine: MemberStateMachine,
    reset: Vec<HdlStmt>,
    logic: Vec<HdlStmt>,
    slots: HashMap<ObjectName, Slot>,
}

#[derive(Clone, Debug)]
struct Binding {
    from: (usize, ObjectName),
    to: (usize, ObjectName),
}

/// Simulates a set of instances sharing one clock.
pub struct Simulator<'a> {
    interner: &'a Interner,
    instances: Vec<Instance>,
    bindings: Vec<Binding>,
    cycle: u64,
}

impl<'a> Simulator<'a> {
    /// Creates an empty simulator; `interner` renders names in errors.
    pub fn new(interner: &'a Interner) -> Self {
        Self {
            interner,
            instances: Vec::new(),
            bindings: Vec::new(),
            cycle: 0,
        }
    }

    /// Adds an instance of `machine`. Every object starts at its type's default.
    pub fn add_instance(&mut self, machine: &MemberStateMachine) -> InstanceId {
        let body = machine.build_body();
        let slots = machine
            .component()
            .objects()
            .map(|(object, _)| {
                (
                    object.name.clone(),
                    Slot {
                        data_type: object.data_type.clone(),
                        value: object.data_type.default_value(),
                    },
                )
            })
            .collect();
        self.instances.push(Instance {
            machine: machine.clone(),
            reset: body.reset,
            logic: body.logic,
            slots,
        });
        InstanceId(self.instances.len() - 1)
    }

    /// Number of clock cycles since the last reset.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    fn instance(&self, id: InstanceId) -> Result<&Instance, SimError> {
        self.instances.get(id.0).ok_or(SimError::UnknownInstance(id.0))
    }

    fn unknown(&self, name: &ObjectName) -> SimError {
        SimError::UnknownObject {
            name: name.render(self.interner),
        }
    }

    /// Copies `from` of one instance into `to` of another after every cycle.
    pub fn bind(
        &mut self,
        from: (InstanceId, ObjectName),
        to: (InstanceId, ObjectName),
    ) -> Result<(), SimError> {
        for (id, name) in [&from, &to] {
            if !self.instance(*id)?.slots.contains_key(name) {
                return Err(self.unknown(name));
            }
        }
        self.bindings.push(Binding {
            from: (from.0 .0, from.1),
            to: (to.0 .0, to.1),
        });
        Ok(())
    }

    /// Wires channel `index` of `caller` to the instance `callee`: started and
    /// parameters flow to the callee, finished and the return value flow back.
    pub fn bind_invocation(
        &mut self,
        caller: InstanceId,
        callee: InstanceId,
        index: u32,
    ) -> Result<(), SimError> {
        let caller_name = self.instance(caller)?.machine.name();
        let callee_machine = &self.instance(callee)?.machine;
        let target = callee_machine.name();
        let parameters: Vec<_> = callee_machine
            .parameters()
            .iter()
            .map(|p| (p.name, p.signal.clone()))
            .collect();
        let started = callee_machine.started().clone();
        let finished = callee_machine.finished().clone();
        let return_signal = callee_machine.return_signal().cloned();

        self.bind(
            (caller, ObjectName::channel_started(caller_name, target, index)),
            (callee, started),
        )?;
        self.bind(
            (callee, finished),
            (caller, ObjectName::channel_finished(caller_name, target, index)),
        )?;
        for (parameter, signal) in parameters {
            let channel = ObjectName::channel_parameter(caller_name, target, parameter, index);
            if self.instance(caller)?.slots.contains_key(&channel) {
                self.bind((caller, channel), (callee, signal))?;
            }
        }
        if let Some(return_signal) = return_signal {
            let channel = ObjectName::channel_return(caller_name, target, index);
            if self.instance(caller)?.slots.contains_key(&channel) {
                self.bind((callee, return_signal), (caller, channel))?;
            }
        }
        Ok(())
    }

    /// Current value of an object.
    pub fn get(&self, id: InstanceId, name: &ObjectName) -> Result<&Value, SimError> {
        self.instance(id)?
            .slots
            .get(name)
            .map(|slot| &slot.value)
            .ok_or_else(|| self.unknown(name))
    }

    /// Forces an object to `value`, e.g. to drive an unbound input.
    pub fn set(&mut self, id: InstanceId, name: &ObjectName, value: Value) -> Result<(), SimError> {
        let interner = self.interner;
        let instance = self
            .instances
            .get_mut(id.0)
            .ok_or(SimError::UnknownInstance(id.0))?;
        let slot = instance
            .slots
            .get_mut(name)
            .ok_or_else(|| Instance::unknown(name, interner))?;
        slot.value = wrap(value, &slot.data_type)?;
        Ok(())
    }

    /// Current state index of an instance.
    pub fn state_of(&self, id: InstanceId) -> Result<usize, SimError> {
        let instance = self.instance(id)?;
        let value = self.get(id, instance.machine.state_variable())?;
        value
            .as_int()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| SimError::TypeMismatch {
                reason: format!("state variable holds {value:?}"),
            })
    }

    /// Runs every instance's reset statements and restarts the cycle count.
    pub fn reset(&mut self) -> Result<(), SimError> {
        let interner = self.interner;
        for instance in &mut self.instances {
            let mut pending = Vec::new();
            let reset = std::mem::take(&mut instance.reset);
            let result = instance.exec_block(&reset, &mut pending, interner);
            instance.reset = reset;
            result?;
            instance.commit(pending, interner)?;
        }
        self.propagate()?;
        self.cycle = 0;
        Ok(())
    }

    /// Advances one clock cycle.
    pub fn step(&mut self) -> Result<(), SimError> {
        let interner = self.interner;
        let mut pending = Vec::with_capacity(self.instances.len());
        for instance in &mut self.instances {
            let mut updates = Vec::new();
            let logic = std::mem::take(&mut instance.logic);
            let result = instance.exec_block(&logic, &mut updates, interner);
            instance.logic = logic;
            result?;
            pending.push(updates);
        }
        for (instance, updates) in self.instances.iter_mut().zip(pending) {
            instance.commit(updates, interner)?;
        }
        self.propagate()?;
        self.cycle += 1;
        Ok(())
    }

    /// Advances `cycles` clock cycles.
    pub fn run(&mut self, cycles: u64) -> Result<(), SimError> {
        for _ in 0..cycles {
            self.step()?;
        }
        Ok(())
    }

    /// Steps until `done` holds, for at most `max_cycles` cycles. Returns the
    /// number of cycles taken, or `None` if `done` never held.
    pub fn run_until(
        &mut self,
        max_cycles: u64,
        mut done: impl FnMut(&Self) -> bool,
    ) -> Result<Option<u64>, SimError> {
        for taken in 0..=max_cycles {
            if done(self) {
                return Ok(Some(taken));
            }
            if taken < max_cycles {
                self.step()?;
            }
        }
        Ok(None)
    }

    fn propagate(&mut self) -> Result<(), SimError> {
        let interner = self.interner;
        for Binding { from, to } in &self.bindings {
            let value = self.instances[from.0]
                .slots
                .get(&from.1)
                .map(|slot| slot.value.clone())
                .ok_or_else(|| Instance::unknown(&from.1, interner))?;
            let slot = self.instances[to.0]
                .slots
                .get_mut(&to.1)
                .ok_or_else(|| Instance::unknown(&to.1, interner))?;
            slot.value = wrap(value, &slot.data_type)?;
        }
        Ok(())
    }
}

impl Instance {
    fn unknown(name: &ObjectName, interner: &Interner) -> SimError {
        SimError::UnknownObject {
            name: name.render(interner),
        }
    }

    fn exec_block(
        &mut self,
        stmts: &[HdlStmt],
        pending: &mut Vec<PendingUpdate>,
        interner: &Interner,
    ) -> Result<(), SimError> {
        for stmt in stmts {
            self.exec(stmt, pending, interner)?;
        }
        Ok(())
    }

    fn exec(
        &mut self,
        stmt: &HdlStmt,
        pending: &mut Vec<PendingUpdate>,
        interner: &Interner,
    ) -> Result<(), SimError> {
        match stmt {
            HdlStmt::Assign {
                target,
                value,
                kind,
            } => {
                let value = self.eval(value, interner)?;
                let (name, indices) = self.place(target, interner)?;
                let data_type = self.element_type(&name, &indices, interner)?;
                let value = wrap(value, &data_type)?;
                match kind {
                    AssignKind::Variable => self.write(&name, &indices, value, interner),
                    AssignKind::Signal => {
                        pending.push(PendingUpdate {
                            name,
                            indices,
                            value,
                        });
                        Ok(())
                    }
                }
            }
            HdlStmt::If {
                condition,
                then_body,
                else_body,
            } => {
                let taken = self.eval(condition, interner)?;
                let taken = taken.as_bool().ok_or_else(|| SimError::TypeMismatch {
                    reason: format!("if condition evaluated to {taken:?}"),
                })?;
                if taken {
                    self.exec_block(then_body, pending, interner)
                } else {
                    self.exec_block(else_body, pending, interner)
                }
            }
            HdlStmt::Case { subject, arms } => {
                let subject = self.eval(subject, interner)?;
                for arm in arms {
                    let selected = match &arm.choice {
                        Choice::Others => true,
                        Choice::Match(choice) => self.matches(choice, &subject, interner)?,
                    };
                    if selected {
                        return self.exec_block(&arm.body, pending, interner);
                    }
                }
                Ok(())
            }
            HdlStmt::Comment(_) => Ok(()),
        }
    }

    fn commit(&mut self, pending: Vec<PendingUpdate>, interner: &Interner) -> Result<(), SimError> {
        for update in pending {
            self.write(&update.name, &update.indices, update.value, interner)?;
        }
        Ok(())
    }

    fn matches(&self, choice: &HdlExpr, subject: &Value, interner: &Interner) -> Result<bool, SimError> {
        if let HdlExpr::Binary {
            op: HdlBinaryOp::Alternative,
            lhs,
            rhs,
        } = choice
        {
            return Ok(self.matches(lhs, subject, interner)? || self.matches(rhs, subject, interner)?);
        }
        Ok(&self.eval(choice, interner)? == subject)
    }

    /// The object an assignment target writes and the element path into it.
    fn place(&self, target: &HdlExpr, interner: &Interner) -> Result<(ObjectName, Vec<usize>), SimError> {
        match target {
            HdlExpr::Ref(name) => Ok((name.clone(), Vec::new())),
            HdlExpr::Index { array, index } => {
                let (name, mut indices) = self.place(array, interner)?;
                indices.push(self.eval_index(index, interner)?);
                Ok((name, indices))
            }
            other => Err(SimError::TypeMismatch {
                reason: format!("cannot assign to {other:?}"),
            }),
        }
    }

    fn element_type(
        &self,
        name: &ObjectName,
        indices: &[usize],
        interner: &Interner,
    ) -> Result<DataType, SimError> {
        let mut data_type = &self
            .slots
            .get(name)
            .ok_or_else(|| Self::unknown(name, interner))?
            .data_type;
        for _ in indices {
            match data_type {
                DataType::Array { element, .. } => data_type = element,
                other => {
                    return Err(SimError::TypeMismatch {
                        reason: format!("indexing into {other:?}"),
                    })
                }
            }
        }
        Ok(data_type.clone())
    }

    fn write(
        &mut self,
        name: &ObjectName,
        indices: &[usize],
        value: Value,
        interner: &Interner,
    ) -> Result<(), SimError> {
        let slot = self
            .slots
            .get_mut(name)
            .ok_or_else(|| Self::unknown(name, interner))?;
        let mut current = &mut slot.value;
        for &index in indices {
            current = match current {
                Value::Array(elements) => {
                    let len = elements.len();
                    elements.get_mut(index).ok_or_else(|| SimError::TypeMismatch {
                        reason: format!("index {index} out of bounds for {len} elements"),
                    })?
                }
                other => {
                    return Err(SimError::TypeMismatch {
                        reason: format!("indexing into {other:?}"),
                    })
                }
            };
        }
        *current = value;
        Ok(())
    }

    fn eval_index(&self, index: &HdlExpr, interner: &Interner) -> Result<usize, SimError> {
        let value = self.eval(index, interner)?;
        value
            .as_int()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| SimError::TypeMismatch {
                reason: format!("array index evaluated to {value:?}"),
            })
    }

    fn eval(&self, expr: &HdlExpr, interner: &Interner) -> Result<Value, SimError> {
        match expr {
            HdlExpr::Ref(name) => self
                .slots
                .get(name)
                .map(|slot| slot.value.clone())
                .ok_or_else(|| Self::unknown(name, interner)),
            HdlExpr::Value(value) => Ok(value.clone()),
            HdlExpr::State(index) => Ok(Value::Int(*index as i64)),
            HdlExpr::Unary { op, operand } => {
                let operand = self.eval(operand, interner)?;
                match (op, operand) {
                    (HdlUnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (HdlUnaryOp::Not, Value::Int(i)) => Ok(Value::Int(!i)),
                    (HdlUnaryOp::Neg, Value::Int(i)) => Ok(Value::Int(i.wrapping_neg())),
                    (op, operand) => Err(SimError::TypeMismatch {
                        reason: format!("{op:?} applied to {operand:?}"),
                    }),
                }
            }
            HdlExpr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs, interner)?;
                let rhs = self.eval(rhs, interner)?;
                binary(*op, lhs, rhs)
            }
            HdlExpr::Convert { value, to } => wrap(self.eval(value, interner)?, to),
            HdlExpr::Index { array, index } => {
                let array = self.eval(array, interner)?;
                let index = self.eval_index(index, interner)?;
                match array {
                    Value::Array(elements) => {
                        let len = elements.len();
                        elements.into_iter().nth(index).ok_or_else(|| SimError::TypeMismatch {
                            reason: format!("index {index} out of bounds for {len} elements"),
                        })
                    }
                    other => Err(SimError::TypeMismatch {
                        reason: format!("indexing into {other:?}"),
                    }),
                }
            }
            HdlExpr::Aggregate(elements) => elements
                .iter()
                .map(|e| self.eval(e, interner))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }
}

fn binary(op: HdlBinaryOp, lhs: Value, rhs: Value) -> Result<Value, SimError> {
    match (op, &lhs, &rhs) {
        (HdlBinaryOp::Eq, _, _) => Ok(Value::Bool(lhs == rhs)),
        (HdlBinaryOp::Ne, _, _) => Ok(Value::Bool(lhs != rhs)),
        (HdlBinaryOp::And, Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a && *b)),
        (HdlBinaryOp::Or, Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a || *b)),
        (HdlBinaryOp::Xor, Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a != b)),
        (_, Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            Ok(match op {
                HdlBinaryOp::Add => Value::Int(a.wrapping_add(b)),
                HdlBinaryOp::Sub => Value::Int(a.wrapping_sub(b)),
                HdlBinaryOp::Mul => Value::Int(a.wrapping_mul(b)),
                HdlBinaryOp::Div if b == 0 => return Err(SimError::DivisionByZero),
                HdlBinaryOp::Div => Value::Int(a.wrapping_div(b)),
                HdlBinaryOp::Mod if b == 0 => return Err(SimError::DivisionByZero),
                HdlBinaryOp::Mod => Value::Int(a.wrapping_rem(b)),
                HdlBinaryOp::And => Value::Int(a & b),
                HdlBinaryOp::Or => Value::Int(a | b),
                HdlBinaryOp::Xor => Value::Int(a ^ b),
                HdlBinaryOp::ShiftLeft => Value::Int(a.wrapping_shl(b as u32)),
                HdlBinaryOp::ShiftRight => Value::Int(a.wrapping_shr(b as u32)),
                HdlBinaryOp::Lt => Value::Bool(a < b),
                HdlBinaryOp::Le => Value::Bool(a <= b),
                HdlBinaryOp::Gt => Value::Bool(a > b),
                HdlBinaryOp::Ge => Value::Bool(a >= b),
                HdlBinaryOp::Eq | HdlBinaryOp::Ne | HdlBinaryOp::Alternative => {
                    return Err(SimError::TypeMismatch {
                        reason: format!("{op:?} is not a value operator"),
                    })
                }
            })
        }
        _ => Err(SimError::TypeMismatch {
            reason: format!("{op:?} applied to {lhs:?} and {rhs:?}"),
        }),
    }
}

/// Fits `value` into `data_type`, wrapping integers around its width or range.
fn wrap(value: Value, data_type: &DataType) -> Result<Value, SimError> {
    match (data_type, value) {
        (DataType::Boolean, Value::Bool(b)) => Ok(Value::Bool(b)),
        (DataType::Boolean, Value::Int(i)) => Ok(Value::Bool(i != 0)),
        (DataType::Signed(width), Value::Int(i)) => Ok(Value::Int(wrap_signed(i, *width))),
        (DataType::Unsigned(width), Value::Int(i)) => Ok(Value::Int(wrap_unsigned(i, *width))),
        (DataType::Signed(_) | DataType::Unsigned(_), Value::Bool(b)) => Ok(Value::Int(i64::from(b))),
        (DataType::Range { low, high }, Value::Int(i)) => {
            let span = high - low + 1;
            Ok(Value::Int(low + (i - low).rem_euclid(span)))
        }
        (DataType::State, Value::Int(i)) => Ok(Value::Int(i)),
        (DataType::Array { element, size }, Value::Array(elements)) => {
            if elements.len() != *size as usize {
                return Err(SimError::TypeMismatch {
                    reason: format!("{} elements assigned to an array of {size}", elements.len()),
                });
            }
            elements
                .into_iter()
                .map(|e| wrap(e, element))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        (data_type, value) => Err(SimError::TypeMismatch {
            reason: format!("{value:?} does not fit {data_type:?}"),
        }),
    }
}

fn wrap_signed(value: i64, width: u32) -> i64 {
    if width == 0 || width >= 64 {
        return value;
    }
    let shift = 64 - width;
    (value << shift) >> shift
}

fn wrap_unsigned(value: i64, width: u32) -> i64 {
    if width == 0 || width >= 64 {
        return value;
    }
    value & ((1i64 << width) - 1)
}
