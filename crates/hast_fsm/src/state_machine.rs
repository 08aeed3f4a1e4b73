//! Member state machines: one per compiled member.
//!
//! A [`MemberStateMachine`] is an [`ArchitectureComponent`] with an ordered,
//! append-only list of states and a `Started`/`Finished` handshake:
//!
//! - **Start (0)**: when `Started` is high, latch the parameters and go to state 2.
//! - **Final (1)**: while `Started` is high, hold `Finished` high. Once the
//!   caller pulls `Started` low, drop `Finished` and return to Start.
//! - **Body states (2..)**: added by statement lowering.

use crate::component::ArchitectureComponent;
use crate::hdl::{
    AssignKind, Body, CaseArm, Choice, DataObject, DataType, Declaration, DeclarationSection,
    Declarations, HdlExpr, HdlStmt, Value,
};
use crate::naming::ObjectName;
use hast_common::{HastResult, Ident, InternalError};

/// Index of the start state.
pub const START_STATE: usize = 0;
/// Index of the final state.
pub const FINAL_STATE: usize = 1;
/// Index of the first state statement lowering creates.
pub const FIRST_BODY_STATE: usize = 2;

/// One state of a member state machine.
#[derive(Clone, PartialEq, Debug)]
pub struct State {
    /// Operations executed while the machine is in this state.
    pub body: Vec<HdlStmt>,
    /// Approximate cost of the body in clock cycles. Reported only.
    pub required_clock_cycles: f64,
}

/// One step from a block into a block nested in it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockStep {
    /// The `then` block of the `if` at this position.
    Then(usize),
    /// The `else` block of the `if` at this position.
    Else(usize),
    /// Arm `.1` of the `case` at position `.0`.
    Arm(usize, usize),
}

/// A formal parameter of the member.
#[derive(Clone, PartialEq, Debug)]
pub struct MachineParameter {
    /// Parameter name in the source.
    pub name: Ident,
    /// Externally driven signal the caller writes.
    pub signal: ObjectName,
    /// Local variable latched from the signal in the start state.
    pub variable: ObjectName,
}

/// State machine generated for one member.
#[derive(Clone, Debug)]
pub struct MemberStateMachine {
    component: ArchitectureComponent,
    states: Vec<State>,
    state_variable: ObjectName,
    started: ObjectName,
    finished: ObjectName,
    return_signal: Option<ObjectName>,
    parameters: Vec<MachineParameter>,
}

impl MemberStateMachine {
    /// Creates a machine holding only the start and final states.
    pub fn new(name: Ident) -> HastResult<Self> {
        let mut component = ArchitectureComponent::new(name);
        let state_variable = ObjectName::state_variable(name);
        let started = ObjectName::started(name);
        let finished = ObjectName::finished(name);
        component.add_local_variable(DataObject {
            name: state_variable.clone(),
            data_type: DataType::State,
            initial: Some(Value::Int(START_STATE as i64)),
        })?;
        for signal in [&started, &finished] {
            component.add_internally_driven_signal(DataObject {
                name: signal.clone(),
                data_type: DataType::Boolean,
                initial: Some(Value::Bool(false)),
            })?;
        }

        let mut machine = Self {
            component,
            states: Vec::new(),
            state_variable,
            started,
            finished,
            return_signal: None,
            parameters: Vec::new(),
        };

        let start = HdlStmt::If {
            condition: machine.started_is_high(),
            then_body: vec![machine.state_change(FIRST_BODY_STATE)],
            else_body: Vec::new(),
        };
        machine.add_state(vec![start]);

        let finish = HdlStmt::If {
            condition: machine.started_is_high(),
            then_body: vec![machine.assign_finished(true)],
            else_body: vec![
                machine.assign_finished(false),
                machine.state_change(START_STATE),
            ],
        };
        machine.add_state(vec![finish]);

        Ok(machine)
    }

    fn started_is_high(&self) -> HdlExpr {
        HdlExpr::equals(HdlExpr::Ref(self.started.clone()), HdlExpr::bool(true))
    }

    fn assign_finished(&self, value: bool) -> HdlStmt {
        HdlStmt::Assign {
            target: HdlExpr::Ref(self.finished.clone()),
            value: HdlExpr::bool(value),
            kind: AssignKind::Signal,
        }
    }

    /// The member's name.
    pub fn name(&self) -> Ident {
        self.component.name()
    }

    /// The underlying component.
    pub fn component(&self) -> &ArchitectureComponent {
        &self.component
    }

    /// Mutable access to the underlying component.
    pub fn component_mut(&mut self) -> &mut ArchitectureComponent {
        &mut self.component
    }

    /// The state variable.
    pub fn state_variable(&self) -> &ObjectName {
        &self.state_variable
    }

    /// The `Started` signal.
    pub fn started(&self) -> &ObjectName {
        &self.started
    }

    /// The `Finished` signal.
    pub fn finished(&self) -> &ObjectName {
        &self.finished
    }

    /// The return signal of a non-void member.
    pub fn return_signal(&self) -> Option<&ObjectName> {
        self.return_signal.as_ref()
    }

    /// Formal parameters in declaration order.
    pub fn parameters(&self) -> &[MachineParameter] {
        &self.parameters
    }

    /// All states; index 0 is Start and index 1 is Final.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Number of states.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Appends a state and returns its index.
    pub fn add_state(&mut self, body: Vec<HdlStmt>) -> usize {
        self.states.push(State {
            body,
            required_clock_cycles: 0.0,
        });
        self.states.len() - 1
    }

    /// Adds to the clock-cycle estimate of a state.
    pub fn add_clock_cycles(&mut self, state: usize, cycles: f64) -> HastResult<()> {
        let state = self
            .states
            .get_mut(state)
            .ok_or_else(|| InternalError::new(format!("state {state} does not exist")))?;
        state.required_clock_cycles += cycles;
        Ok(())
    }

    /// `state := to`
    pub fn state_change(&self, to: usize) -> HdlStmt {
        HdlStmt::Assign {
            target: HdlExpr::Ref(self.state_variable.clone()),
            value: HdlExpr::State(to),
            kind: AssignKind::Variable,
        }
    }

    /// `if state = from then state := to`: a transition that does not
    /// override one already taken earlier in the same cycle.
    pub fn conditional_state_change(&self, to: usize, from: usize) -> HdlStmt {
        HdlStmt::If {
            condition: HdlExpr::equals(
                HdlExpr::Ref(self.state_variable.clone()),
                HdlExpr::State(from),
            ),
            then_body: vec![self.state_change(to)],
            else_body: Vec::new(),
        }
    }

    /// Adds a formal parameter: an externally driven signal plus a local
    /// variable the start state latches it into. Returns the variable.
    pub fn add_parameter(&mut self, name: Ident, data_type: DataType) -> HastResult<ObjectName> {
        let signal = ObjectName::parameter(self.name(), name);
        self.component.add_externally_driven_signal(DataObject {
            name: signal.clone(),
            data_type: data_type.clone(),
            initial: None,
        })?;
        let base = ObjectName::variable(self.name(), name);
        let variable = self.component.create_variable_with_next_unused_indexed_name(
            &base,
            data_type.clone(),
            Some(data_type.default_value()),
        );

        let latch = HdlStmt::Assign {
            target: HdlExpr::Ref(variable.clone()),
            value: HdlExpr::Ref(signal.clone()),
            kind: AssignKind::Variable,
        };
        let start_block = self.block_mut(START_STATE, &[BlockStep::Then(0)])?;
        let before_transition = start_block.len().saturating_sub(1);
        start_block.insert(before_transition, latch);

        self.parameters.push(MachineParameter {
            name,
            signal,
            variable: variable.clone(),
        });
        Ok(variable)
    }

    /// Adds the internally driven return signal.
    pub fn set_return_type(&mut self, data_type: DataType) -> HastResult<ObjectName> {
        let name = ObjectName::return_value(self.name());
        self.component.add_internally_driven_signal(DataObject {
            name: name.clone(),
            data_type: data_type.clone(),
            initial: Some(data_type.default_value()),
        })?;
        self.return_signal = Some(name.clone());
        Ok(name)
    }

    /// The statement list addressed by `path` inside `state`.
    pub fn block_mut(&mut self, state: usize, path: &[BlockStep]) -> HastResult<&mut Vec<HdlStmt>> {
        let mut block = &mut self
            .states
            .get_mut(state)
            .ok_or_else(|| InternalError::new(format!("state {state} does not exist")))?
            .body;
        for step in path {
            block = step_into(block, *step)?;
        }
        Ok(block)
    }

    /// The state enumeration, then the component's sections.
    pub fn build_declarations(&self) -> Declarations {
        let states = DeclarationSection {
            comment: "State machine states".to_string(),
            items: vec![Declaration::StateType {
                component: self.name(),
                state_count: self.states.len(),
            }],
        };
        self.component.build_declarations_with(vec![states])
    }

    /// The clocked process: a `case` over the state variable with one arm per state.
    pub fn build_body(&self) -> Body {
        let arms = self
            .states
            .iter()
            .enumerate()
            .map(|(i, state)| CaseArm {
                choice: Choice::Match(HdlExpr::State(i)),
                body: state.body.clone(),
            })
            .collect();
        self.component.build_body(vec![HdlStmt::Case {
            subject: HdlExpr::Ref(self.state_variable.clone()),
            arms,
        }])
    }
}

fn step_into(block: &mut [HdlStmt], step: BlockStep) -> HastResult<&mut Vec<HdlStmt>> {
    let position = match step {
        BlockStep::Then(p) | BlockStep::Else(p) | BlockStep::Arm(p, _) => p,
    };
    match (block.get_mut(position), step) {
        (Some(HdlStmt::If { then_body, .. }), BlockStep::Then(_)) => Ok(then_body),
        (Some(HdlStmt::If { else_body, .. }), BlockStep::Else(_)) => Ok(else_body),
        (Some(HdlStmt::Case { arms, .. }), BlockStep::Arm(_, arm)) => arms
            .get_mut(arm)
            .map(|a| &mut a.body)
            .ok_or_else(|| InternalError::new(format!("case arm {arm} does not exist"))),
        _ => Err(InternalError::new(format!(
            "cursor step {step:?} does not address a nested block"
        ))),
    }
}
