//! Lowered members running on the simulator: the start/finish handshake,
//! instance pools and the control-flow shapes statement lowering produces.

use hast_common::{Ident, Interner};
use hast_config::{load_config_from_str, ProjectConfig};
use hast_diagnostics::{DiagnosticSink, Severity};
use hast_fsm::hdl::{binary_chain, Choice, HdlBinaryOp, HdlExpr, HdlStmt, Value};
use hast_fsm::{
    transform_design, transform_member, InstanceId, MemberStateMachine, ObjectName, Printer,
    Simulator, TransformError, TransformedMember, FINAL_STATE, START_STATE,
};
use hast_ir::{
    BinaryOp, CaseLabel, DeclKind, Design, DesignFile, Expr, ExprKind, Parameter, Statement,
    SwitchSection, Type, TypeId, WaitMode,
};

const MAX_CYCLES: u64 = 500;

struct Fixture {
    design: Design,
    interner: Interner,
    void: TypeId,
    boolean: TypeId,
    int: TypeId,
}

impl Fixture {
    fn new() -> Self {
        let mut design = Design::new();
        let void = design.types.intern(Type::Void);
        let boolean = design.types.intern(Type::Bool);
        let int = design.types.intern(Type::Int {
            width: 32,
            signed: true,
        });
        Self {
            design,
            interner: Interner::new(),
            void,
            boolean,
            int,
        }
    }

    fn name(&self, s: &str) -> Ident {
        self.interner.get_or_intern(s)
    }

    fn int(&self, value: i64) -> Expr {
        Expr::int(value, self.int)
    }

    fn var(&self, name: &str) -> Expr {
        Expr::variable(self.name(name), self.int)
    }

    fn op(&self, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        let ty = match op {
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge
            | BinaryOp::LogicAnd
            | BinaryOp::LogicOr => self.boolean,
            _ => self.int,
        };
        Expr::binary(op, lhs, rhs, ty)
    }

    fn set(&self, name: &str, value: Expr) -> Statement {
        Statement::Expr(Expr::assign(self.var(name), value))
    }

    fn local(&self, name: &str, ty: TypeId, init: Expr) -> Statement {
        Statement::VarDecl {
            name: self.name(name),
            ty,
            init: Some(init),
            kind: DeclKind::User,
        }
    }

    fn start(&self, target: Ident, args: Vec<Expr>, degree: u32) -> Statement {
        Statement::Expr(Expr::new(
            ExprKind::StartInvocation {
                member: target,
                args,
                degree,
            },
            self.void,
        ))
    }

    fn wait(&self, target: Ident, degree: u32, mode: WaitMode, ty: TypeId) -> Expr {
        Expr::new(
            ExprKind::AwaitInvocations {
                member: target,
                degree,
                mode,
            },
            ty,
        )
    }

    fn member(
        &mut self,
        name: &str,
        params: &[(&str, TypeId)],
        returns: TypeId,
        body: Vec<Statement>,
    ) -> Ident {
        let ident = self.name(name);
        let params = params
            .iter()
            .map(|&(param, ty)| Parameter {
                name: self.name(param),
                ty,
            })
            .collect();
        self.design
            .add_method(ident, params, returns, Statement::Block(body));
        ident
    }

    fn transform(
        &self,
        name: Ident,
        config: &ProjectConfig,
    ) -> Result<TransformedMember, TransformError> {
        let method = self.design.method_by_name(name).expect("member exists");
        transform_member(method, &self.design, config, &self.interner)
    }
}

/// Trial division from `divisor` upwards:
///
/// ```text
/// while (divisor * divisor <= number) {
///     if (number % divisor == 0) return false;
///     divisor = divisor + 1;
/// }
/// return true;
/// ```
fn add_is_prime(f: &mut Fixture) -> Ident {
    let body = vec![
        Statement::While {
            condition: f.op(
                BinaryOp::Le,
                f.op(BinaryOp::Mul, f.var("divisor"), f.var("divisor")),
                f.var("number"),
            ),
            body: Box::new(Statement::Block(vec![
                Statement::If {
                    condition: f.op(
                        BinaryOp::Eq,
                        f.op(BinaryOp::Mod, f.var("number"), f.var("divisor")),
                        f.int(0),
                    ),
                    then_body: Box::new(Statement::Return(Some(Expr::bool(false, f.boolean)))),
                    else_body: None,
                },
                f.set("divisor", f.op(BinaryOp::Add, f.var("divisor"), f.int(1))),
            ])),
        },
        Statement::Return(Some(Expr::bool(true, f.boolean))),
    ];
    let (int, boolean) = (f.int, f.boolean);
    f.member(
        "Primes::IsPrime",
        &[("number", int), ("divisor", int)],
        boolean,
        body,
    )
}

fn pool_config(target: &str, degree: u32) -> ProjectConfig {
    load_config_from_str(&format!(
        "[project]\nname = \"pool\"\n\n[members.\"{target}\"]\nmax_degree_of_parallelism = {degree}\n"
    ))
    .unwrap()
}

/// Starts `machine` with `args`, waits for `Finished`, then releases it and
/// checks it went back to its start state. Returns the result, if any.
fn invoke(
    sim: &mut Simulator<'_>,
    id: InstanceId,
    machine: &MemberStateMachine,
    args: &[Value],
) -> Option<Value> {
    for (param, arg) in machine.parameters().iter().zip(args) {
        sim.set(id, &param.signal, arg.clone()).unwrap();
    }
    sim.set(id, machine.started(), Value::Bool(true)).unwrap();
    let finished = machine.finished().clone();
    let cycles = sim
        .run_until(MAX_CYCLES, |s| {
            matches!(s.get(id, &finished), Ok(Value::Bool(true)))
        })
        .unwrap();
    assert!(cycles.is_some(), "member never finished");

    let result = machine
        .return_signal()
        .map(|signal| sim.get(id, signal).unwrap().clone());
    sim.set(id, machine.started(), Value::Bool(false)).unwrap();
    sim.run(2).unwrap();
    assert_eq!(sim.state_of(id).unwrap(), START_STATE);
    result
}

fn writes(stmt: &HdlStmt, signal: &ObjectName) -> bool {
    match stmt {
        HdlStmt::Assign {
            target: HdlExpr::Ref(name),
            ..
        } => name == signal,
        HdlStmt::If {
            then_body,
            else_body,
            ..
        } => then_body
            .iter()
            .chain(else_body)
            .any(|s| writes(s, signal)),
        HdlStmt::Case { arms, .. } => arms
            .iter()
            .flat_map(|arm| &arm.body)
            .any(|s| writes(s, signal)),
        _ => false,
    }
}

fn has_condition(machine: &MemberStateMachine, expected: &HdlExpr) -> bool {
    machine.states().iter().any(|state| {
        state
            .body
            .iter()
            .any(|stmt| matches!(stmt, HdlStmt::If { condition, .. } if condition == expected))
    })
}

fn idle_chain(caller: Ident, target: Ident, count: u32, op: HdlBinaryOp) -> HdlExpr {
    let terms = (0..count)
        .map(|i| {
            HdlExpr::equals(
                HdlExpr::Ref(ObjectName::channel_started(caller, target, i)),
                HdlExpr::Ref(ObjectName::channel_finished(caller, target, i)),
            )
        })
        .collect();
    binary_chain(op, terms).unwrap()
}

#[test]
fn is_prime_lowers_to_six_states() {
    let mut f = Fixture::new();
    let is_prime = add_is_prime(&mut f);
    let member = f
        .transform(is_prime, &ProjectConfig::with_name("primes"))
        .unwrap();
    let machine = &member.machine;
    assert_eq!(machine.state_count(), 6);

    let return_signal = machine.return_signal().unwrap().clone();
    let writers: Vec<usize> = machine
        .states()
        .iter()
        .enumerate()
        .filter(|(_, state)| state.body.iter().any(|s| writes(s, &return_signal)))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(writers, vec![3, 4]);
    for state in writers {
        let body = &machine.states()[state].body;
        let position = body
            .iter()
            .position(|s| writes(s, &return_signal))
            .unwrap();
        assert_eq!(
            body[position + 1],
            machine.state_change(FINAL_STATE),
            "state {state} must jump to the final state right after returning"
        );
    }
}

#[test]
fn is_prime_answers_on_the_simulator() {
    let mut f = Fixture::new();
    let is_prime = add_is_prime(&mut f);
    let member = f
        .transform(is_prime, &ProjectConfig::with_name("primes"))
        .unwrap();

    let mut sim = Simulator::new(&f.interner);
    let id = sim.add_instance(&member.machine);
    sim.reset().unwrap();
    for (number, expected) in [(2, true), (7, true), (9, false), (13, true), (15, false)] {
        let result = invoke(
            &mut sim,
            id,
            &member.machine,
            &[Value::Int(number), Value::Int(2)],
        );
        assert_eq!(result, Some(Value::Bool(expected)), "IsPrime({number})");
    }
}

#[test]
fn design_survives_the_json_interchange_form() {
    let mut f = Fixture::new();
    add_is_prime(&mut f);
    let file = DesignFile::capture(f.design, &f.interner);
    let json = serde_json::to_string(&file).unwrap();
    let (design, interner) = serde_json::from_str::<DesignFile>(&json)
        .unwrap()
        .restore()
        .unwrap();

    let sink = DiagnosticSink::new();
    let result = transform_design(
        &design,
        &ProjectConfig::with_name("primes"),
        &interner,
        &sink,
    );
    assert!(!sink.has_errors());
    let is_prime = interner.get("Primes::IsPrime").unwrap();
    let machine = &result.member(is_prime).unwrap().machine;
    assert_eq!(machine.state_count(), 6);

    let listing = Printer::new(&interner).print_machine(machine);
    assert!(listing.contains("when _State_5 =>"));
    assert!(listing.contains("\\Primes::IsPrime.return\\"));
}

#[test]
fn caller_and_callee_complete_the_handshake() {
    let mut f = Fixture::new();
    let is_prime = add_is_prime(&mut f);
    let call = Expr::call(is_prime, vec![f.var("number"), f.int(2)], f.boolean);
    let (int, boolean) = (f.int, f.boolean);
    let check = f.member(
        "Primes::Check",
        &[("number", int)],
        boolean,
        vec![Statement::Return(Some(call))],
    );

    let config = ProjectConfig::with_name("primes");
    let callee = f.transform(is_prime, &config).unwrap();
    let caller = f.transform(check, &config).unwrap();
    assert_eq!(
        caller
            .machine
            .component()
            .other_member_max_invocation_instance_counts()
            .get(&is_prime),
        Some(&1)
    );

    let mut sim = Simulator::new(&f.interner);
    let c = sim.add_instance(&caller.machine);
    let p = sim.add_instance(&callee.machine);
    sim.bind_invocation(c, p, 0).unwrap();
    sim.reset().unwrap();

    for (number, expected) in [(9, false), (11, true), (21, false)] {
        let result = invoke(&mut sim, c, &caller.machine, &[Value::Int(number)]);
        assert_eq!(result, Some(Value::Bool(expected)), "Check({number})");
        sim.run(2).unwrap();
        assert_eq!(sim.state_of(p).unwrap(), START_STATE);
    }
}

#[test]
fn back_to_back_calls_restart_the_instance() {
    let mut f = Fixture::new();
    let is_prime = add_is_prime(&mut f);
    let first = Expr::call(is_prime, vec![f.var("a"), f.int(2)], f.boolean);
    let second = Expr::call(is_prime, vec![f.var("b"), f.int(2)], f.boolean);
    let (int, boolean) = (f.int, f.boolean);
    let both_result = f.op(
        BinaryOp::LogicAnd,
        Expr::variable(f.name("p"), boolean),
        Expr::variable(f.name("q"), boolean),
    );
    let body = vec![
        f.local("p", boolean, first),
        f.local("q", boolean, second),
        Statement::Return(Some(both_result)),
    ];
    let both = f.member("Primes::Both", &[("a", int), ("b", int)], boolean, body);

    let config = ProjectConfig::with_name("primes");
    let callee = f.transform(is_prime, &config).unwrap();
    let caller = f.transform(both, &config).unwrap();
    let restarts = caller
        .machine
        .states()
        .iter()
        .filter(|state| {
            matches!(state.body.first(), Some(HdlStmt::Comment(c)) if c.starts_with("Restarting"))
        })
        .count();
    assert_eq!(restarts, 1);

    let mut sim = Simulator::new(&f.interner);
    let c = sim.add_instance(&caller.machine);
    let p = sim.add_instance(&callee.machine);
    sim.bind_invocation(c, p, 0).unwrap();
    sim.reset().unwrap();
    for (a, b, expected) in [(7, 11, true), (7, 9, false), (4, 13, false)] {
        let result = invoke(&mut sim, c, &caller.machine, &[Value::Int(a), Value::Int(b)]);
        assert_eq!(result, Some(Value::Bool(expected)), "Both({a}, {b})");
    }
}

#[test]
fn waiting_on_instances_never_started_succeeds_at_once() {
    let mut f = Fixture::new();
    let int = f.int;
    let void = f.void;
    let worker = f.member("Pool::Worker", &[("x", int)], void, vec![]);
    let all = Statement::Expr(f.wait(worker, 4, WaitMode::All, void));
    let any = Statement::Expr(f.wait(worker, 4, WaitMode::Any, void));
    let wait_all = f.member("Pool::WaitAll", &[], void, vec![all]);
    let wait_any = f.member("Pool::WaitAny", &[], void, vec![any]);

    let config = pool_config("Pool::Worker", 4);
    let all = f.transform(wait_all, &config).unwrap();
    let any = f.transform(wait_any, &config).unwrap();
    assert!(has_condition(
        &all.machine,
        &idle_chain(wait_all, worker, 4, HdlBinaryOp::And)
    ));
    assert!(has_condition(
        &any.machine,
        &idle_chain(wait_any, worker, 4, HdlBinaryOp::Or)
    ));

    let mut sim = Simulator::new(&f.interner);
    let id = sim.add_instance(&all.machine);
    sim.reset().unwrap();
    sim.set(id, all.machine.started(), Value::Bool(true)).unwrap();
    let finished = all.machine.finished().clone();
    let cycles = sim
        .run_until(10, |s| matches!(s.get(id, &finished), Ok(Value::Bool(true))))
        .unwrap();
    assert!(cycles.is_some());
}

#[test]
fn round_robin_starts_hit_distinct_instances() {
    let mut f = Fixture::new();
    let int = f.int;
    let void = f.void;
    let worker = f.member("Pool::Worker", &[("x", int)], void, vec![]);
    let body = (1..=3)
        .map(|i| f.start(worker, vec![f.op(BinaryOp::Add, f.var("x"), f.int(i))], 4))
        .collect();
    let fan = f.member("Pool::Fan", &[("x", int)], void, body);

    let member = f.transform(fan, &pool_config("Pool::Worker", 4)).unwrap();
    let machine = &member.machine;
    let cases: Vec<&HdlStmt> = machine.states()[2]
        .body
        .iter()
        .filter(|s| matches!(s, HdlStmt::Case { .. }))
        .collect();
    assert_eq!(cases.len(), 3);
    for case in cases {
        let HdlStmt::Case { arms, .. } = case else {
            unreachable!()
        };
        assert_eq!(arms.len(), 5);
        assert_eq!(arms.last().map(|a| &a.choice), Some(&Choice::Others));
    }

    let mut sim = Simulator::new(&f.interner);
    let id = sim.add_instance(machine);
    sim.reset().unwrap();
    invoke(&mut sim, id, machine, &[Value::Int(10)]);

    let x = f.name("x");
    for i in 0..4u32 {
        let started = sim
            .get(id, &ObjectName::channel_started(fan, worker, i))
            .unwrap();
        assert_eq!(started, &Value::Bool(i < 3), "instance {i}");
    }
    for i in 0..3u32 {
        let argument = sim
            .get(id, &ObjectName::channel_parameter(fan, worker, x, i))
            .unwrap();
        assert_eq!(argument, &Value::Int(11 + i64::from(i)));
    }
    assert_eq!(
        sim.get(id, &ObjectName::invocation_index(fan, worker)).unwrap(),
        &Value::Int(3)
    );
}

#[test]
fn pooled_wait_releases_every_instance() {
    let mut f = Fixture::new();
    let int = f.int;
    let void = f.void;
    let worker = f.member("Pool::Worker", &[("x", int)], void, vec![]);
    let body = vec![
        f.start(worker, vec![f.int(1)], 4),
        f.start(worker, vec![f.int(2)], 4),
        Statement::Expr(f.wait(worker, 4, WaitMode::All, void)),
    ];
    let twice = f.member("Pool::Twice", &[], void, body);

    let config = pool_config("Pool::Worker", 4);
    let caller = f.transform(twice, &config).unwrap();
    let callee = f.transform(worker, &config).unwrap();
    assert!(has_condition(
        &caller.machine,
        &idle_chain(twice, worker, 4, HdlBinaryOp::And)
    ));

    let mut sim = Simulator::new(&f.interner);
    let c = sim.add_instance(&caller.machine);
    for i in 0..4 {
        let w = sim.add_instance(&callee.machine);
        sim.bind_invocation(c, w, i).unwrap();
    }
    sim.reset().unwrap();
    invoke(&mut sim, c, &caller.machine, &[]);

    let x = f.name("x");
    for (i, expected) in [(0u32, 1), (1, 2)] {
        assert_eq!(
            sim.get(c, &ObjectName::channel_parameter(twice, worker, x, i))
                .unwrap(),
            &Value::Int(expected)
        );
    }
    for i in 0..4 {
        assert_eq!(
            sim.get(c, &ObjectName::channel_started(twice, worker, i))
                .unwrap(),
            &Value::Bool(false)
        );
    }
    assert_eq!(
        sim.get(c, &ObjectName::invocation_index(twice, worker))
            .unwrap(),
        &Value::Int(0)
    );
}

#[test]
fn parallel_map_collects_every_result() {
    let mut f = Fixture::new();
    let int = f.int;
    let square_body = vec![Statement::Return(Some(f.op(
        BinaryOp::Mul,
        f.var("x"),
        f.var("x"),
    )))];
    let square = f.member("Map::Square", &[("x", int)], int, square_body);

    let results_ty = f.design.types.intern(Type::Array {
        element: int,
        size: 4,
    });
    let element = |i: i64| {
        Expr::new(
            ExprKind::Index {
                array: Box::new(Expr::variable(f.name("r"), results_ty)),
                index: Box::new(f.int(i)),
            },
            int,
        )
    };
    let sum = f.op(
        BinaryOp::Add,
        f.op(BinaryOp::Add, element(0), element(1)),
        f.op(BinaryOp::Add, element(2), element(3)),
    );
    let mut body: Vec<Statement> = (0..4)
        .map(|i| f.start(square, vec![f.op(BinaryOp::Add, f.var("a"), f.int(i))], 4))
        .collect();
    body.push(f.local("r", results_ty, f.wait(square, 4, WaitMode::All, results_ty)));
    body.push(Statement::Return(Some(sum)));
    let map = f.member("Map::SumOfSquares", &[("a", int)], int, body);

    let config = pool_config("Map::Square", 4);
    let caller = f.transform(map, &config).unwrap();
    let callee = f.transform(square, &config).unwrap();

    let mut sim = Simulator::new(&f.interner);
    let c = sim.add_instance(&caller.machine);
    for i in 0..4 {
        let w = sim.add_instance(&callee.machine);
        sim.bind_invocation(c, w, i).unwrap();
    }
    sim.reset().unwrap();
    assert_eq!(
        invoke(&mut sim, c, &caller.machine, &[Value::Int(1)]),
        Some(Value::Int(1 + 4 + 9 + 16))
    );
    assert_eq!(
        invoke(&mut sim, c, &caller.machine, &[Value::Int(3)]),
        Some(Value::Int(9 + 16 + 25 + 36))
    );
}

#[test]
fn exceeding_the_parallelism_bound_is_reported() {
    let mut f = Fixture::new();
    let int = f.int;
    let void = f.void;
    let worker = f.member("Pool::Worker", &[("x", int)], void, vec![]);
    let body = vec![f.start(worker, vec![f.int(1)], 4)];
    let greedy = f.member("Pool::Greedy", &[], void, body);

    let config = ProjectConfig::with_name("pool");
    let err = f.transform(greedy, &config).unwrap_err();
    assert!(matches!(
        err,
        TransformError::ParallelismExceeded {
            requested: 4,
            configured: 1,
            ..
        }
    ));

    let report = || {
        let sink = DiagnosticSink::new();
        let result = transform_design(&f.design, &config, &f.interner, &sink);
        assert!(result.member(greedy).is_none());
        assert!(result.member(worker).is_some());
        sink.diagnostics()
    };
    let first = report();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].severity, Severity::Error);
    assert_eq!(first[0].code.to_string(), "C001");
    assert!(!first[0].help.is_empty());
    assert_eq!(report()[0].message, first[0].message);

    assert!(f.transform(greedy, &pool_config("Pool::Worker", 4)).is_ok());
}

#[test]
fn if_else_branches_rejoin() {
    let mut f = Fixture::new();
    let (int, boolean) = (f.int, f.boolean);
    let body = vec![
        f.local("r", int, f.int(0)),
        Statement::If {
            condition: Expr::variable(f.name("flag"), boolean),
            then_body: Box::new(f.set("r", f.int(10))),
            else_body: Some(Box::new(f.set("r", f.int(20)))),
        },
        Statement::Return(Some(f.op(BinaryOp::Add, f.var("r"), f.int(1)))),
    ];
    let pick = f.member("Branch::Pick", &[("flag", boolean)], int, body);

    let member = f
        .transform(pick, &ProjectConfig::with_name("branch"))
        .unwrap();
    let machine = &member.machine;
    let (true_state, false_state, after) = (3, 4, 5);
    assert_eq!(machine.state_count(), 6);
    assert!(machine.states()[2].body.contains(&HdlStmt::If {
        condition: HdlExpr::Ref(ObjectName::variable(pick, f.name("flag")).with_index(0)),
        then_body: vec![machine.state_change(true_state)],
        else_body: vec![machine.state_change(false_state)],
    }));
    for branch in [true_state, false_state] {
        assert_eq!(
            machine.states()[branch].body.last(),
            Some(&machine.conditional_state_change(after, branch))
        );
    }

    let mut sim = Simulator::new(&f.interner);
    let id = sim.add_instance(machine);
    sim.reset().unwrap();
    assert_eq!(
        invoke(&mut sim, id, machine, &[Value::Bool(true)]),
        Some(Value::Int(11))
    );
    assert_eq!(
        invoke(&mut sim, id, machine, &[Value::Bool(false)]),
        Some(Value::Int(21))
    );
}

#[test]
fn switch_always_ends_with_an_others_arm() {
    for with_default in [false, true] {
        let mut f = Fixture::new();
        let int = f.int;
        let mut sections = vec![
            SwitchSection {
                labels: vec![CaseLabel::Value(f.int(1)), CaseLabel::Value(f.int(2))],
                body: vec![f.set("r", f.int(10)), Statement::Break],
            },
            SwitchSection {
                labels: vec![CaseLabel::Value(f.int(3))],
                body: vec![f.set("r", f.int(30)), Statement::Break],
            },
        ];
        if with_default {
            sections.insert(
                0,
                SwitchSection {
                    labels: vec![CaseLabel::Default],
                    body: vec![f.set("r", f.int(99)), Statement::Break],
                },
            );
        }
        let body = vec![
            f.local("r", int, f.int(0)),
            Statement::Switch {
                subject: f.var("n"),
                sections,
            },
            Statement::Return(Some(f.var("r"))),
        ];
        let classify = f.member("Switch::Classify", &[("n", int)], int, body);

        let member = f
            .transform(classify, &ProjectConfig::with_name("switch"))
            .unwrap();
        let machine = &member.machine;
        let Some(HdlStmt::Case { arms, .. }) = machine.states()[2]
            .body
            .iter()
            .find(|s| matches!(s, HdlStmt::Case { .. }))
        else {
            panic!("no case statement in the first state");
        };
        assert_eq!(arms.len(), 3);
        assert_eq!(arms[2].choice, Choice::Others);

        let mut sim = Simulator::new(&f.interner);
        let id = sim.add_instance(machine);
        sim.reset().unwrap();
        let otherwise = if with_default { 99 } else { 0 };
        for (n, expected) in [(1, 10), (2, 10), (3, 30), (7, otherwise)] {
            assert_eq!(
                invoke(&mut sim, id, machine, &[Value::Int(n)]),
                Some(Value::Int(expected)),
                "Classify({n}), default: {with_default}"
            );
        }
    }
}

#[test]
fn loop_break_leaves_the_loop() {
    let mut f = Fixture::new();
    let (int, boolean) = (f.int, f.boolean);
    let body = vec![
        f.local("total", int, f.int(0)),
        f.local("i", int, f.int(0)),
        Statement::While {
            condition: Expr::bool(true, boolean),
            body: Box::new(Statement::Block(vec![
                Statement::If {
                    condition: f.op(BinaryOp::Eq, f.var("i"), f.var("limit")),
                    then_body: Box::new(Statement::Break),
                    else_body: None,
                },
                f.set("total", f.op(BinaryOp::Add, f.var("total"), f.var("i"))),
                f.set("i", f.op(BinaryOp::Add, f.var("i"), f.int(1))),
            ])),
        },
        Statement::Return(Some(f.var("total"))),
    ];
    let sum = f.member("Loop::Sum", &[("limit", int)], int, body);

    let member = f.transform(sum, &ProjectConfig::with_name("loop")).unwrap();
    let mut sim = Simulator::new(&f.interner);
    let id = sim.add_instance(&member.machine);
    sim.reset().unwrap();
    for (limit, expected) in [(0, 0), (1, 0), (5, 10)] {
        assert_eq!(
            invoke(&mut sim, id, &member.machine, &[Value::Int(limit)]),
            Some(Value::Int(expected)),
            "Sum({limit})"
        );
    }
}

#[test]
fn break_in_a_switch_stays_in_the_enclosing_loop() {
    let mut f = Fixture::new();
    let int = f.int;
    let body = vec![
        f.local("hits", int, f.int(0)),
        f.local("i", int, f.int(0)),
        Statement::While {
            condition: f.op(BinaryOp::Lt, f.var("i"), f.var("limit")),
            body: Box::new(Statement::Block(vec![
                Statement::Switch {
                    subject: f.var("i"),
                    sections: vec![SwitchSection {
                        labels: vec![CaseLabel::Value(f.int(1))],
                        body: vec![
                            f.set("hits", f.op(BinaryOp::Add, f.var("hits"), f.int(1))),
                            Statement::Break,
                        ],
                    }],
                },
                f.set("i", f.op(BinaryOp::Add, f.var("i"), f.int(1))),
            ])),
        },
        Statement::Return(Some(f.op(BinaryOp::Add, f.var("i"), f.var("hits")))),
    ];
    let count = f.member("Loop::CountOnes", &[("limit", int)], int, body);

    let member = f.transform(count, &ProjectConfig::with_name("loop")).unwrap();
    let mut sim = Simulator::new(&f.interner);
    let id = sim.add_instance(&member.machine);
    sim.reset().unwrap();
    // Leaving the loop at the break would answer 2 for every limit above 1.
    for (limit, expected) in [(0, 0), (1, 1), (2, 3), (5, 6)] {
        assert_eq!(
            invoke(&mut sim, id, &member.machine, &[Value::Int(limit)]),
            Some(Value::Int(expected)),
            "CountOnes({limit})"
        );
    }
}

#[test]
fn goto_skips_to_its_label() {
    let mut f = Fixture::new();
    let int = f.int;
    let done = f.name("done");
    let body = vec![
        f.local("r", int, f.var("x")),
        Statement::Goto(done),
        f.set("r", f.op(BinaryOp::Add, f.var("r"), f.int(100))),
        Statement::Label(done),
        Statement::Return(Some(f.var("r"))),
    ];
    let skip = f.member("Jump::Skip", &[("x", int)], int, body);

    let member = f.transform(skip, &ProjectConfig::with_name("jump")).unwrap();
    let mut sim = Simulator::new(&f.interner);
    let id = sim.add_instance(&member.machine);
    sim.reset().unwrap();
    assert_eq!(
        invoke(&mut sim, id, &member.machine, &[Value::Int(5)]),
        Some(Value::Int(5))
    );
}
