//! Top-level design container.

use crate::arena::Arena;
use crate::expr::{Expr, ExprKind, Literal};
use crate::ids::{GlobalId, MethodId, TypeId};
use crate::method::{Method, Parameter};
use crate::stmt::{CaseLabel, Statement};
use crate::types::TypeDb;
use hast_common::Ident;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// A variable living outside of any member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalVariable {
    /// Full name, e.g. `Primes::Counter`.
    pub name: Ident,
    /// Declared type.
    pub ty: TypeId,
    /// Value after reset; zero when absent.
    pub init: Option<Literal>,
    /// Declared in the shared section of every component that uses it.
    pub shared: bool,
}

/// All members and globals of a program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Design {
    /// Members, keyed by [`MethodId`].
    pub methods: Arena<MethodId, Method>,
    /// Design-level globals.
    pub globals: Arena<GlobalId, GlobalVariable>,
    /// Types of every expression, parameter and variable.
    pub types: TypeDb,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a method and returns its ID.
    pub fn add_method(
        &mut self,
        name: Ident,
        params: Vec<Parameter>,
        return_ty: TypeId,
        body: Statement,
    ) -> MethodId {
        let id = MethodId::from_raw(self.methods.len() as u32);
        self.methods.alloc(Method {
            id,
            name,
            params,
            return_ty,
            body,
        })
    }

    /// Adds a global variable and returns its ID.
    pub fn add_global(&mut self, global: GlobalVariable) -> GlobalId {
        self.globals.alloc(global)
    }

    /// Finds a member by full name.
    pub fn method_by_name(&self, name: Ident) -> Option<&Method> {
        self.methods.values().find(|m| m.name == name)
    }

    /// Finds a global by full name.
    pub fn global_by_name(&self, name: Ident) -> Option<&GlobalVariable> {
        self.globals.values().find(|g| g.name == name)
    }

    /// Names of the members `method` invokes, directly or in a parallel loop.
    pub fn invoked_members(&self, method: &Method) -> BTreeSet<Ident> {
        let mut collector = IdentCollector::new(true);
        collector.stmt(&method.body);
        collector.out
    }

    /// Every name the design refers to: member, parameter, local, label,
    /// global and invocation target names.
    pub fn referenced_idents(&self) -> BTreeSet<Ident> {
        let mut collector = IdentCollector::new(false);
        for method in self.methods.values() {
            collector.name(method.name);
            for param in &method.params {
                collector.name(param.name);
            }
            collector.stmt(&method.body);
        }
        for global in self.globals.values() {
            collector.name(global.name);
        }
        collector.out
    }

    /// Members reachable from `entry_points` by invocation, entry points
    /// included, in breadth-first order. Unknown names are skipped.
    pub fn reachable_from(&self, entry_points: &[Ident]) -> Vec<MethodId> {
        let mut seen = BTreeSet::new();
        let mut order = Vec::new();
        let mut queue: VecDeque<Ident> = entry_points.iter().copied().collect();
        while let Some(name) = queue.pop_front() {
            let Some(method) = self.method_by_name(name) else {
                continue;
            };
            if !seen.insert(method.id) {
                continue;
            }
            order.push(method.id);
            queue.extend(self.invoked_members(method));
        }
        order
    }
}

/// Walks statement trees collecting [`Ident`]s: only invoked member names,
/// or every name the tree refers to.
struct IdentCollector {
    invoked_only: bool,
    out: BTreeSet<Ident>,
}

impl IdentCollector {
    fn new(invoked_only: bool) -> Self {
        Self {
            invoked_only,
            out: BTreeSet::new(),
        }
    }

    fn name(&mut self, ident: Ident) {
        if !self.invoked_only {
            self.out.insert(ident);
        }
    }

    fn stmt(&mut self, stmt: &Statement) {
        match stmt {
            Statement::VarDecl { name, init, .. } => {
                self.name(*name);
                if let Some(init) = init {
                    self.expr(init);
                }
            }
            Statement::Expr(e) => self.expr(e),
            Statement::Return(value) => {
                if let Some(value) = value {
                    self.expr(value);
                }
            }
            Statement::If {
                condition,
                then_body,
                else_body,
            } => {
                self.expr(condition);
                self.stmt(then_body);
                if let Some(else_body) = else_body {
                    self.stmt(else_body);
                }
            }
            Statement::While { condition, body } => {
                self.expr(condition);
                self.stmt(body);
            }
            Statement::Switch { subject, sections } => {
                self.expr(subject);
                for section in sections {
                    for label in &section.labels {
                        if let CaseLabel::Value(v) = label {
                            self.expr(v);
                        }
                    }
                    for s in &section.body {
                        self.stmt(s);
                    }
                }
            }
            Statement::Block(stmts) => {
                for s in stmts {
                    self.stmt(s);
                }
            }
            Statement::Goto(label) | Statement::Label(label) => self.name(*label),
            Statement::Break
            | Statement::Throw { .. }
            | Statement::Empty
            | Statement::Unsupported { .. } => {}
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Call { member, args } | ExprKind::StartInvocation { member, args, .. } => {
                self.out.insert(*member);
                for arg in args {
                    self.expr(arg);
                }
            }
            ExprKind::AwaitInvocations { member, .. } => {
                self.out.insert(*member);
            }
            ExprKind::Variable(name) => self.name(*name),
            ExprKind::Unary { operand, .. } | ExprKind::Cast { operand } => self.expr(operand),
            ExprKind::Binary { lhs, rhs, .. } => {
                self.expr(lhs);
                self.expr(rhs);
            }
            ExprKind::Index { array, index } => {
                self.expr(array);
                self.expr(index);
            }
            ExprKind::Assign { target, value } => {
                self.expr(target);
                self.expr(value);
            }
            ExprKind::Literal(_) | ExprKind::Unsupported { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::WaitMode;
    use crate::types::Type;

    fn id(raw: u32) -> Ident {
        Ident::from_raw(raw)
    }

    // 0 calls 1 synchronously and 2 in a parallel loop; 2 calls 3; 4 is unreachable.
    fn make_design() -> Design {
        let mut design = Design::new();
        let void = design.types.intern(Type::Void);
        let int = design.types.intern(Type::Int {
            width: 32,
            signed: true,
        });
        let boolean = design.types.intern(Type::Bool);
        design.add_method(
            id(0),
            vec![],
            void,
            Statement::Block(vec![
                Statement::Expr(Expr::call(id(1), vec![], void)),
                Statement::While {
                    condition: Expr::bool(true, boolean),
                    body: Box::new(Statement::Expr(Expr::new(
                        ExprKind::StartInvocation {
                            member: id(2),
                            args: vec![Expr::int(1, int)],
                            degree: 2,
                        },
                        void,
                    ))),
                },
                Statement::Expr(Expr::new(
                    ExprKind::AwaitInvocations {
                        member: id(2),
                        degree: 2,
                        mode: WaitMode::All,
                    },
                    void,
                )),
            ]),
        );
        design.add_method(id(1), vec![], void, Statement::Block(vec![]));
        design.add_method(
            id(2),
            vec![Parameter { name: id(10), ty: int }],
            int,
            Statement::Return(Some(Expr::call(id(3), vec![], int))),
        );
        design.add_method(id(3), vec![], int, Statement::Return(Some(Expr::int(0, int))));
        design.add_method(id(4), vec![], void, Statement::Empty);
        design
    }

    #[test]
    fn lookup_by_name() {
        let design = make_design();
        assert_eq!(design.method_by_name(id(2)).unwrap().params.len(), 1);
        assert!(design.method_by_name(id(99)).is_none());
    }

    #[test]
    fn invoked_members_include_parallel_loops() {
        let design = make_design();
        let root = design.method_by_name(id(0)).unwrap();
        let invoked: Vec<_> = design.invoked_members(root).into_iter().collect();
        assert_eq!(invoked, vec![id(1), id(2)]);
    }

    #[test]
    fn referenced_idents_cover_every_name() {
        let mut design = make_design();
        let int = design.types.intern(Type::Int {
            width: 32,
            signed: true,
        });
        design.add_global(GlobalVariable {
            name: id(20),
            ty: int,
            init: None,
            shared: false,
        });
        design.add_method(
            id(5),
            vec![],
            int,
            Statement::Block(vec![
                Statement::VarDecl {
                    name: id(30),
                    ty: int,
                    init: Some(Expr::variable(id(20), int)),
                    kind: crate::stmt::DeclKind::User,
                },
                Statement::Goto(id(31)),
                Statement::Label(id(31)),
                Statement::Return(Some(Expr::variable(id(30), int))),
            ]),
        );
        let names: Vec<u32> = design
            .referenced_idents()
            .into_iter()
            .map(|i| i.as_raw())
            .collect();
        assert_eq!(names, vec![0, 1, 2, 3, 4, 5, 10, 20, 30, 31]);
    }

    #[test]
    fn reachable_from_entry_point() {
        let design = make_design();
        let reached: Vec<u32> = design
            .reachable_from(&[id(0)])
            .into_iter()
            .map(|m| m.as_raw())
            .collect();
        assert_eq!(reached, vec![0, 1, 2, 3]);
    }

    #[test]
    fn globals_lookup() {
        let mut design = make_design();
        let int = design.types.intern(Type::Int {
            width: 32,
            signed: true,
        });
        design.add_global(GlobalVariable {
            name: id(20),
            ty: int,
            init: Some(Literal::Int(7)),
            shared: true,
        });
        assert!(design.global_by_name(id(20)).unwrap().shared);
        assert!(design.global_by_name(id(21)).is_none());
    }
}
