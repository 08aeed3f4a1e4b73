//! Renders components as indented, VHDL-flavored text for inspection.

use crate::hdl::{
    AssignKind, Body, Choice, DataObject, DataType, Declaration, Declarations, HdlBinaryOp,
    HdlExpr, HdlStmt, HdlUnaryOp, ObjectKind, Value,
};
use crate::naming::ObjectName;
use crate::state_machine::MemberStateMachine;
use hast_common::Interner;
use std::fmt::Write;

/// Pretty-printer for declarations and bodies.
pub struct Printer<'a> {
    interner: &'a Interner,
    indent: usize,
}

impl<'a> Printer<'a> {
    /// Creates a printer indenting by four spaces.
    pub fn new(interner: &'a Interner) -> Self {
        Self {
            interner,
            indent: 4,
        }
    }

    /// Uses `indent` spaces per nesting level.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Declarations, then the clocked process of a state machine.
    pub fn print_machine(&self, machine: &MemberStateMachine) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "-- {}: {} states",
            self.interner.resolve(machine.name()),
            machine.state_count()
        );
        out.push_str(&self.print_declarations(&machine.build_declarations()));
        out.push('\n');
        out.push_str(&self.print_body(&machine.build_body()));
        out
    }

    /// One commented block per declaration section.
    pub fn print_declarations(&self, declarations: &Declarations) -> String {
        let mut out = String::new();
        let Declarations::Sections(sections) = declarations else {
            return out;
        };
        for section in sections {
            let _ = writeln!(out, "-- {}", section.comment);
            for item in &section.items {
                match item {
                    Declaration::StateType {
                        component,
                        state_count,
                    } => {
                        let states: Vec<String> =
                            (0..*state_count).map(state_literal).collect();
                        let _ = writeln!(
                            out,
                            "type \\{}._States\\ is ({});",
                            self.interner.resolve(*component),
                            states.join(", ")
                        );
                    }
                    Declaration::Object { object, kind } => {
                        let keyword = match kind {
                            ObjectKind::Signal => "signal",
                            ObjectKind::Variable => "shared variable",
                        };
                        let _ = writeln!(out, "{keyword} {};", self.object(object));
                    }
                }
            }
            out.push('\n');
        }
        out
    }

    /// The clocked process with its variables, reset branch and logic.
    pub fn print_body(&self, body: &Body) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "\\{}._StateMachine\\: process (\\Clock\\)",
            self.interner.resolve(body.component)
        );
        for variable in &body.variables {
            let _ = writeln!(out, "{}variable {};", self.pad(1), self.object(variable));
        }
        out.push_str("begin\n");
        let _ = writeln!(out, "{}if rising_edge(\\Clock\\) then", self.pad(1));
        let _ = writeln!(out, "{}if \\Reset\\ = '1' then", self.pad(2));
        self.statements(&mut out, &body.reset, 3);
        let _ = writeln!(out, "{}else", self.pad(2));
        self.statements(&mut out, &body.logic, 3);
        let _ = writeln!(out, "{}end if;", self.pad(2));
        let _ = writeln!(out, "{}end if;", self.pad(1));
        out.push_str("end process;\n");
        out
    }

    fn pad(&self, level: usize) -> String {
        " ".repeat(level * self.indent)
    }

    fn object(&self, object: &DataObject) -> String {
        let mut text = format!(
            "{}: {}",
            self.name(&object.name),
            self.data_type(&object.data_type)
        );
        if let Some(initial) = &object.initial {
            let _ = write!(text, " := {}", value(initial));
        }
        text
    }

    /// An object name as an extended identifier.
    pub fn name(&self, name: &ObjectName) -> String {
        format!("\\{}\\", name.render(self.interner))
    }

    /// A data type.
    pub fn data_type(&self, data_type: &DataType) -> String {
        match data_type {
            DataType::Boolean => "boolean".to_string(),
            DataType::Signed(width) => format!("signed({} downto 0)", width.saturating_sub(1)),
            DataType::Unsigned(width) => format!("unsigned({} downto 0)", width.saturating_sub(1)),
            DataType::Range { low, high } => format!("integer range {low} to {high}"),
            DataType::Array { element, size } => format!(
                "array (0 to {}) of {}",
                size.saturating_sub(1),
                self.data_type(element)
            ),
            DataType::State => "_States".to_string(),
        }
    }

    fn statements(&self, out: &mut String, stmts: &[HdlStmt], level: usize) {
        for stmt in stmts {
            self.statement(out, stmt, level);
        }
    }

    fn statement(&self, out: &mut String, stmt: &HdlStmt, level: usize) {
        let pad = self.pad(level);
        match stmt {
            HdlStmt::Assign {
                target,
                value,
                kind,
            } => {
                let operator = match kind {
                    AssignKind::Variable => ":=",
                    AssignKind::Signal => "<=",
                };
                let _ = writeln!(
                    out,
                    "{pad}{} {operator} {};",
                    self.expr(target),
                    self.expr(value)
                );
            }
            HdlStmt::If {
                condition,
                then_body,
                else_body,
            } => {
                let _ = writeln!(out, "{pad}if ({}) then", self.expr(condition));
                self.statements(out, then_body, level + 1);
                if !else_body.is_empty() {
                    let _ = writeln!(out, "{pad}else");
                    self.statements(out, else_body, level + 1);
                }
                let _ = writeln!(out, "{pad}end if;");
            }
            HdlStmt::Case { subject, arms } => {
                let _ = writeln!(out, "{pad}case {} is", self.expr(subject));
                for arm in arms {
                    let choice = match &arm.choice {
                        Choice::Match(expr) => self.expr(expr),
                        Choice::Others => "others".to_string(),
                    };
                    let _ = writeln!(out, "{pad}{}when {choice} =>", self.pad(1));
                    self.statements(out, &arm.body, level + 2);
                }
                let _ = writeln!(out, "{pad}end case;");
            }
            HdlStmt::Comment(text) => {
                for line in text.lines() {
                    let _ = writeln!(out, "{pad}-- {line}");
                }
            }
        }
    }

    /// An expression; nested operations are parenthesized.
    pub fn expr(&self, expr: &HdlExpr) -> String {
        match expr {
            HdlExpr::Ref(name) => self.name(name),
            HdlExpr::Value(v) => value(v),
            HdlExpr::State(index) => state_literal(*index),
            HdlExpr::Unary { op, operand } => {
                let op = match op {
                    HdlUnaryOp::Not => "not ",
                    HdlUnaryOp::Neg => "-",
                };
                format!("{op}{}", self.operand(operand))
            }
            HdlExpr::Binary { op, lhs, rhs } => format!(
                "{} {} {}",
                self.operand(lhs),
                binary_operator(*op),
                self.operand(rhs)
            ),
            HdlExpr::Convert { value, to } => {
                format!("resize({}, {})", self.expr(value), self.data_type(to))
            }
            HdlExpr::Index { array, index } => {
                format!("{}({})", self.operand(array), self.expr(index))
            }
            HdlExpr::Aggregate(elements) => {
                let elements: Vec<String> = elements.iter().map(|e| self.expr(e)).collect();
                format!("({})", elements.join(", "))
            }
        }
    }

    fn operand(&self, expr: &HdlExpr) -> String {
        match expr {
            HdlExpr::Binary { .. } | HdlExpr::Unary { .. } => format!("({})", self.expr(expr)),
            _ => self.expr(expr),
        }
    }
}

fn state_literal(index: usize) -> String {
    format!("_State_{index}")
}

fn value(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Array(elements) => {
            let elements: Vec<String> = elements.iter().map(self::value).collect();
            format!("({})", elements.join(", "))
        }
    }
}

fn binary_operator(op: HdlBinaryOp) -> &'static str {
    match op {
        HdlBinaryOp::Add => "+",
        HdlBinaryOp::Sub => "-",
        HdlBinaryOp::Mul => "*",
        HdlBinaryOp::Div => "/",
        HdlBinaryOp::Mod => "mod",
        HdlBinaryOp::And => "and",
        HdlBinaryOp::Or => "or",
        HdlBinaryOp::Xor => "xor",
        HdlBinaryOp::ShiftLeft => "sll",
        HdlBinaryOp::ShiftRight => "srl",
        HdlBinaryOp::Eq => "=",
        HdlBinaryOp::Ne => "/=",
        HdlBinaryOp::Lt => "<",
        HdlBinaryOp::Le => "<=",
        HdlBinaryOp::Gt => ">",
        HdlBinaryOp::Ge => ">=",
        HdlBinaryOp::Alternative => "|",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expressions_parenthesize_nested_operations() {
        let interner = Interner::new();
        let printer = Printer::new(&interner);
        let expr = HdlExpr::binary(
            HdlBinaryOp::And,
            HdlExpr::equals(HdlExpr::int(1), HdlExpr::int(2)),
            HdlExpr::bool(true),
        );
        assert_eq!(printer.expr(&expr), "(1 = 2) and true");
    }

    #[test]
    fn names_are_extended_identifiers() {
        let interner = Interner::new();
        let c = interner.get_or_intern("Primes::IsPrime");
        let printer = Printer::new(&interner);
        assert_eq!(
            printer.name(&ObjectName::started(c)),
            "\\Primes::IsPrime._Started\\"
        );
    }

    #[test]
    fn machine_listing_has_every_state() {
        let interner = Interner::new();
        let c = interner.get_or_intern("M::Nop");
        let mut machine = MemberStateMachine::new(c).unwrap();
        machine.add_state(vec![HdlStmt::Comment("body".to_string())]);
        let text = Printer::new(&interner).with_indent(2).print_machine(&machine);
        assert!(text.starts_with("-- M::Nop: 3 states"));
        assert!(text.contains("type \\M::Nop._States\\ is (_State_0, _State_1, _State_2);"));
        assert!(text.contains("when _State_2 =>"));
        assert!(text.contains("-- body"));
        assert!(text.contains("signal \\M::Nop._Started\\: boolean := false;"));
    }

    #[test]
    fn data_types() {
        let interner = Interner::new();
        let printer = Printer::new(&interner);
        assert_eq!(printer.data_type(&DataType::Signed(32)), "signed(31 downto 0)");
        assert_eq!(
            printer.data_type(&DataType::Range { low: 0, high: 3 }),
            "integer range 0 to 3"
        );
    }
}
