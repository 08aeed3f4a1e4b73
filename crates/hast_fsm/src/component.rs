//! Architecture components: the unit owning variables and signals.

use crate::hdl::{
    AssignKind, Body, DataObject, DataType, Declaration, DeclarationSection, Declarations,
    HdlExpr, HdlStmt, ObjectKind, Value,
};
use crate::naming::{NameTable, ObjectName};
use hast_common::{HastResult, Ident, InternalError};
use std::collections::BTreeMap;

/// A design-level variable as seen by one component.
#[derive(Clone, PartialEq, Debug)]
pub struct GlobalObject {
    /// The variable.
    pub object: DataObject,
    /// Declared with the architecture instead of inside the process.
    pub shared: bool,
}

/// The base unit of generated hardware.
///
/// Owns four object sets and records, per invoked member, the largest number
/// of concurrent instances this component ever asked for. Every name is
/// registered in one [`NameTable`] so no two owned objects share a name.
#[derive(Clone, Debug)]
pub struct ArchitectureComponent {
    name: Ident,
    local_variables: Vec<DataObject>,
    global_variables: Vec<GlobalObject>,
    internally_driven_signals: Vec<DataObject>,
    externally_driven_signals: Vec<DataObject>,
    other_member_max_invocation_instance_counts: BTreeMap<Ident, u32>,
    names: NameTable,
}

impl ArchitectureComponent {
    /// Creates an empty component.
    pub fn new(name: Ident) -> Self {
        Self {
            name,
            local_variables: Vec::new(),
            global_variables: Vec::new(),
            internally_driven_signals: Vec::new(),
            externally_driven_signals: Vec::new(),
            other_member_max_invocation_instance_counts: BTreeMap::new(),
            names: NameTable::new(),
        }
    }

    /// The component's name.
    pub fn name(&self) -> Ident {
        self.name
    }

    /// Variables private to this component.
    pub fn local_variables(&self) -> &[DataObject] {
        &self.local_variables
    }

    /// Design-level variables this component uses.
    pub fn global_variables(&self) -> &[GlobalObject] {
        &self.global_variables
    }

    /// Signals this component writes.
    pub fn internally_driven_signals(&self) -> &[DataObject] {
        &self.internally_driven_signals
    }

    /// Signals this component only reads.
    pub fn externally_driven_signals(&self) -> &[DataObject] {
        &self.externally_driven_signals
    }

    /// Largest concurrent instance count requested per invoked member.
    pub fn other_member_max_invocation_instance_counts(&self) -> &BTreeMap<Ident, u32> {
        &self.other_member_max_invocation_instance_counts
    }

    /// Returns `true` if an object with this name is owned.
    pub fn contains(&self, name: &ObjectName) -> bool {
        self.names.contains(name)
    }

    fn take_name(&mut self, name: &ObjectName) -> HastResult<()> {
        if self.names.insert(name.clone()) {
            Ok(())
        } else {
            Err(InternalError::new(format!(
                "component already owns an object named {name:?}"
            )))
        }
    }

    /// Adds a local variable.
    pub fn add_local_variable(&mut self, object: DataObject) -> HastResult<()> {
        self.take_name(&object.name)?;
        self.local_variables.push(object);
        Ok(())
    }

    /// Adds a design-level variable.
    pub fn add_global_variable(&mut self, object: DataObject, shared: bool) -> HastResult<()> {
        self.take_name(&object.name)?;
        self.global_variables.push(GlobalObject { object, shared });
        Ok(())
    }

    /// Adds a signal this component writes.
    pub fn add_internally_driven_signal(&mut self, object: DataObject) -> HastResult<()> {
        self.take_name(&object.name)?;
        self.internally_driven_signals.push(object);
        Ok(())
    }

    /// Adds a signal some other component writes.
    pub fn add_externally_driven_signal(&mut self, object: DataObject) -> HastResult<()> {
        self.take_name(&object.name)?;
        self.externally_driven_signals.push(object);
        Ok(())
    }

    /// Adds a local variable named `base.<first unused index>`.
    pub fn create_variable_with_next_unused_indexed_name(
        &mut self,
        base: &ObjectName,
        data_type: DataType,
        initial: Option<Value>,
    ) -> ObjectName {
        let name = self.names.next_unused_indexed_name(base);
        self.names.insert(name.clone());
        self.local_variables.push(DataObject {
            name: name.clone(),
            data_type,
            initial,
        });
        name
    }

    /// Adds an internally driven signal named `base.<first unused index>`.
    pub fn create_signal_with_next_unused_indexed_name(
        &mut self,
        base: &ObjectName,
        data_type: DataType,
        initial: Option<Value>,
    ) -> ObjectName {
        let name = self.names.next_unused_indexed_name(base);
        self.names.insert(name.clone());
        self.internally_driven_signals.push(DataObject {
            name: name.clone(),
            data_type,
            initial,
        });
        name
    }

    /// Looks up an owned object and its assignment semantics.
    pub fn object(&self, name: &ObjectName) -> Option<(&DataObject, ObjectKind)> {
        if let Some(o) = self.local_variables.iter().find(|o| &o.name == name) {
            return Some((o, ObjectKind::Variable));
        }
        if let Some(g) = self.global_variables.iter().find(|g| &g.object.name == name) {
            return Some((&g.object, ObjectKind::Variable));
        }
        self.internally_driven_signals
            .iter()
            .chain(&self.externally_driven_signals)
            .find(|o| &o.name == name)
            .map(|o| (o, ObjectKind::Signal))
    }

    /// Mutable access to a local variable, e.g. to widen its range.
    pub fn local_variable_mut(&mut self, name: &ObjectName) -> Option<&mut DataObject> {
        self.local_variables.iter_mut().find(|o| &o.name == name)
    }

    /// Every owned object with its assignment semantics.
    pub fn objects(&self) -> impl Iterator<Item = (&DataObject, ObjectKind)> {
        self.local_variables
            .iter()
            .chain(self.global_variables.iter().map(|g| &g.object))
            .map(|o| (o, ObjectKind::Variable))
            .chain(
                self.internally_driven_signals
                    .iter()
                    .chain(&self.externally_driven_signals)
                    .map(|o| (o, ObjectKind::Signal)),
            )
    }

    /// Records that `count` instances of `target` were requested; keeps the maximum.
    pub fn record_invocation_instance_count(&mut self, target: Ident, count: u32) {
        let entry = self
            .other_member_max_invocation_instance_counts
            .entry(target)
            .or_insert(0);
        *entry = (*entry).max(count);
    }

    /// Signals and shared globals, in commented sections.
    ///
    /// A component with neither yields [`Declarations::Empty`].
    pub fn build_declarations(&self) -> Declarations {
        self.build_declarations_with(Vec::new())
    }

    pub(crate) fn build_declarations_with(
        &self,
        mut sections: Vec<DeclarationSection>,
    ) -> Declarations {
        let shared: Vec<Declaration> = self
            .global_variables
            .iter()
            .filter(|g| g.shared)
            .map(|g| Declaration::Object {
                object: g.object.clone(),
                kind: ObjectKind::Variable,
            })
            .collect();
        push_section(&mut sections, "Shared (global) variables", shared);
        push_section(
            &mut sections,
            "Signals driven by this component",
            signal_declarations(&self.internally_driven_signals),
        );
        push_section(
            &mut sections,
            "Signals driven by other components",
            signal_declarations(&self.externally_driven_signals),
        );

        if sections.iter().all(|s| s.items.is_empty()) {
            Declarations::Empty
        } else {
            Declarations::Sections(sections)
        }
    }

    /// Wraps `logic` into the component's clocked process.
    ///
    /// Reset restores every local variable, global and internally driven
    /// signal that declares an initial value.
    pub fn build_body(&self, logic: Vec<HdlStmt>) -> Body {
        let variables = self
            .local_variables
            .iter()
            .cloned()
            .chain(
                self.global_variables
                    .iter()
                    .filter(|g| !g.shared)
                    .map(|g| g.object.clone()),
            )
            .collect();

        let mut reset = Vec::new();
        let resettable = self
            .local_variables
            .iter()
            .chain(self.global_variables.iter().map(|g| &g.object))
            .map(|o| (o, AssignKind::Variable))
            .chain(
                self.internally_driven_signals
                    .iter()
                    .map(|o| (o, AssignKind::Signal)),
            );
        for (object, kind) in resettable {
            if let Some(initial) = &object.initial {
                reset.push(HdlStmt::Assign {
                    target: HdlExpr::Ref(object.name.clone()),
                    value: HdlExpr::Value(initial.clone()),
                    kind,
                });
            }
        }

        Body {
            component: self.name,
            variables,
            reset,
            logic,
        }
    }
}

fn signal_declarations(signals: &[DataObject]) -> Vec<Declaration> {
    signals
        .iter()
        .map(|s| Declaration::Object {
            object: s.clone(),
            kind: ObjectKind::Signal,
        })
        .collect()
}

fn push_section(sections: &mut Vec<DeclarationSection>, comment: &str, items: Vec<Declaration>) {
    if !items.is_empty() {
        sections.push(DeclarationSection {
            comment: comment.to_string(),
            items,
        });
    }
}
