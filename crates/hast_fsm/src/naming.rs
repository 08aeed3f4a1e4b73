//! Structured names for every variable and signal a component owns.
//!
//! Names are never concatenated strings during lowering. An [`ObjectName`] is
//! the owning component, an optional other member the object is about (for
//! invocation channels), a [`Purpose`] and an optional index. Rendering to a
//! dotted string happens only when printing.

use hast_common::{Ident, Interner};
use std::collections::BTreeSet;

/// What an object is for.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Purpose {
    /// The state variable of a member state machine.
    State,
    /// The invocation request half of a handshake.
    Started,
    /// The completion half of a handshake.
    Finished,
    /// The value a member returns.
    Return,
    /// The round-robin pointer into a pool of invoked instances.
    InvocationIndex,
    /// A formal parameter passed by signal.
    Parameter(Ident),
    /// A local variable (user declared, or the latched copy of a parameter).
    Variable(Ident),
    /// A design-level global, named independently of any component.
    Global(Ident),
}

/// A component-qualified object name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ObjectName {
    /// The component the name is qualified with; `None` for globals.
    pub scope: Option<Ident>,
    /// The invoked member, for invocation channel objects.
    pub target: Option<Ident>,
    /// What the object is for.
    pub purpose: Purpose,
    /// Disambiguation or instance index.
    pub index: Option<u32>,
}

impl ObjectName {
    fn own(component: Ident, purpose: Purpose) -> Self {
        Self {
            scope: Some(component),
            target: None,
            purpose,
            index: None,
        }
    }

    fn channel(caller: Ident, target: Ident, purpose: Purpose, index: Option<u32>) -> Self {
        Self {
            scope: Some(caller),
            target: Some(target),
            purpose,
            index,
        }
    }

    /// `<component>._State`
    pub fn state_variable(component: Ident) -> Self {
        Self::own(component, Purpose::State)
    }

    /// `<component>._Started`
    pub fn started(component: Ident) -> Self {
        Self::own(component, Purpose::Started)
    }

    /// `<component>._Finished`
    pub fn finished(component: Ident) -> Self {
        Self::own(component, Purpose::Finished)
    }

    /// `<component>.return`
    pub fn return_value(component: Ident) -> Self {
        Self::own(component, Purpose::Return)
    }

    /// `<component>.<parameter>.parameter`
    pub fn parameter(component: Ident, parameter: Ident) -> Self {
        Self::own(component, Purpose::Parameter(parameter))
    }

    /// `<component>.<variable>`, the base a local's indexed name is probed from.
    pub fn variable(component: Ident, variable: Ident) -> Self {
        Self::own(component, Purpose::Variable(variable))
    }

    /// `<global>`
    pub fn global(global: Ident) -> Self {
        Self {
            scope: None,
            target: None,
            purpose: Purpose::Global(global),
            index: None,
        }
    }

    /// `<caller>.<target>._Started.<index>`
    pub fn channel_started(caller: Ident, target: Ident, index: u32) -> Self {
        Self::channel(caller, target, Purpose::Started, Some(index))
    }

    /// `<caller>.<target>._Finished.<index>`
    pub fn channel_finished(caller: Ident, target: Ident, index: u32) -> Self {
        Self::channel(caller, target, Purpose::Finished, Some(index))
    }

    /// `<caller>.<target>.return.<index>`
    pub fn channel_return(caller: Ident, target: Ident, index: u32) -> Self {
        Self::channel(caller, target, Purpose::Return, Some(index))
    }

    /// `<caller>.<target>.<parameter>.parameter.<index>`
    pub fn channel_parameter(caller: Ident, target: Ident, parameter: Ident, index: u32) -> Self {
        Self::channel(caller, target, Purpose::Parameter(parameter), Some(index))
    }

    /// `<caller>.<target>._InvocationIndex`
    pub fn invocation_index(caller: Ident, target: Ident) -> Self {
        Self::channel(caller, target, Purpose::InvocationIndex, None)
    }

    /// Returns this name with the given index.
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    /// Renders the dotted form, e.g. `Primes::Count.Primes::IsPrime._Started.0`.
    pub fn render(&self, interner: &Interner) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(4);
        if let Some(scope) = self.scope {
            parts.push(interner.resolve(scope).to_string());
        }
        if let Some(target) = self.target {
            parts.push(interner.resolve(target).to_string());
        }
        parts.push(match self.purpose {
            Purpose::State => "_State".to_string(),
            Purpose::Started => "_Started".to_string(),
            Purpose::Finished => "_Finished".to_string(),
            Purpose::Return => "return".to_string(),
            Purpose::InvocationIndex => "_InvocationIndex".to_string(),
            Purpose::Parameter(p) => format!("{}.parameter", interner.resolve(p)),
            Purpose::Variable(v) | Purpose::Global(v) => interner.resolve(v).to_string(),
        });
        if let Some(index) = self.index {
            parts.push(index.to_string());
        }
        parts.join(".")
    }
}

/// The set of names taken in one component.
#[derive(Clone, Debug, Default)]
pub struct NameTable {
    taken: BTreeSet<ObjectName>,
}

impl NameTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `name` is taken.
    pub fn contains(&self, name: &ObjectName) -> bool {
        self.taken.contains(name)
    }

    /// Takes `name`; returns `false` if it was already taken.
    pub fn insert(&mut self, name: ObjectName) -> bool {
        self.taken.insert(name)
    }

    /// Number of taken names.
    pub fn len(&self) -> usize {
        self.taken.len()
    }

    /// Returns `true` if no name is taken.
    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }

    /// First of `base.0`, `base.1`, ... that is not taken.
    ///
    /// At most `len() + 1` candidates are probed. The table is not modified.
    pub fn next_unused_indexed_name(&self, base: &ObjectName) -> ObjectName {
        let mut index = 0;
        loop {
            let candidate = base.clone().with_index(index);
            if !self.contains(&candidate) {
                return candidate;
            }
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_own_names() {
        let interner = Interner::new();
        let c = interner.get_or_intern("Primes::IsPrime");
        let p = interner.get_or_intern("number");
        assert_eq!(
            ObjectName::state_variable(c).render(&interner),
            "Primes::IsPrime._State"
        );
        assert_eq!(
            ObjectName::return_value(c).render(&interner),
            "Primes::IsPrime.return"
        );
        assert_eq!(
            ObjectName::parameter(c, p).render(&interner),
            "Primes::IsPrime.number.parameter"
        );
        assert_eq!(
            ObjectName::variable(c, p).with_index(0).render(&interner),
            "Primes::IsPrime.number.0"
        );
    }

    #[test]
    fn render_channel_names() {
        let interner = Interner::new();
        let caller = interner.get_or_intern("Primes::Count");
        let target = interner.get_or_intern("Primes::IsPrime");
        let p = interner.get_or_intern("number");
        assert_eq!(
            ObjectName::channel_started(caller, target, 2).render(&interner),
            "Primes::Count.Primes::IsPrime._Started.2"
        );
        assert_eq!(
            ObjectName::channel_parameter(caller, target, p, 0).render(&interner),
            "Primes::Count.Primes::IsPrime.number.parameter.0"
        );
        assert_eq!(
            ObjectName::invocation_index(caller, target).render(&interner),
            "Primes::Count.Primes::IsPrime._InvocationIndex"
        );
    }

    #[test]
    fn global_names_ignore_components() {
        let interner = Interner::new();
        let g = interner.get_or_intern("Primes::Counter");
        assert_eq!(ObjectName::global(g).render(&interner), "Primes::Counter");
    }

    #[test]
    fn probe_returns_first_untaken_index() {
        let c = Ident::from_raw(0);
        let v = Ident::from_raw(1);
        let base = ObjectName::variable(c, v);
        let mut table = NameTable::new();
        assert_eq!(table.next_unused_indexed_name(&base).index, Some(0));

        table.insert(base.clone().with_index(0));
        table.insert(base.clone().with_index(2));
        assert_eq!(table.next_unused_indexed_name(&base).index, Some(1));
    }

    #[test]
    fn probe_is_deterministic() {
        let base = ObjectName::variable(Ident::from_raw(0), Ident::from_raw(1));
        let mut table = NameTable::new();
        table.insert(base.clone().with_index(0));
        let a = table.next_unused_indexed_name(&base);
        let b = table.next_unused_indexed_name(&base);
        assert_eq!(a, b);
    }

    #[test]
    fn repeated_allocation_yields_distinct_names() {
        let base = ObjectName::variable(Ident::from_raw(0), Ident::from_raw(1));
        let mut table = NameTable::new();
        let mut seen = BTreeSet::new();
        for _ in 0..20 {
            let name = table.next_unused_indexed_name(&base);
            assert!(table.insert(name.clone()));
            assert!(seen.insert(name));
        }
        assert_eq!(table.len(), 20);
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut table = NameTable::new();
        let name = ObjectName::started(Ident::from_raw(0));
        assert!(table.insert(name.clone()));
        assert!(!table.insert(name));
    }
}
