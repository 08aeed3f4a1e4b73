//! Interned value types of the input program.

use crate::ids::TypeId;
use serde::{Deserialize, Serialize};

/// A fully resolved, fixed-width type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// No value: the return type of procedures.
    Void,
    /// A boolean.
    Bool,
    /// A fixed-width integer.
    Int {
        /// Number of bits.
        width: u32,
        /// Two's complement when `true`.
        signed: bool,
    },
    /// A statically sized array.
    Array {
        /// Element type.
        element: TypeId,
        /// Number of elements.
        size: u32,
    },
}

/// Central type database; each unique [`Type`] is stored once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeDb {
    types: Vec<Type>,
}

impl TypeDb {
    /// Creates a new, empty type database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a type, returning the existing ID if an identical type is known.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(i) = self.types.iter().position(|existing| existing == &ty) {
            return TypeId::from_raw(i as u32);
        }
        let id = TypeId::from_raw(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Returns the type with the given ID, or `None` for a foreign ID.
    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.types.get(id.as_raw() as usize)
    }

    /// Returns `true` if `id` is [`Type::Void`].
    pub fn is_void(&self, id: TypeId) -> bool {
        matches!(self.get(id), Some(Type::Void))
    }

    /// Bit width of a value of this type; `None` for void.
    pub fn bit_width(&self, id: TypeId) -> Option<u32> {
        match self.get(id)? {
            Type::Void => None,
            Type::Bool => Some(1),
            Type::Int { width, .. } => Some(*width),
            Type::Array { element, size } => self.bit_width(*element).map(|w| w * size),
        }
    }

    /// Returns the number of interned types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types have been interned.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_deduplicates() {
        let mut db = TypeDb::new();
        let a = db.intern(Type::Bool);
        let b = db.intern(Type::Bool);
        assert_eq!(a, b);
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn signedness_distinguishes_ints() {
        let mut db = TypeDb::new();
        let u = db.intern(Type::Int {
            width: 32,
            signed: false,
        });
        let s = db.intern(Type::Int {
            width: 32,
            signed: true,
        });
        assert_ne!(u, s);
    }

    #[test]
    fn bit_widths() {
        let mut db = TypeDb::new();
        let void = db.intern(Type::Void);
        let b = db.intern(Type::Bool);
        let byte = db.intern(Type::Int {
            width: 8,
            signed: false,
        });
        let arr = db.intern(Type::Array {
            element: byte,
            size: 4,
        });
        assert_eq!(db.bit_width(void), None);
        assert_eq!(db.bit_width(b), Some(1));
        assert_eq!(db.bit_width(arr), Some(32));
        assert!(db.is_void(void));
        assert!(!db.is_void(b));
    }

    #[test]
    fn foreign_id_is_none() {
        let db = TypeDb::new();
        assert!(db.is_empty());
        assert!(db.get(TypeId::from_raw(3)).is_none());
        assert_eq!(db.bit_width(TypeId::from_raw(3)), None);
    }
}
