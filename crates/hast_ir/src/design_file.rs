//! JSON interchange form of a design.

use crate::design::Design;
use hast_common::{HastResult, Ident, Interner, InternalError};
use serde::{Deserialize, Serialize};

/// A design plus the string table its [`Ident`]s index into.
///
/// `names[i]` is the string behind `Ident::from_raw(i)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignFile {
    /// Interned strings in key order.
    pub names: Vec<String>,
    /// The design.
    pub design: Design,
}

impl DesignFile {
    /// Captures a design together with the interner it was built with.
    pub fn capture(design: Design, interner: &Interner) -> Self {
        Self {
            names: interner.strings(),
            design,
        }
    }

    /// Re-interns the name table into a fresh interner.
    ///
    /// Fails when the table contains duplicates, because then the keys of the
    /// fresh interner no longer line up with the idents in the design, or when
    /// the design refers to a name the table does not hold.
    pub fn restore(self) -> HastResult<(Design, Interner)> {
        let interner = Interner::new();
        for (i, name) in self.names.iter().enumerate() {
            let key = interner.get_or_intern(name);
            if key != Ident::from_raw(i as u32) {
                return Err(InternalError::new(format!(
                    "name table entry {i} ('{name}') duplicates an earlier entry"
                )));
            }
        }
        if let Some(missing) = self
            .design
            .referenced_idents()
            .into_iter()
            .find(|ident| ident.as_raw() as usize >= self.names.len())
        {
            return Err(InternalError::new(format!(
                "design refers to name {} but the name table has only {} entries",
                missing.as_raw(),
                self.names.len()
            )));
        }
        Ok((self.design, interner))
    }
}
