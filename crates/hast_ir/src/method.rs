//! Members hardware is generated for.

use crate::ids::{MethodId, TypeId};
use crate::stmt::Statement;
use hast_common::Ident;
use serde::{Deserialize, Serialize};

/// A formal parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: Ident,
    /// Parameter type.
    pub ty: TypeId,
}

/// A member with a body; becomes one state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    /// This method's ID in its [`Design`](crate::Design).
    pub id: MethodId,
    /// Full, unique member name, e.g. `Primes::IsPrime`.
    pub name: Ident,
    /// Formal parameters in declaration order.
    pub params: Vec<Parameter>,
    /// Return type; [`Type::Void`](crate::Type::Void) for procedures.
    pub return_ty: TypeId,
    /// The body, usually a [`Statement::Block`].
    pub body: Statement,
}
