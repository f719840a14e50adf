//! Types as the parser reports them, and the nominal-type environment.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Type of a register, block argument, or operator result.
///
/// The parser preserves the source compiler's full type grammar; the checker
/// only ever inspects types after [`Type::simplified`] has peeled the
/// qualifier wrappers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// Nominal type, e.g. `Int`, `Bool`, `TensorShape`.
    Named(String),
    /// Specialized generic, e.g. `Tensor<Float>`.
    Specialized { base: Box<Type>, params: Vec<Type> },
    Tuple(Vec<Type>),
    Function { params: Vec<Type>, result: Box<Type> },
    /// Address of a value, e.g. a global's storage.
    Address(Box<Type>),
    /// Attribute-qualified, e.g. an escape annotation.
    Attributed { attributes: Vec<String>, base: Box<Type> },
    /// Generic-signature wrapper.
    Generic { params: Vec<String>, base: Box<Type> },
    /// Ownership-qualified (owned, guaranteed, ...).
    Ownership { kind: String, base: Box<Type> },
    /// Compiler-builtin, e.g. `Builtin.IntLiteral`.
    Builtin(String),
}

impl Type {
    pub fn named(name: impl Into<String>) -> Type {
        Type::Named(name.into())
    }

    /// Peel attribute, generic, and ownership wrappers.
    pub fn simplified(&self) -> &Type {
        let mut ty = self;
        loop {
            match ty {
                Type::Attributed { base, .. }
                | Type::Generic { base, .. }
                | Type::Ownership { base, .. } => ty = base,
                _ => return ty,
            }
        }
    }

    /// Name of the nominal type after simplification, if this is one.
    pub fn nominal_name(&self) -> Option<&str> {
        match self.simplified() {
            Type::Named(name) => Some(name),
            Type::Specialized { base, .. } => base.nominal_name(),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Named(name) => write!(f, "{}", name),
            Type::Specialized { base, params } => {
                write!(f, "{}<", base)?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ">")
            }
            Type::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Type::Function { params, result } => {
                write!(f, "(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ") -> {}", result)
            }
            Type::Address(base) => write!(f, "*{}", base),
            Type::Attributed { base, .. } => write!(f, "{}", base),
            Type::Generic { base, .. } => write!(f, "{}", base),
            Type::Ownership { base, .. } => write!(f, "{}", base),
            Type::Builtin(name) => write!(f, "Builtin.{}", name),
        }
    }
}

/// Nominal type name -> ordered field list.
///
/// `structExtract` resolves a `(type, field)` pair against the declared
/// order, which is also the order aggregate values are laid out in.
#[derive(Debug, Clone, Default)]
pub struct TypeEnvironment {
    types: HashMap<String, Vec<(String, Type)>>,
}

impl TypeEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a nominal type with its ordered fields.
    pub fn declare(&mut self, name: impl Into<String>, fields: Vec<(String, Type)>) {
        self.types.insert(name.into(), fields);
    }

    pub fn fields_of(&self, name: &str) -> Option<&[(String, Type)]> {
        self.types.get(name).map(Vec::as_slice)
    }

    /// Position of `field` in the declared order of `type_name`.
    pub fn field_index(&self, type_name: &str, field: &str) -> Option<usize> {
        self.types
            .get(type_name)?
            .iter()
            .position(|(name, _)| name == field)
    }
}
