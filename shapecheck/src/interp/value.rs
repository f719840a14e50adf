//! Symbolic values tracked per register during abstraction.

use crate::constraints::{BoolExpr, Expr, IntExpr, ListExpr, VarSupply};
use crate::ir::{Type, TypeEnvironment};

/// Value the interpreter tracks for a register.
///
/// A register with no tracked value is simply absent from the valuation;
/// constraints about it are not emitted.
#[derive(Debug, Clone, PartialEq)]
pub enum AbstractValue {
    Int(IntExpr),
    Bool(BoolExpr),
    List(ListExpr),
    /// Tensor, tracked by its shape only.
    Tensor { shape: ListExpr },
    /// Aggregate: struct fields in declared order, or a literal tuple.
    Tuple(Vec<Option<AbstractValue>>),
    /// Reference to a named function.
    Function { name: String },
    /// Partial application; argument types are preserved for the callee.
    PartialApplication {
        callee: Box<AbstractValue>,
        args: Vec<Option<AbstractValue>>,
        arg_types: Vec<Type>,
    },
    /// Address of a module-level global.
    GlobalAddress { symbol: String },
}

impl AbstractValue {
    /// Fresh value for a register of the given type.
    ///
    /// Returns `None` when the type's structure is unknown; the register is
    /// then untracked.
    pub fn fresh(
        ty: &Type,
        types: &TypeEnvironment,
        supply: &mut VarSupply,
    ) -> Option<AbstractValue> {
        match ty.simplified() {
            Type::Named(name) if name == "Int" => {
                Some(AbstractValue::Int(IntExpr::Var(supply.fresh_int())))
            }
            Type::Named(name) if name == "Bool" => {
                Some(AbstractValue::Bool(BoolExpr::Var(supply.fresh_bool())))
            }
            Type::Named(name) if name == "TensorShape" => {
                Some(AbstractValue::List(ListExpr::Var(supply.fresh_list())))
            }
            simplified if simplified.nominal_name() == Some("Tensor") => {
                Some(AbstractValue::Tensor {
                    shape: ListExpr::Var(supply.fresh_list()),
                })
            }
            Type::Tuple(items) => Some(AbstractValue::Tuple(
                items
                    .iter()
                    .map(|item| AbstractValue::fresh(item, types, supply))
                    .collect(),
            )),
            Type::Named(name) => {
                let fields = types.fields_of(name)?.to_vec();
                Some(AbstractValue::Tuple(
                    fields
                        .iter()
                        .map(|(_, field_ty)| AbstractValue::fresh(field_ty, types, supply))
                        .collect(),
                ))
            }
            _ => None,
        }
    }

    /// Boundary expression of this value; tensors are represented by their
    /// shape. Functions and addresses have no expression form.
    pub fn to_expr(&self) -> Option<Expr> {
        match self {
            AbstractValue::Int(e) => Some(Expr::Int(e.clone())),
            AbstractValue::Bool(e) => Some(Expr::Bool(e.clone())),
            AbstractValue::List(e) | AbstractValue::Tensor { shape: e } => {
                Some(Expr::List(e.clone()))
            }
            AbstractValue::Tuple(items) => Some(Expr::Tuple(
                items
                    .iter()
                    .map(|item| item.as_ref().and_then(AbstractValue::to_expr))
                    .collect(),
            )),
            AbstractValue::Function { .. }
            | AbstractValue::PartialApplication { .. }
            | AbstractValue::GlobalAddress { .. } => None,
        }
    }

    /// The shape expression of a tensor or shape value.
    pub fn as_shape(&self) -> Option<&ListExpr> {
        match self {
            AbstractValue::List(shape) | AbstractValue::Tensor { shape } => Some(shape),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&IntExpr> {
        match self {
            AbstractValue::Int(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<&BoolExpr> {
        match self {
            AbstractValue::Bool(e) => Some(e),
            _ => None,
        }
    }
}
