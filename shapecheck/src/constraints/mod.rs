//! Symbolic constraint IR: terms, substitution, constraints, printing.
//!
//! # Module Organization
//!
//! - `terms.rs`: the three term sorts, variables, the shared counter
//! - `substitution.rs`: sort-preserving structural substitution
//! - `constraint.rs`: raw/final constraints, call stacks, summaries
//! - `display.rs`: infix rendering (also the stable path-condition sort key)
//! - `tests.rs`: tests

mod constraint;
mod display;
mod substitution;
mod terms;

pub use constraint::{CallStack, Constraint, ConstraintOrigin, FunctionSummary, RawConstraint};
pub use substitution::Substitution;
pub use terms::{BoolExpr, BoolVar, Expr, IntExpr, IntVar, ListExpr, ListVar, VarSet, VarSupply};
