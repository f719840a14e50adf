//! Whole-module driver.
//!
//! Summarizes every function of a module, expands call-form constraints
//! against the summary map, runs the transform pipeline to a fixpoint, and
//! surfaces the constraints that are already unsatisfiable without any
//! solver: a literal conflict, or a broadcast of two fully known,
//! incompatible shapes. Everything subtler is left to a downstream solver.

use crate::constraints::{BoolExpr, Constraint, IntExpr, ListExpr};
use crate::diagnostics::{Warning, WarningSink};
use crate::inlining::{inline_calls, InlineError};
use crate::interp::{summarize, CfgPreprocessor};
use crate::ir::{Function, TypeEnvironment};
use crate::transforms::TransformPipeline;
use std::collections::HashMap;

/// Final checking result for one function.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedFunction {
    pub function: String,
    /// Fully inlined and simplified constraints.
    pub constraints: Vec<Constraint>,
    /// The subset already unsatisfiable on its own, with the call stacks
    /// naming the responsible source locations.
    pub unsatisfiable: Vec<Constraint>,
}

/// Check every function of a module.
///
/// Functions that cannot be abstracted are reported through `sink` and
/// treated as opaque by their callers.
pub fn check_module(
    functions: &[Function],
    types: &TypeEnvironment,
    preprocessor: &dyn CfgPreprocessor,
    sink: &mut dyn WarningSink,
) -> Vec<CheckedFunction> {
    let mut summaries = HashMap::new();
    for function in functions {
        if let Some(summary) = summarize(function, types, preprocessor, sink) {
            summaries.insert(function.name.clone(), summary);
        }
    }

    let pipeline = TransformPipeline::default_pipeline();
    let mut checked = Vec::new();
    for function in functions {
        let Some(summary) = summaries.get(&function.name) else {
            continue;
        };
        let constraints = match inline_calls(summary, &summaries) {
            Ok(constraints) => constraints,
            Err(error @ InlineError::RecursiveCall { .. }) => {
                sink.warn(Warning::new(format!(
                    "cannot check {}: {}",
                    function.name, error
                )));
                continue;
            }
        };
        let constraints = pipeline.run(constraints);
        let unsatisfiable = constraints
            .iter()
            .filter(|constraint| is_unsatisfiable(constraint))
            .cloned()
            .collect();
        checked.push(CheckedFunction {
            function: function.name.clone(),
            constraints,
            unsatisfiable,
        });
    }
    checked
}

/// Whether a constraint is unsatisfiable on its own.
///
/// Deliberately shallow: a `false` predicate, a literal integer or shape
/// conflict, or an impossible broadcast the simplifier left in place. A
/// constraint whose assumption is already `false` is vacuous, not
/// unsatisfiable.
pub fn is_unsatisfiable(constraint: &Constraint) -> bool {
    if constraint.assuming == BoolExpr::False {
        return false;
    }
    direct_conflict(&constraint.expr) || bool_has_impossible_broadcast(&constraint.expr)
}

fn direct_conflict(expr: &BoolExpr) -> bool {
    match expr {
        BoolExpr::False => true,
        BoolExpr::And(items) => items.iter().any(direct_conflict),
        BoolExpr::IntEq(a, b) => int_literal_conflict(a, b),
        BoolExpr::ListEq(a, b) => list_literal_conflict(a, b),
        _ => false,
    }
}

fn int_literal_conflict(a: &IntExpr, b: &IntExpr) -> bool {
    matches!((a, b), (IntExpr::Literal(x), IntExpr::Literal(y)) if x != y)
}

fn list_literal_conflict(a: &ListExpr, b: &ListExpr) -> bool {
    let (ListExpr::Literal(xs), ListExpr::Literal(ys)) = (a, b) else {
        return false;
    };
    if xs.len() != ys.len() {
        return true;
    }
    xs.iter().zip(ys).any(|(x, y)| match (x, y) {
        (Some(x), Some(y)) => int_literal_conflict(x, y),
        _ => false,
    })
}

fn bool_has_impossible_broadcast(expr: &BoolExpr) -> bool {
    match expr {
        BoolExpr::True | BoolExpr::False | BoolExpr::Var(_) => false,
        BoolExpr::Not(inner) => bool_has_impossible_broadcast(inner),
        BoolExpr::And(items) | BoolExpr::Or(items) => {
            items.iter().any(bool_has_impossible_broadcast)
        }
        BoolExpr::IntEq(a, b)
        | BoolExpr::IntGt(a, b)
        | BoolExpr::IntGe(a, b)
        | BoolExpr::IntLt(a, b)
        | BoolExpr::IntLe(a, b) => {
            int_has_impossible_broadcast(a) || int_has_impossible_broadcast(b)
        }
        BoolExpr::ListEq(a, b) => {
            list_has_impossible_broadcast(a) || list_has_impossible_broadcast(b)
        }
        BoolExpr::BoolEq(a, b) => {
            bool_has_impossible_broadcast(a) || bool_has_impossible_broadcast(b)
        }
    }
}

fn int_has_impossible_broadcast(expr: &IntExpr) -> bool {
    match expr {
        IntExpr::Var(_) | IntExpr::Literal(_) | IntExpr::Hole(_) => false,
        IntExpr::Length(list) | IntExpr::Element(_, list) => list_has_impossible_broadcast(list),
        IntExpr::Add(a, b) | IntExpr::Sub(a, b) | IntExpr::Mul(a, b) | IntExpr::Div(a, b) => {
            int_has_impossible_broadcast(a) || int_has_impossible_broadcast(b)
        }
    }
}

fn list_has_impossible_broadcast(expr: &ListExpr) -> bool {
    match expr {
        ListExpr::Var(_) => false,
        ListExpr::Literal(dims) => dims
            .iter()
            .flatten()
            .any(int_has_impossible_broadcast),
        ListExpr::Broadcast(a, b) => {
            if let (ListExpr::Literal(xs), ListExpr::Literal(ys)) = (a.as_ref(), b.as_ref()) {
                if incompatible_pair(xs, ys) {
                    return true;
                }
            }
            list_has_impossible_broadcast(a) || list_has_impossible_broadcast(b)
        }
    }
}

/// Two right-aligned known dimensions that are unequal and both non-unit.
fn incompatible_pair(a: &[Option<IntExpr>], b: &[Option<IntExpr>]) -> bool {
    let overlap = a.len().min(b.len());
    (1..=overlap).any(|offset| {
        let x = &a[a.len() - offset];
        let y = &b[b.len() - offset];
        matches!(
            (x, y),
            (Some(IntExpr::Literal(m)), Some(IntExpr::Literal(n)))
                if m != n && *m != 1 && *n != 1
        )
    })
}
