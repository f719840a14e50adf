//! Algebraic simplification of terms.
//!
//! Compositional and bottom-up: subterms are simplified first, then the
//! node's own rule applies. Constant folds only fire when the arithmetic
//! does not overflow; equalities themselves are never rewritten (that is
//! equality resolution's job).

use super::ConstraintTransform;
use crate::constraints::{BoolExpr, Constraint, IntExpr, ListExpr};

pub fn simplify_int(expr: &IntExpr) -> IntExpr {
    match expr {
        IntExpr::Var(_) | IntExpr::Literal(_) | IntExpr::Hole(_) => expr.clone(),
        IntExpr::Length(list) => IntExpr::length(simplify_list(list)),
        IntExpr::Element(k, list) => {
            let list = simplify_list(list);
            if let ListExpr::Literal(dims) = &list {
                let index = if *k >= 0 {
                    *k
                } else {
                    dims.len() as i64 + *k
                };
                if (0..dims.len() as i64).contains(&index) {
                    if let Some(dim) = &dims[index as usize] {
                        return dim.clone();
                    }
                }
            }
            IntExpr::element(*k, list)
        }
        IntExpr::Add(a, b) => {
            let a = simplify_int(a);
            let b = simplify_int(b);
            match (&a, &b) {
                (IntExpr::Literal(x), IntExpr::Literal(y)) => {
                    if let Some(sum) = x.checked_add(*y) {
                        return IntExpr::Literal(sum);
                    }
                    IntExpr::add(a, b)
                }
                (IntExpr::Literal(0), _) => b,
                (_, IntExpr::Literal(0)) => a,
                _ => IntExpr::add(a, b),
            }
        }
        IntExpr::Sub(a, b) => {
            let a = simplify_int(a);
            let b = simplify_int(b);
            match (&a, &b) {
                (IntExpr::Literal(x), IntExpr::Literal(y)) => {
                    if let Some(difference) = x.checked_sub(*y) {
                        return IntExpr::Literal(difference);
                    }
                    IntExpr::sub(a, b)
                }
                (_, IntExpr::Literal(0)) => a,
                _ => IntExpr::sub(a, b),
            }
        }
        IntExpr::Mul(a, b) => {
            let a = simplify_int(a);
            let b = simplify_int(b);
            match (&a, &b) {
                (IntExpr::Literal(x), IntExpr::Literal(y)) => {
                    if let Some(product) = x.checked_mul(*y) {
                        return IntExpr::Literal(product);
                    }
                    IntExpr::mul(a, b)
                }
                (IntExpr::Literal(1), _) => b,
                (_, IntExpr::Literal(1)) => a,
                (IntExpr::Literal(0), _) | (_, IntExpr::Literal(0)) => IntExpr::Literal(0),
                _ => IntExpr::mul(a, b),
            }
        }
        IntExpr::Div(a, b) => {
            let a = simplify_int(a);
            let b = simplify_int(b);
            match (&a, &b) {
                // Truncating division; a zero divisor is left for the solver.
                (IntExpr::Literal(x), IntExpr::Literal(y)) if *y != 0 => {
                    if let Some(quotient) = x.checked_div(*y) {
                        return IntExpr::Literal(quotient);
                    }
                    IntExpr::div(a, b)
                }
                _ => IntExpr::div(a, b),
            }
        }
    }
}

pub fn simplify_list(expr: &ListExpr) -> ListExpr {
    match expr {
        ListExpr::Var(_) => expr.clone(),
        ListExpr::Literal(dims) => ListExpr::Literal(
            dims.iter()
                .map(|dim| dim.as_ref().map(simplify_int))
                .collect(),
        ),
        ListExpr::Broadcast(a, b) => {
            let a = simplify_list(a);
            let b = simplify_list(b);
            if let (ListExpr::Literal(x), ListExpr::Literal(y)) = (&a, &b) {
                if let Some(merged) = broadcast_literals(x, y) {
                    return ListExpr::Literal(merged);
                }
            }
            ListExpr::broadcast(a, b)
        }
    }
}

/// Merge two shape literals by the broadcast rules, right-aligned to rank
/// `max(|a|, |b|)`.
///
/// Returns `None` when the merge cannot be decided: two known, unequal,
/// non-unit dimensions (unsatisfiable; the downstream solver reports it
/// against the original term) or two distinct symbolic dimensions. In both
/// cases the broadcast is left as written, preserving every known dimension
/// of both sides.
fn broadcast_literals(
    a: &[Option<IntExpr>],
    b: &[Option<IntExpr>],
) -> Option<Vec<Option<IntExpr>>> {
    let rank = a.len().max(b.len());
    let mut merged = vec![None; rank];
    for offset in 1..=rank {
        let x = (offset <= a.len()).then(|| &a[a.len() - offset]);
        let y = (offset <= b.len()).then(|| &b[b.len() - offset]);
        let slot = match (x, y) {
            (Some(slot), None) | (None, Some(slot)) => slot.clone(),
            (Some(x), Some(y)) => merge_dimension(x, y)?,
            (None, None) => unreachable!("offset bounded by the longer rank"),
        };
        merged[rank - offset] = slot;
    }
    Some(merged)
}

fn merge_dimension(x: &Option<IntExpr>, y: &Option<IntExpr>) -> Option<Option<IntExpr>> {
    match (x, y) {
        (Some(IntExpr::Literal(1)), other) | (other, Some(IntExpr::Literal(1))) => {
            Some(other.clone())
        }
        (Some(IntExpr::Literal(m)), Some(IntExpr::Literal(n))) => {
            if m == n {
                Some(Some(IntExpr::Literal(*m)))
            } else {
                // Unsatisfiable pair: keep the broadcast as written.
                None
            }
        }
        (Some(x), Some(y)) => {
            if x == y {
                Some(Some(x.clone()))
            } else {
                // Two distinct symbolic dimensions: undecidable here.
                None
            }
        }
        (Some(known), None) | (None, Some(known)) => Some(Some(known.clone())),
        (None, None) => Some(None),
    }
}

pub fn simplify_bool(expr: &BoolExpr) -> BoolExpr {
    match expr {
        BoolExpr::True | BoolExpr::False | BoolExpr::Var(_) => expr.clone(),
        BoolExpr::Not(inner) => simplify_bool(inner).negated(),
        BoolExpr::And(items) => BoolExpr::conjunction(items.iter().map(simplify_bool)),
        BoolExpr::Or(items) => BoolExpr::disjunction(items.iter().map(simplify_bool)),
        BoolExpr::IntEq(a, b) => BoolExpr::int_eq(simplify_int(a), simplify_int(b)),
        BoolExpr::IntGt(a, b) => BoolExpr::int_gt(simplify_int(a), simplify_int(b)),
        BoolExpr::IntGe(a, b) => BoolExpr::int_ge(simplify_int(a), simplify_int(b)),
        BoolExpr::IntLt(a, b) => BoolExpr::int_lt(simplify_int(a), simplify_int(b)),
        BoolExpr::IntLe(a, b) => BoolExpr::int_le(simplify_int(a), simplify_int(b)),
        BoolExpr::ListEq(a, b) => BoolExpr::list_eq(simplify_list(a), simplify_list(b)),
        BoolExpr::BoolEq(a, b) => BoolExpr::bool_eq(simplify_bool(a), simplify_bool(b)),
    }
}

pub fn simplify_constraint(constraint: &Constraint) -> Constraint {
    Constraint {
        expr: simplify_bool(&constraint.expr),
        assuming: simplify_bool(&constraint.assuming),
        origin: constraint.origin,
        stack: constraint.stack.clone(),
    }
}

/// Pass applying the algebraic rules to every constraint.
#[derive(Debug, Default)]
pub struct Simplify;

impl ConstraintTransform for Simplify {
    fn name(&self) -> &str {
        "simplify"
    }

    fn apply(&self, constraints: Vec<Constraint>) -> Vec<Constraint> {
        constraints.iter().map(simplify_constraint).collect()
    }
}
