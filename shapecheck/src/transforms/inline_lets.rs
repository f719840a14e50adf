//! Integer let-binding inlining.
//!
//! Collapses chains such as `d0 = 2 + 3; d1 = d0 * d0; s0[0] = d1` into
//! `s0[0] = 25` by substituting unconditional integer definitions into
//! everything after them. This is not a full SSA copy propagation: a
//! definition whose variable was already used earlier in the list, or whose
//! right-hand side mentions the variable itself, stays where it is.

use super::simplify::simplify_constraint;
use super::ConstraintTransform;
use crate::constraints::{BoolExpr, Constraint, IntExpr, IntVar, Substitution, VarSet};
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct InlineLets;

impl ConstraintTransform for InlineLets {
    fn name(&self) -> &str {
        "inline"
    }

    fn apply(&self, constraints: Vec<Constraint>) -> Vec<Constraint> {
        let mut substitution = Substitution::new();
        let mut used: HashSet<IntVar> = HashSet::new();
        let mut kept = Vec::with_capacity(constraints.len());

        for constraint in &constraints {
            let rewritten = simplify_constraint(&constraint.substituted(&substitution));

            if let Some((var, rhs)) = as_int_definition(&rewritten) {
                let mut rhs_vars = VarSet::default();
                rhs.collect_vars(&mut rhs_vars);
                let usable = !used.contains(&var) && !rhs_vars.ints.contains(&var);
                if usable {
                    let mut step = Substitution::new();
                    step.bind_int(var, rhs.clone());
                    substitution = substitution.compose(&step);
                    continue;
                }
            }

            let mut vars = VarSet::default();
            rewritten.collect_vars(&mut vars);
            used.extend(vars.ints);
            kept.push(rewritten);
        }
        kept
    }
}

/// An unconditional `var = rhs` integer equality is a definition candidate.
fn as_int_definition(constraint: &Constraint) -> Option<(IntVar, &IntExpr)> {
    if constraint.assuming != BoolExpr::True {
        return None;
    }
    match &constraint.expr {
        BoolExpr::IntEq(lhs, rhs) => match lhs.as_ref() {
            IntExpr::Var(var) => Some((*var, rhs)),
            _ => None,
        },
        _ => None,
    }
}
