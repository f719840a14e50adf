//! Boolean-variable inlining.
//!
//! An asserted boolean variable with exactly one definition and no other
//! occurrence collapses into its definition: `{b0; b0 = (d0 > 2)}` becomes
//! `{d0 > 2}`. Anything more entangled (chained variables, extra uses) is
//! refused rather than risked.

use super::ConstraintTransform;
use crate::constraints::{BoolExpr, BoolVar, Constraint, VarSet};

#[derive(Debug, Default)]
pub struct InlineBoolVars;

impl ConstraintTransform for InlineBoolVars {
    fn name(&self) -> &str {
        "inline_bool_vars"
    }

    fn apply(&self, constraints: Vec<Constraint>) -> Vec<Constraint> {
        let mut constraints = constraints;
        // Each application removes one definition, so this terminates.
        while let Some((assertion, definition, replacement)) = find_collapsible(&constraints) {
            constraints[assertion].expr = replacement;
            constraints.remove(definition);
        }
        constraints
    }
}

/// Find an asserted top-level boolean variable with exactly one
/// `boolEq(var, rhs)` definition and no other occurrence anywhere in the
/// list. Returns the assertion index, definition index, and the definition's
/// right-hand side.
fn find_collapsible(constraints: &[Constraint]) -> Option<(usize, usize, BoolExpr)> {
    for (assertion, constraint) in constraints.iter().enumerate() {
        let var = match &constraint.expr {
            BoolExpr::Var(var) if constraint.assuming == BoolExpr::True => *var,
            _ => continue,
        };

        let definitions: Vec<usize> = constraints
            .iter()
            .enumerate()
            .filter_map(|(index, candidate)| is_definition_of(candidate, var).then_some(index))
            .collect();
        let [definition] = definitions.as_slice() else {
            continue;
        };

        let rhs = definition_rhs(&constraints[*definition]);
        if rhs.free_vars().bools.contains(&var) {
            continue;
        }
        let elsewhere = constraints.iter().enumerate().any(|(index, candidate)| {
            index != assertion && index != *definition && mentions(candidate, var)
        });
        if elsewhere {
            continue;
        }

        return Some((assertion, *definition, rhs.clone()));
    }
    None
}

fn is_definition_of(constraint: &Constraint, var: BoolVar) -> bool {
    if constraint.assuming != BoolExpr::True {
        return false;
    }
    matches!(
        &constraint.expr,
        BoolExpr::BoolEq(lhs, _) if **lhs == BoolExpr::Var(var)
    )
}

fn definition_rhs(constraint: &Constraint) -> &BoolExpr {
    match &constraint.expr {
        BoolExpr::BoolEq(_, rhs) => rhs,
        _ => unreachable!("checked by is_definition_of"),
    }
}

fn mentions(constraint: &Constraint, var: BoolVar) -> bool {
    let mut vars = VarSet::default();
    constraint.collect_vars(&mut vars);
    vars.bools.contains(&var)
}
