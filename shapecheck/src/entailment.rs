//! Cheap syntactic implication checks on boolean terms.

use crate::constraints::BoolExpr;

/// Whether `a` provably implies `b` by syntactic rules alone.
///
/// Sound but deliberately incomplete: no distribution and no negation
/// reasoning, worst-case quadratic in term size. Consumers must tolerate
/// false negatives.
pub fn entails(a: &BoolExpr, b: &BoolExpr) -> bool {
    if matches!(b, BoolExpr::True) || matches!(a, BoolExpr::False) {
        return true;
    }
    if a == b {
        return true;
    }
    // a implies a conjunction iff it implies every conjunct.
    if let BoolExpr::And(items) = b {
        return items.iter().all(|item| entails(a, item));
    }
    // A conjunction implies b if some conjunct does.
    if let BoolExpr::And(items) = a {
        if items.iter().any(|item| entails(item, b)) {
            return true;
        }
    }
    // A disjunction implies b iff every disjunct does.
    if let BoolExpr::Or(items) = a {
        return items.iter().all(|item| entails(item, b));
    }
    // a implies a disjunction if it implies some disjunct.
    if let BoolExpr::Or(items) = b {
        if items.iter().any(|item| entails(a, item)) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{BoolVar, IntExpr, IntVar};

    fn b(n: u64) -> BoolExpr {
        BoolExpr::Var(BoolVar(n))
    }

    fn gt(n: u64, value: i64) -> BoolExpr {
        BoolExpr::int_gt(IntExpr::Var(IntVar(n)), IntExpr::Literal(value))
    }

    #[test]
    fn test_literal_rules() {
        assert!(entails(&b(0), &BoolExpr::True));
        assert!(entails(&BoolExpr::False, &b(0)));
        assert!(entails(&gt(0, 2), &gt(0, 2)));
        assert!(!entails(&gt(0, 2), &gt(0, 1)));
    }

    #[test]
    fn test_conjunction_rules() {
        let both = BoolExpr::And(vec![gt(0, 2), b(1)]);
        assert!(entails(&both, &gt(0, 2)));
        assert!(entails(&both, &b(1)));
        assert!(!entails(&gt(0, 2), &both));
        assert!(entails(&both, &BoolExpr::And(vec![b(1), gt(0, 2)])));
    }

    #[test]
    fn test_disjunction_rules() {
        let either = BoolExpr::Or(vec![gt(0, 2), b(1)]);
        assert!(entails(&gt(0, 2), &either));
        assert!(!entails(&either, &gt(0, 2)));
        assert!(entails(&BoolExpr::Or(vec![b(1), b(1)]), &b(1)));
    }

    #[test]
    fn test_mixed_and_or() {
        // (x and y) => (x or z) via the x disjunct.
        let lhs = BoolExpr::And(vec![b(0), b(1)]);
        let rhs = BoolExpr::Or(vec![b(0), b(2)]);
        assert!(entails(&lhs, &rhs));

        // No distributive reasoning: (x or y) and (x or z) !=> x or (y and z)
        // is beyond the oracle even when true propositionally.
        let undecided = BoolExpr::And(vec![
            BoolExpr::Or(vec![b(0), b(1)]),
            BoolExpr::Or(vec![b(0), b(2)]),
        ]);
        let target = BoolExpr::Or(vec![b(0), BoolExpr::And(vec![b(1), b(2)])]);
        assert!(!entails(&undecided, &target));
    }
}
