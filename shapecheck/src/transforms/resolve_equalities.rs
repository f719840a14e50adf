//! Equality resolution: union-find over variables.
//!
//! One scan consumes every unconditional `var = var` equality admitted by
//! the strength filter, uniting the two variables' classes with the
//! earlier-seen (left-hand) side as representative. The resulting
//! substitution then rewrites every surviving constraint. Equalities that
//! cannot be oriented (neither side a lone variable) are kept.

use super::ConstraintTransform;
use crate::constraints::{
    BoolExpr, Constraint, ConstraintOrigin, IntExpr, IntVar, ListExpr, ListVar, Substitution,
};
use std::collections::HashMap;
use std::hash::Hash;

/// Which equalities a resolution pass may consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionStrength {
    /// List-variable equalities only.
    Shape,
    /// Equalities the interpreter implied itself, of any sort.
    Implied,
    /// Every variable-variable equality, asserted ones included.
    Everything,
    /// Union of several strengths.
    All(Vec<ResolutionStrength>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EqualityKind {
    Int,
    List,
}

impl ResolutionStrength {
    fn admits(&self, origin: ConstraintOrigin, kind: EqualityKind) -> bool {
        match self {
            ResolutionStrength::Shape => kind == EqualityKind::List,
            ResolutionStrength::Implied => origin == ConstraintOrigin::Implied,
            ResolutionStrength::Everything => true,
            ResolutionStrength::All(items) => {
                items.iter().any(|strength| strength.admits(origin, kind))
            }
        }
    }
}

#[derive(Debug)]
pub struct ResolveEqualities {
    strength: ResolutionStrength,
}

impl ResolveEqualities {
    pub fn new(strength: ResolutionStrength) -> Self {
        Self { strength }
    }
}

impl ConstraintTransform for ResolveEqualities {
    fn name(&self) -> &str {
        "resolve_equalities"
    }

    fn apply(&self, constraints: Vec<Constraint>) -> Vec<Constraint> {
        let mut ints: UnionFind<IntVar> = UnionFind::new();
        let mut lists: UnionFind<ListVar> = UnionFind::new();
        let mut consumed = vec![false; constraints.len()];

        for (index, constraint) in constraints.iter().enumerate() {
            if constraint.assuming != BoolExpr::True {
                continue;
            }
            match &constraint.expr {
                BoolExpr::IntEq(lhs, rhs) => {
                    if let (IntExpr::Var(a), IntExpr::Var(b)) = (lhs.as_ref(), rhs.as_ref()) {
                        if self.strength.admits(constraint.origin, EqualityKind::Int) {
                            ints.union(*a, *b);
                            consumed[index] = true;
                        }
                    }
                }
                BoolExpr::ListEq(lhs, rhs) => {
                    if let (ListExpr::Var(a), ListExpr::Var(b)) = (lhs.as_ref(), rhs.as_ref()) {
                        if self.strength.admits(constraint.origin, EqualityKind::List) {
                            lists.union(*a, *b);
                            consumed[index] = true;
                        }
                    }
                }
                _ => {}
            }
        }

        let mut substitution = Substitution::new();
        for (var, representative) in ints.bindings() {
            substitution.bind_int(var, IntExpr::Var(representative));
        }
        for (var, representative) in lists.bindings() {
            substitution.bind_list(var, ListExpr::Var(representative));
        }

        constraints
            .into_iter()
            .zip(consumed)
            .filter(|(_, consumed)| !consumed)
            .map(|(constraint, _)| constraint.substituted(&substitution))
            .collect()
    }
}

/// Minimal union-find; the representative of a merged class is the
/// earlier-seen left-hand side.
#[derive(Debug)]
struct UnionFind<T> {
    parent: HashMap<T, T>,
}

impl<T: Copy + Eq + Hash> UnionFind<T> {
    fn new() -> Self {
        Self {
            parent: HashMap::new(),
        }
    }

    fn find(&self, mut node: T) -> T {
        while let Some(&parent) = self.parent.get(&node) {
            node = parent;
        }
        node
    }

    fn union(&mut self, lhs: T, rhs: T) {
        let lhs_root = self.find(lhs);
        let rhs_root = self.find(rhs);
        if lhs_root != rhs_root {
            self.parent.insert(rhs_root, lhs_root);
        }
    }

    /// Every non-representative variable paired with its class
    /// representative.
    fn bindings(&self) -> Vec<(T, T)> {
        self.parent
            .keys()
            .map(|&node| (node, self.find(node)))
            .collect()
    }
}
