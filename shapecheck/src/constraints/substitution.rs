//! Sort-preserving structural substitution.
//!
//! One substitution carries three maps, one per variable namespace, so a
//! lookup can never answer with a term of the wrong sort. Application
//! rebuilds terms bottom-up; compound booleans go back through the smart
//! constructors so literals introduced by a binding cannot survive inside an
//! `and`/`or`.

use super::terms::{BoolExpr, BoolVar, Expr, IntExpr, IntVar, ListExpr, ListVar, VarSet, VarSupply};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Substitution {
    ints: HashMap<IntVar, IntExpr>,
    lists: HashMap<ListVar, ListExpr>,
    bools: HashMap<BoolVar, BoolExpr>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ints.is_empty() && self.lists.is_empty() && self.bools.is_empty()
    }

    pub fn bind_int(&mut self, var: IntVar, expr: IntExpr) {
        self.ints.insert(var, expr);
    }

    pub fn bind_list(&mut self, var: ListVar, expr: ListExpr) {
        self.lists.insert(var, expr);
    }

    pub fn bind_bool(&mut self, var: BoolVar, expr: BoolExpr) {
        self.bools.insert(var, expr);
    }

    pub fn int_binding(&self, var: IntVar) -> Option<&IntExpr> {
        self.ints.get(&var)
    }

    pub fn list_binding(&self, var: ListVar) -> Option<&ListExpr> {
        self.lists.get(&var)
    }

    pub fn bool_binding(&self, var: BoolVar) -> Option<&BoolExpr> {
        self.bools.get(&var)
    }

    pub fn apply_int(&self, expr: &IntExpr) -> IntExpr {
        match expr {
            IntExpr::Var(v) => self
                .ints
                .get(v)
                .cloned()
                .unwrap_or_else(|| expr.clone()),
            IntExpr::Literal(_) | IntExpr::Hole(_) => expr.clone(),
            IntExpr::Length(list) => IntExpr::length(self.apply_list(list)),
            IntExpr::Element(k, list) => IntExpr::element(*k, self.apply_list(list)),
            IntExpr::Add(a, b) => IntExpr::add(self.apply_int(a), self.apply_int(b)),
            IntExpr::Sub(a, b) => IntExpr::sub(self.apply_int(a), self.apply_int(b)),
            IntExpr::Mul(a, b) => IntExpr::mul(self.apply_int(a), self.apply_int(b)),
            IntExpr::Div(a, b) => IntExpr::div(self.apply_int(a), self.apply_int(b)),
        }
    }

    pub fn apply_list(&self, expr: &ListExpr) -> ListExpr {
        match expr {
            ListExpr::Var(v) => self
                .lists
                .get(v)
                .cloned()
                .unwrap_or_else(|| expr.clone()),
            ListExpr::Literal(dims) => ListExpr::Literal(
                dims.iter()
                    .map(|dim| dim.as_ref().map(|d| self.apply_int(d)))
                    .collect(),
            ),
            ListExpr::Broadcast(a, b) => {
                ListExpr::broadcast(self.apply_list(a), self.apply_list(b))
            }
        }
    }

    pub fn apply_bool(&self, expr: &BoolExpr) -> BoolExpr {
        match expr {
            BoolExpr::True | BoolExpr::False => expr.clone(),
            BoolExpr::Var(v) => self
                .bools
                .get(v)
                .cloned()
                .unwrap_or_else(|| expr.clone()),
            BoolExpr::Not(inner) => self.apply_bool(inner).negated(),
            BoolExpr::And(items) => {
                BoolExpr::conjunction(items.iter().map(|item| self.apply_bool(item)))
            }
            BoolExpr::Or(items) => {
                BoolExpr::disjunction(items.iter().map(|item| self.apply_bool(item)))
            }
            BoolExpr::IntEq(a, b) => BoolExpr::int_eq(self.apply_int(a), self.apply_int(b)),
            BoolExpr::IntGt(a, b) => BoolExpr::int_gt(self.apply_int(a), self.apply_int(b)),
            BoolExpr::IntGe(a, b) => BoolExpr::int_ge(self.apply_int(a), self.apply_int(b)),
            BoolExpr::IntLt(a, b) => BoolExpr::int_lt(self.apply_int(a), self.apply_int(b)),
            BoolExpr::IntLe(a, b) => BoolExpr::int_le(self.apply_int(a), self.apply_int(b)),
            BoolExpr::ListEq(a, b) => BoolExpr::list_eq(self.apply_list(a), self.apply_list(b)),
            BoolExpr::BoolEq(a, b) => BoolExpr::bool_eq(self.apply_bool(a), self.apply_bool(b)),
        }
    }

    pub fn apply_expr(&self, expr: &Expr) -> Expr {
        match expr {
            Expr::Int(e) => Expr::Int(self.apply_int(e)),
            Expr::List(e) => Expr::List(self.apply_list(e)),
            Expr::Bool(e) => Expr::Bool(self.apply_bool(e)),
            Expr::Tuple(items) => Expr::Tuple(
                items
                    .iter()
                    .map(|item| item.as_ref().map(|e| self.apply_expr(e)))
                    .collect(),
            ),
        }
    }

    /// Substitution renaming every variable in `vars` to a fresh one of the
    /// same sort. Used when a callee summary is inlined into a caller.
    pub fn freshening(vars: &VarSet, supply: &mut VarSupply) -> Substitution {
        let mut result = Substitution::new();
        let mut ints: Vec<_> = vars.ints.iter().copied().collect();
        ints.sort_unstable();
        for var in ints {
            let fresh = supply.fresh_int();
            result.bind_int(var, IntExpr::Var(fresh));
        }
        let mut lists: Vec<_> = vars.lists.iter().copied().collect();
        lists.sort_unstable();
        for var in lists {
            let fresh = supply.fresh_list();
            result.bind_list(var, ListExpr::Var(fresh));
        }
        let mut bools: Vec<_> = vars.bools.iter().copied().collect();
        bools.sort_unstable();
        for var in bools {
            let fresh = supply.fresh_bool();
            result.bind_bool(var, BoolExpr::Var(fresh));
        }
        result
    }

    /// Term composition: `t.apply(self.compose(other)) == other.apply(self.apply(t))`
    /// for every term `t`.
    pub fn compose(&self, other: &Substitution) -> Substitution {
        let mut result = Substitution::new();
        for (var, expr) in &self.ints {
            result.ints.insert(*var, other.apply_int(expr));
        }
        for (var, expr) in &self.lists {
            result.lists.insert(*var, other.apply_list(expr));
        }
        for (var, expr) in &self.bools {
            result.bools.insert(*var, other.apply_bool(expr));
        }
        for (var, expr) in &other.ints {
            result.ints.entry(*var).or_insert_with(|| expr.clone());
        }
        for (var, expr) in &other.lists {
            result.lists.entry(*var).or_insert_with(|| expr.clone());
        }
        for (var, expr) in &other.bools {
            result.bools.entry(*var).or_insert_with(|| expr.clone());
        }
        result
    }
}
