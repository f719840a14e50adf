//! Summary inlining: raw constraints into final constraints.
//!
//! Every call-form constraint is replaced by the callee's summary with all
//! variables freshened, arguments and result equated positionally, the call
//! site's assumption conjoined onto everything inlined, and call stacks
//! extended with the call site. Callees without a summary stay opaque.

use crate::constraints::{
    BoolExpr, CallStack, Constraint, ConstraintOrigin, Expr, FunctionSummary, RawConstraint,
    Substitution, VarSet, VarSupply,
};
use std::collections::HashMap;
use thiserror::Error;

/// Failure while expanding call-form constraints.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InlineError {
    /// The summary graph has a cycle through this function; recursive calls
    /// are not supported.
    #[error("recursive call to {function} cannot be inlined")]
    RecursiveCall { function: String },
}

/// Expand every call-form constraint of `summary` transitively against a
/// map of callee summaries.
pub fn inline_calls(
    summary: &FunctionSummary,
    summaries: &HashMap<String, FunctionSummary>,
) -> Result<Vec<Constraint>, InlineError> {
    CallInliner::new(summaries).expand(summary)
}

/// Inliner holding the summary map and a variable supply numbered above
/// everything the summaries mention, so freshened callee variables can never
/// collide with caller variables.
#[derive(Debug)]
pub struct CallInliner<'a> {
    summaries: &'a HashMap<String, FunctionSummary>,
    supply: VarSupply,
}

impl<'a> CallInliner<'a> {
    pub fn new(summaries: &'a HashMap<String, FunctionSummary>) -> Self {
        let mut vars = VarSet::default();
        for summary in summaries.values() {
            summary.collect_vars(&mut vars);
        }
        let mut supply = VarSupply::new();
        if let Some(max) = vars.max_id() {
            supply.reserve_above(max);
        }
        Self { summaries, supply }
    }

    pub fn expand(&mut self, summary: &FunctionSummary) -> Result<Vec<Constraint>, InlineError> {
        // The summary being expanded may not be in the map; its variables
        // must stay distinct from freshened callee variables too.
        let mut vars = VarSet::default();
        summary.collect_vars(&mut vars);
        if let Some(max) = vars.max_id() {
            self.supply.reserve_above(max);
        }

        let mut visiting = Vec::new();
        let mut out = Vec::new();
        for constraint in &summary.constraints {
            self.expand_raw(constraint, &mut visiting, &mut out)?;
        }
        Ok(out)
    }

    fn expand_raw(
        &mut self,
        constraint: &RawConstraint,
        visiting: &mut Vec<String>,
        out: &mut Vec<Constraint>,
    ) -> Result<(), InlineError> {
        match constraint {
            RawConstraint::Expr {
                expr,
                assuming,
                origin,
                location,
            } => {
                out.push(Constraint {
                    expr: expr.clone(),
                    assuming: assuming.clone(),
                    origin: *origin,
                    stack: CallStack::root(location.clone()),
                });
            }
            RawConstraint::Call {
                callee,
                args,
                result,
                assuming,
                location,
            } => {
                if visiting.iter().any(|name| name == callee) {
                    return Err(InlineError::RecursiveCall {
                        function: callee.clone(),
                    });
                }
                let Some(callee_summary) = self.summaries.get(callee) else {
                    // No summary: the callee stays opaque.
                    return Ok(());
                };

                let mut vars = VarSet::default();
                callee_summary.collect_vars(&mut vars);
                let renaming = Substitution::freshening(&vars, &mut self.supply);
                let renamed = callee_summary.substituted(&renaming);

                if args.len() != renamed.arg_exprs.len() {
                    panic!(
                        "call to {} passes {} arguments for {} parameters",
                        callee,
                        args.len(),
                        renamed.arg_exprs.len()
                    );
                }
                let stack = CallStack::root(location.clone());
                for (actual, formal) in args.iter().zip(&renamed.arg_exprs) {
                    if let (Some(actual), Some(formal)) = (actual, formal) {
                        equate_into(actual, formal, assuming, &stack, out);
                    }
                }
                if let (Some(result), Some(ret)) = (result, &renamed.ret_expr) {
                    equate_into(result, ret, assuming, &stack, out);
                }

                visiting.push(callee.clone());
                let mut inlined = Vec::new();
                for inner in &renamed.constraints {
                    self.expand_raw(inner, visiting, &mut inlined)?;
                }
                visiting.pop();

                for inner in inlined {
                    out.push(Constraint {
                        expr: inner.expr,
                        assuming: BoolExpr::conjunction([assuming.clone(), inner.assuming]),
                        origin: inner.origin,
                        stack: inner.stack.pushed(location.clone()),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Equate two boundary expressions, pushing implied constraints.
///
/// # Panics
///
/// Panics on sort mismatches and tuple-arity mismatches; the caller and
/// callee summaries disagree structurally, which is an IR inconsistency.
fn equate_into(
    a: &Expr,
    b: &Expr,
    assuming: &BoolExpr,
    stack: &CallStack,
    out: &mut Vec<Constraint>,
) {
    let push = |expr: BoolExpr, out: &mut Vec<Constraint>| {
        out.push(Constraint {
            expr,
            assuming: assuming.clone(),
            origin: ConstraintOrigin::Implied,
            stack: stack.clone(),
        });
    };
    match (a, b) {
        (Expr::Int(x), Expr::Int(y)) => push(BoolExpr::int_eq(x.clone(), y.clone()), out),
        (Expr::List(x), Expr::List(y)) => push(BoolExpr::list_eq(x.clone(), y.clone()), out),
        (Expr::Bool(x), Expr::Bool(y)) => push(BoolExpr::bool_eq(x.clone(), y.clone()), out),
        (Expr::Tuple(xs), Expr::Tuple(ys)) => {
            if xs.len() != ys.len() {
                panic!("cannot equate tuples of different arity: {} vs {}", a, b);
            }
            for (x, y) in xs.iter().zip(ys) {
                if let (Some(x), Some(y)) = (x, y) {
                    equate_into(x, y, assuming, stack, out);
                }
            }
        }
        _ => panic!("cannot equate expressions of different sorts: {} vs {}", a, b),
    }
}
