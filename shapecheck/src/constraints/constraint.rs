//! Constraints and per-function summaries.
//!
//! The interpreter produces [`RawConstraint`]s, which may still reference
//! other functions by name through the `Call` form. Summary inlining expands
//! those into [`Constraint`]s, each carrying the [`CallStack`] of inlined
//! call sites instead of a single location.

use super::substitution::Substitution;
use super::terms::{BoolExpr, Expr, VarSet};
use crate::loc::SourceLocation;
use std::fmt;

/// Who demanded a constraint.
///
/// `Asserted` marks user-written `assert` calls: the user's contract, which
/// transforms must preserve. `Implied` marks everything the interpreter
/// derived itself, which transforms are free to rewrite or drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintOrigin {
    Asserted,
    Implied,
}

/// Constraint as emitted by the abstract interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawConstraint {
    /// `expr` must hold whenever the path condition `assuming` holds.
    Expr {
        expr: BoolExpr,
        assuming: BoolExpr,
        origin: ConstraintOrigin,
        location: Option<SourceLocation>,
    },
    /// An unresolved call site: stands for the callee's constraints with
    /// arguments and return substituted.
    Call {
        callee: String,
        args: Vec<Option<Expr>>,
        result: Option<Expr>,
        assuming: BoolExpr,
        location: Option<SourceLocation>,
    },
}

impl RawConstraint {
    pub fn substituted(&self, sub: &Substitution) -> RawConstraint {
        match self {
            RawConstraint::Expr {
                expr,
                assuming,
                origin,
                location,
            } => RawConstraint::Expr {
                expr: sub.apply_bool(expr),
                assuming: sub.apply_bool(assuming),
                origin: *origin,
                location: location.clone(),
            },
            RawConstraint::Call {
                callee,
                args,
                result,
                assuming,
                location,
            } => RawConstraint::Call {
                callee: callee.clone(),
                args: args
                    .iter()
                    .map(|arg| arg.as_ref().map(|e| sub.apply_expr(e)))
                    .collect(),
                result: result.as_ref().map(|e| sub.apply_expr(e)),
                assuming: sub.apply_bool(assuming),
                location: location.clone(),
            },
        }
    }

    pub fn collect_vars(&self, out: &mut VarSet) {
        match self {
            RawConstraint::Expr { expr, assuming, .. } => {
                expr.collect_vars(out);
                assuming.collect_vars(out);
            }
            RawConstraint::Call {
                args,
                result,
                assuming,
                ..
            } => {
                for arg in args.iter().flatten() {
                    arg.collect_vars(out);
                }
                if let Some(result) = result {
                    result.collect_vars(out);
                }
                assuming.collect_vars(out);
            }
        }
    }
}

/// Chain of inlined call sites, innermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CallStack {
    frames: Vec<Option<SourceLocation>>,
}

impl CallStack {
    /// Stack with a single frame: the site the constraint was emitted at.
    pub fn root(location: Option<SourceLocation>) -> Self {
        Self {
            frames: vec![location],
        }
    }

    /// Extend with an enclosing call site.
    pub fn pushed(&self, location: Option<SourceLocation>) -> Self {
        let mut frames = self.frames.clone();
        frames.push(location);
        Self { frames }
    }

    /// The site the constraint was emitted at, if known.
    pub fn innermost(&self) -> Option<&SourceLocation> {
        self.frames.first().and_then(|loc| loc.as_ref())
    }

    /// All frames, innermost first. `None` frames are call sites the parser
    /// had no debug information for.
    pub fn frames(&self) -> &[Option<SourceLocation>] {
        &self.frames
    }
}

impl fmt::Display for CallStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                write!(f, " <- ")?;
            }
            match frame {
                Some(loc) => write!(f, "{}", loc)?,
                None => write!(f, "?")?,
            }
        }
        Ok(())
    }
}

/// Fully resolved constraint: no call form, call stack attached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    pub expr: BoolExpr,
    pub assuming: BoolExpr,
    pub origin: ConstraintOrigin,
    pub stack: CallStack,
}

impl Constraint {
    pub fn substituted(&self, sub: &Substitution) -> Constraint {
        Constraint {
            expr: sub.apply_bool(&self.expr),
            assuming: sub.apply_bool(&self.assuming),
            origin: self.origin,
            stack: self.stack.clone(),
        }
    }

    pub fn is_asserted(&self) -> bool {
        self.origin == ConstraintOrigin::Asserted
    }

    pub fn collect_vars(&self, out: &mut VarSet) {
        self.expr.collect_vars(out);
        self.assuming.collect_vars(out);
    }
}

/// A function's abstracted signature: symbolic argument expressions, a
/// symbolic return expression, and the constraints relating them.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSummary {
    pub arg_exprs: Vec<Option<Expr>>,
    pub ret_expr: Option<Expr>,
    pub constraints: Vec<RawConstraint>,
}

impl FunctionSummary {
    pub fn collect_vars(&self, out: &mut VarSet) {
        for arg in self.arg_exprs.iter().flatten() {
            arg.collect_vars(out);
        }
        if let Some(ret) = &self.ret_expr {
            ret.collect_vars(out);
        }
        for constraint in &self.constraints {
            constraint.collect_vars(out);
        }
    }

    /// Summary with every variable renamed through `sub`.
    pub fn substituted(&self, sub: &Substitution) -> FunctionSummary {
        FunctionSummary {
            arg_exprs: self
                .arg_exprs
                .iter()
                .map(|arg| arg.as_ref().map(|e| sub.apply_expr(e)))
                .collect(),
            ret_expr: self.ret_expr.as_ref().map(|e| sub.apply_expr(e)),
            constraints: self
                .constraints
                .iter()
                .map(|c| c.substituted(sub))
                .collect(),
        }
    }
}
