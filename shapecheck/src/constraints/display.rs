//! Infix rendering of terms and constraints.
//!
//! The textual form doubles as the stable sort key for path-condition
//! folding, so changes here are observable in `summarize` output order and
//! are locked by snapshot tests.

use super::constraint::{Constraint, ConstraintOrigin, RawConstraint};
use super::terms::{BoolExpr, BoolVar, Expr, IntExpr, IntVar, ListExpr, ListVar};
use std::fmt;

impl fmt::Display for IntVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

impl fmt::Display for ListVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl fmt::Display for BoolVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

impl fmt::Display for IntExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntExpr::Var(v) => write!(f, "{}", v),
            IntExpr::Literal(n) => write!(f, "{}", n),
            IntExpr::Hole(loc) => write!(f, "hole({})", loc),
            IntExpr::Length(list) => write!(f, "rank({})", list),
            IntExpr::Element(k, list) => write!(f, "{}[{}]", list, k),
            IntExpr::Add(a, b) => write!(f, "({} + {})", a, b),
            IntExpr::Sub(a, b) => write!(f, "({} - {})", a, b),
            IntExpr::Mul(a, b) => write!(f, "({} * {})", a, b),
            IntExpr::Div(a, b) => write!(f, "({} / {})", a, b),
        }
    }
}

impl fmt::Display for ListExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListExpr::Var(v) => write!(f, "{}", v),
            ListExpr::Literal(dims) => {
                write!(f, "[")?;
                for (i, dim) in dims.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match dim {
                        Some(d) => write!(f, "{}", d)?,
                        None => write!(f, "*")?,
                    }
                }
                write!(f, "]")
            }
            ListExpr::Broadcast(a, b) => write!(f, "broadcast({}, {})", a, b),
        }
    }
}

impl fmt::Display for BoolExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolExpr::True => write!(f, "true"),
            BoolExpr::False => write!(f, "false"),
            BoolExpr::Var(v) => write!(f, "{}", v),
            BoolExpr::Not(inner) => write!(f, "!({})", inner),
            BoolExpr::And(items) => write_joined(f, items, " and "),
            BoolExpr::Or(items) => write_joined(f, items, " or "),
            BoolExpr::IntEq(a, b) => write!(f, "({} = {})", a, b),
            BoolExpr::IntGt(a, b) => write!(f, "({} > {})", a, b),
            BoolExpr::IntGe(a, b) => write!(f, "({} >= {})", a, b),
            BoolExpr::IntLt(a, b) => write!(f, "({} < {})", a, b),
            BoolExpr::IntLe(a, b) => write!(f, "({} <= {})", a, b),
            BoolExpr::ListEq(a, b) => write!(f, "({} = {})", a, b),
            BoolExpr::BoolEq(a, b) => write!(f, "({} = {})", a, b),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[BoolExpr], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, ")")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(e) => write!(f, "{}", e),
            Expr::List(e) => write!(f, "{}", e),
            Expr::Bool(e) => write!(f, "{}", e),
            Expr::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Some(e) => write!(f, "{}", e)?,
                        None => write!(f, "_")?,
                    }
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for ConstraintOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintOrigin::Asserted => write!(f, "asserted"),
            ConstraintOrigin::Implied => write!(f, "implied"),
        }
    }
}

impl fmt::Display for RawConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawConstraint::Expr {
                expr, assuming, ..
            } => write_guarded(f, expr, assuming),
            RawConstraint::Call {
                callee,
                args,
                result,
                assuming,
                ..
            } => {
                if let Some(result) = result {
                    write!(f, "{} = ", result)?;
                }
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match arg {
                        Some(e) => write!(f, "{}", e)?,
                        None => write!(f, "_")?,
                    }
                }
                write!(f, ")")?;
                if *assuming != BoolExpr::True {
                    write!(f, " when {}", assuming)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_guarded(f, &self.expr, &self.assuming)
    }
}

fn write_guarded(f: &mut fmt::Formatter<'_>, expr: &BoolExpr, assuming: &BoolExpr) -> fmt::Result {
    write!(f, "{}", expr)?;
    if *assuming != BoolExpr::True {
        write!(f, " when {}", assuming)?;
    }
    Ok(())
}
