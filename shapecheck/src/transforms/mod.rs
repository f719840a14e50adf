//! Constraint rewriting passes.
//!
//! Every transform is total and shape-preserving: it rewrites or drops what
//! the input already implied and never invents a constraint. Order matters;
//! let-binding inlining is directional and equality resolution feeds the
//! passes after it, so the pipeline runs the passes in a fixed order until
//! the list stops changing.
//!
//! # Module Organization
//!
//! - `simplify.rs`: algebraic simplification of terms
//! - `deduplicate.rs`: stable-order structural deduplication
//! - `inline_lets.rs`: integer let-binding inlining
//! - `resolve_equalities.rs`: union-find over variable equalities
//! - `bool_vars.rs`: boolean-variable inlining
//! - `tests.rs`: tests

mod bool_vars;
mod deduplicate;
mod inline_lets;
mod resolve_equalities;
mod simplify;

pub use bool_vars::InlineBoolVars;
pub use deduplicate::Deduplicate;
pub use inline_lets::InlineLets;
pub use resolve_equalities::{ResolutionStrength, ResolveEqualities};
pub use simplify::{simplify_bool, simplify_constraint, simplify_int, simplify_list, Simplify};

use crate::constraints::Constraint;

/// One rewriting pass over an ordered constraint list.
pub trait ConstraintTransform: std::fmt::Debug {
    /// Name of this transform.
    fn name(&self) -> &str;

    /// Rewrite the list. Must be idempotent and preserve asserted
    /// constraints modulo the equalities it has resolved.
    fn apply(&self, constraints: Vec<Constraint>) -> Vec<Constraint>;
}

/// Transform pipeline run to a fixpoint.
#[derive(Debug)]
pub struct TransformPipeline {
    passes: Vec<Box<dyn ConstraintTransform>>,
    max_iterations: usize,
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}

impl TransformPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            max_iterations: 10,
        }
    }

    /// The standard pass order. Equality resolution runs at implied strength
    /// so the user's asserted equalities stay visible to the solver.
    pub fn default_pipeline() -> Self {
        let mut pipeline = Self::new();
        pipeline.add_pass(Box::new(Simplify));
        pipeline.add_pass(Box::new(Deduplicate));
        pipeline.add_pass(Box::new(InlineLets));
        pipeline.add_pass(Box::new(ResolveEqualities::new(ResolutionStrength::Implied)));
        pipeline.add_pass(Box::new(InlineBoolVars));
        pipeline
    }

    /// Add a pass to the pipeline.
    pub fn add_pass(&mut self, pass: Box<dyn ConstraintTransform>) {
        self.passes.push(pass);
    }

    /// Set maximum fixpoint iterations.
    pub fn set_max_iterations(&mut self, max: usize) {
        self.max_iterations = max;
    }

    /// Run all passes repeatedly until the list stops changing.
    pub fn run(&self, constraints: Vec<Constraint>) -> Vec<Constraint> {
        let mut current = constraints;
        for _iteration in 0..self.max_iterations {
            let mut next = current.clone();
            for pass in &self.passes {
                next = pass.apply(next);
            }
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}
