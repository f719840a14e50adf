//! Stable-order structural deduplication.

use super::ConstraintTransform;
use crate::constraints::Constraint;
use std::collections::HashSet;

/// Keep the first occurrence of each structurally equal constraint.
#[derive(Debug, Default)]
pub struct Deduplicate;

impl ConstraintTransform for Deduplicate {
    fn name(&self) -> &str {
        "deduplicate"
    }

    fn apply(&self, constraints: Vec<Constraint>) -> Vec<Constraint> {
        let mut seen = HashSet::new();
        constraints
            .into_iter()
            .filter(|constraint| seen.insert(constraint.clone()))
            .collect()
    }
}
