//! CFG preprocessing contract and block ordering.
//!
//! Loop elimination lives in the front end; the checker only consumes its
//! contract. The default preprocessor accepts CFGs that are already acyclic
//! and leaves them untouched.

use crate::ir::Block;
use std::collections::{BTreeSet, HashMap};

/// Externally supplied CFG preprocessing.
///
/// `unloop` must return an acyclic graph whose semantics conservatively
/// over-approximate the original.
pub trait CfgPreprocessor {
    fn induces_reducible_cfg(&self, blocks: &[Block]) -> bool;
    fn unloop(&self, blocks: &[Block]) -> Vec<Block>;
}

/// Preprocessor accepting already-acyclic CFGs, with the identity unloop.
#[derive(Debug, Default)]
pub struct AcyclicPreprocessor;

impl CfgPreprocessor for AcyclicPreprocessor {
    fn induces_reducible_cfg(&self, blocks: &[Block]) -> bool {
        topological_order(blocks).is_some()
    }

    fn unloop(&self, blocks: &[Block]) -> Vec<Block> {
        blocks.to_vec()
    }
}

/// Topological order of block indices, or `None` if the graph is cyclic.
///
/// Ties are broken by original block index, so the order is deterministic.
///
/// # Panics
///
/// Panics if a terminator targets a label no block carries; that is an IR
/// inconsistency on the parser's side.
pub fn topological_order(blocks: &[Block]) -> Option<Vec<usize>> {
    let index_of: HashMap<&str, usize> = blocks
        .iter()
        .enumerate()
        .map(|(i, block)| (block.label.as_str(), i))
        .collect();

    let mut in_degree = vec![0usize; blocks.len()];
    let mut successors = vec![Vec::new(); blocks.len()];
    for (i, block) in blocks.iter().enumerate() {
        for label in block.terminator.successors() {
            let j = *index_of
                .get(label)
                .unwrap_or_else(|| panic!("terminator of {} targets unknown block {}", block.label, label));
            successors[i].push(j);
            in_degree[j] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| i)
        .collect();
    let mut order = Vec::with_capacity(blocks.len());
    while let Some(&next) = ready.iter().next() {
        ready.remove(&next);
        order.push(next);
        for &succ in &successors[next] {
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                ready.insert(succ);
            }
        }
    }

    (order.len() == blocks.len()).then_some(order)
}
