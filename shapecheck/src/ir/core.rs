//! Low-level SSA IR as handed over by the external parser.
//!
//! Contains register, operator, terminator, basic block, and function types.
//! The checker consumes these read-only; it understands the operators listed
//! here and leaves the results of anything else untracked.

use super::types::Type;
use crate::loc::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SSA register reference. The IR is in SSA form: one definition site each.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Register(pub String);

impl Register {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Operator variants the checker can encounter.
///
/// `Unknown` covers the remainder of the source instruction set; the parser
/// still reports result registers and types for those so the checker can
/// track them as opaque values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operator {
    /// Ownership no-op: result shares the operand's value.
    BeginBorrow { operand: Register },
    /// Ownership no-op: result shares the operand's value.
    CopyValue { operand: Register },
    /// Function-conversion no-op.
    ConvertFunction { operand: Register },
    /// Escape-analysis no-op.
    ConvertEscapeToNoescape { operand: Register },
    /// Calling-convention no-op.
    ThinToThickFunction { operand: Register },
    /// Lifetime pin: result shares `operand`'s value.
    MarkDependence { operand: Register, base: Register },
    IntegerLiteral { ty: Type, value: i64 },
    /// Array-literal builtin; tracked only when the element type is `Int`.
    ArrayLiteral { element: Type, elements: Vec<Register> },
    /// Builtin integer-literal comparison.
    LiteralEqual { lhs: Register, rhs: Register },
    FunctionRef { name: String },
    PartialApply {
        callee: Register,
        args: Vec<Register>,
        arg_types: Vec<Type>,
    },
    Struct { ty: String, operands: Vec<Register> },
    Tuple { operands: Vec<Register> },
    DestructureTuple { operand: Register },
    StructExtract {
        operand: Register,
        ty: String,
        field: String,
    },
    TupleExtract { operand: Register, index: usize },
    GlobalAddr { name: String },
    Load { operand: Register },
    Apply { callee: Register, args: Vec<Register> },
    /// Coroutine application; its results are the yields.
    BeginApply { callee: Register, args: Vec<Register> },
    EndApply { operand: Register },
    Unknown { name: String, operands: Vec<Register> },
}

/// One operator definition: typed results, the operator, and the source
/// position the parser attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorDef {
    pub results: Vec<(Register, Type)>,
    pub operator: Operator,
    pub source: Option<SourceLocation>,
}

impl OperatorDef {
    pub fn new(results: Vec<(Register, Type)>, operator: Operator) -> Self {
        Self {
            results,
            operator,
            source: None,
        }
    }

    pub fn with_source(mut self, source: SourceLocation) -> Self {
        self.source = Some(source);
        self
    }
}

/// Block terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TerminatorDef {
    Branch {
        target: String,
        operands: Vec<Register>,
    },
    CondBranch {
        condition: Register,
        true_target: String,
        true_operands: Vec<Register>,
        false_target: String,
        false_operands: Vec<Register>,
    },
    Return { operand: Register },
    /// Per-case jump on an enum tag; payloads carry no data flow here.
    SwitchEnum {
        operand: Register,
        targets: Vec<(String, String)>,
        default: Option<String>,
    },
    Unreachable,
    Unknown { name: String },
}

impl TerminatorDef {
    /// Labels this terminator can transfer control to.
    pub fn successors(&self) -> Vec<&str> {
        match self {
            TerminatorDef::Branch { target, .. } => vec![target.as_str()],
            TerminatorDef::CondBranch {
                true_target,
                false_target,
                ..
            } => vec![true_target.as_str(), false_target.as_str()],
            TerminatorDef::SwitchEnum {
                targets, default, ..
            } => {
                let mut out: Vec<&str> = targets.iter().map(|(_, label)| label.as_str()).collect();
                if let Some(label) = default {
                    out.push(label.as_str());
                }
                out
            }
            TerminatorDef::Return { .. }
            | TerminatorDef::Unreachable
            | TerminatorDef::Unknown { .. } => vec![],
        }
    }
}

/// Basic block with typed arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub label: String,
    pub arguments: Vec<(Register, Type)>,
    pub operators: Vec<OperatorDef>,
    pub terminator: TerminatorDef,
}

impl Block {
    pub fn new(label: impl Into<String>, terminator: TerminatorDef) -> Self {
        Self {
            label: label.into(),
            arguments: Vec::new(),
            operators: Vec::new(),
            terminator,
        }
    }

    /// Add a typed block argument.
    pub fn with_argument(mut self, register: Register, ty: Type) -> Self {
        self.arguments.push((register, ty));
        self
    }

    /// Append an operator definition.
    pub fn push(&mut self, def: OperatorDef) {
        self.operators.push(def);
    }
}

/// A complete function in IR form. The first block is the entry block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub return_type: Type,
    pub blocks: Vec<Block>,
}

impl Function {
    pub fn new(name: impl Into<String>, return_type: Type, blocks: Vec<Block>) -> Self {
        Self {
            name: name.into(),
            return_type,
            blocks,
        }
    }

    pub fn entry_block(&self) -> Option<&Block> {
        self.blocks.first()
    }
}
