// Prevent accidental debug output in library code; presentation of
// warnings belongs to the front end.
#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]

//! Static tensor-shape checking over a low-level SSA IR.
//!
//! Given the parsed IR of a user function, the checker abstractly
//! interprets it into a symbolic summary of how tensor shapes flow through
//! it, expands call sites against other functions' summaries, rewrites the
//! resulting constraint system to a fixpoint, and surfaces the constraints
//! that are already unsatisfiable together with the call stacks responsible.
//! Anything subtler than a literal conflict is left to a downstream solver.

// Core modules
pub mod constraints;
pub mod diagnostics;
pub mod driver;
pub mod entailment;
pub mod inlining;
pub mod interp;
pub mod ir;
pub mod loc;
pub mod transforms;

pub use diagnostics::{CollectedWarnings, IgnoreWarnings, Warning, WarningSink};
pub use driver::{check_module, is_unsatisfiable, CheckedFunction};
pub use entailment::entails;
pub use inlining::{inline_calls, CallInliner, InlineError};
pub use interp::{summarize, AcyclicPreprocessor, CfgPreprocessor};
pub use loc::SourceLocation;
