use serde::{Deserialize, Serialize};
use std::fmt;

/// Source position an operator, constraint, or warning points back to.
///
/// The parser attaches one of these to every operator it has debug
/// information for; the checker threads them through constraints so a
/// downstream solver can name the line responsible for a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Path of the source file as the parser reported it.
    pub path: String,
    /// 1-indexed line number.
    pub line: u32,
}

impl SourceLocation {
    pub fn new(path: impl Into<String>, line: u32) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.line)
    }
}
