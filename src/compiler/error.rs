//! Fatal error taxonomy plus the advisory warning value.
//!
//! Everything in `CompileError` aborts the compile of the unit that hit
//! it and propagates unchanged through any chain of `$include`s; there
//! is no recovery and no partial output. `line` is always the 1-based
//! output line counter at the moment the problem was detected.

use std::fmt;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    /// Line matched none of the recognized constructs.
    #[error("line {line}: unrecognized line")]
    Syntax { line: usize },

    /// A `「` with no `」` anywhere on the same line.
    #[error("line {line}: dialogue is never closed")]
    UnclosedDialogue { line: usize },

    /// Alias definition without its `:` separator.
    #[error("line {line}: alias definition is missing `:`")]
    MalformedAlias { line: usize },

    #[error("line {line}: unknown instruction `${command}`")]
    UnknownInstruction { line: usize, command: String },

    #[error("line {line}: `${command}` takes {expected} argument(s), got {found}")]
    ArgumentCount {
        line: usize,
        command: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: unknown decoration `{name}`")]
    UnknownDecoration { line: usize, name: String },

    /// `$include` in a compile that was handed no file access.
    #[error("line {line}: `$include` needs file access, which is unavailable here")]
    IncludeUnavailable { line: usize },

    #[error("line {line}: included file `{path}` does not exist")]
    IncludeNotFound { line: usize, path: String },

    #[error("line {line}: could not read `{path}`")]
    IncludeRead {
        line: usize,
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Advisory only – never changes the produced text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}
