//! The functional core – one stateful pass over the scenario text.
//!
//! `compile` is a pure function of the source text and the (optional)
//! file-access capability: no state survives a call, and two compiles
//! never share anything, so running them from different threads is fine.
mod engine;
mod error;
mod files;
mod text;

pub use error::{CompileError, Warning};
pub use files::{FileAccess, LocalFiles};

use engine::Compiler;

/// Result of one compile: the produced Ren'Py text plus any advisory
/// warnings picked up along the way. Included files contribute their
/// warnings to the including compile.
#[derive(Debug)]
pub struct Compiled {
    pub text: String,
    pub warnings: Vec<Warning>,
}

/// Compile one shorthand scenario into Ren'Py script.
///
/// `files` is what `$include` reads through; pass `None` where no
/// filesystem is available, which turns `$include` into a fatal error.
pub fn compile(source: &str, files: Option<&dyn FileAccess>) -> Result<Compiled, CompileError> {
    Compiler::new(files).compile(source)
}
