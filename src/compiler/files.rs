//! File access as a capability the engine may or may not be handed.

use std::fs;
use std::io;
use std::path::Path;

/// What `$include` needs from the outside world. A compile that runs
/// where no filesystem exists (tests, embedding) simply gets `None`
/// instead of a capability.
pub trait FileAccess {
    fn exists(&self, path: &str) -> bool;
    fn read_all(&self, path: &str) -> io::Result<String>;
}

/// Capability backed by the local filesystem. Paths are used exactly as
/// written in the `$include` line, so relative ones resolve against the
/// process working directory.
pub struct LocalFiles;

impl FileAccess for LocalFiles {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    fn read_all(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(path)
    }
}
