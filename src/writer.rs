//! Write the compiled Ren'Py text to disk.

use std::fs;
use std::io;
use std::path::Path;

pub fn emit(text: &str, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, text)
}
