use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Input shorthand scenario file
    pub input: PathBuf,
    /// Output .rpy file (default: input path with an .rpy extension)
    pub output: Option<PathBuf>,
}
