pub mod cli;
pub mod compiler;
pub mod writer;

use anyhow::Context;
use clap::Parser;

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // 1. ── Read ───────────────────────────────────────────────────────
    let source = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Reading {}", args.input.display()))?;

    // 2. ── Compile ────────────────────────────────────────────────────
    let compiled = compiler::compile(&source, Some(&compiler::LocalFiles))
        .with_context(|| format!("Compiling {}", args.input.display()))?;
    for warning in &compiled.warnings {
        log::warn!("{warning}");
    }

    // 3. ── Write output ───────────────────────────────────────────────
    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("rpy"));
    writer::emit(&compiled.text, &output)
        .with_context(|| format!("Writing {}", output.display()))?;

    Ok(())
}
