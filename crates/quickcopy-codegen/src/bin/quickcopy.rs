use clap::Parser;
use quickcopy_codegen::cli::{init_tracing, run, Args};
use tracing::info;

fn main() -> anyhow::Result<()> {
  init_tracing();
  let args = Args::parse();
  let outcome = run(&args)?;
  info!(
    units = outcome.units,
    written = outcome.written.len(),
    diagnostics = outcome.diagnostics,
    "done"
  );
  Ok(())
}
