//! The `quickcopy` command.

use crate::annotation::ATTR_NAME;
use crate::config::{Config, DEFAULT_CRATE_ROOT, DEFAULT_RUNTIME};
use crate::driver::generate;
use crate::session::Session;
use crate::source::FsTree;
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use walkdir::WalkDir;

#[derive(Debug, Clone, Parser)]
#[command(name = "quickcopy", version, about = "Generates the bodies of struct-to-struct copy functions")]
pub struct Args {
  /// Files or directories to scan, the crate root when empty.
  pub paths: Vec<PathBuf>,

  /// Directory holding `lib.rs`/`main.rs`.
  #[arg(long, default_value = DEFAULT_CRATE_ROOT)]
  pub crate_root: PathBuf,

  /// Path generated code reaches the runtime crate through.
  #[arg(long, default_value = DEFAULT_RUNTIME)]
  pub runtime: String,

  /// Fail instead of writing when a file would change.
  #[arg(long)]
  pub check: bool,

  /// Fail when a destination field is left unpopulated.
  #[arg(long)]
  pub strict: bool,
}

#[derive(Debug, Default)]
pub struct Outcome {
  pub units: usize,
  pub written: Vec<PathBuf>,
  pub diagnostics: usize,
}

pub fn run(args: &Args) -> Result<Outcome> {
  let roots = if args.paths.is_empty() {
    vec![args.crate_root.clone()]
  } else {
    args.paths.clone()
  };
  let files = collect(&roots)?;
  info!(files = files.len(), "scanning");

  let config = Config {
    crate_root: args.crate_root.clone(),
    runtime: args.runtime.clone(),
  };
  let session = Session::new(Arc::new(FsTree), config)?;
  let report = generate(&session, &files)?;

  let diagnostics = report.diagnostics();
  if args.strict && !diagnostics.is_empty() {
    let fields: Vec<String> = diagnostics
      .iter()
      .map(|(function, diagnostic)| format!("{}: {}", function, diagnostic))
      .collect();
    bail!(
      "{} destination field(s) left unpopulated:\n  {}",
      fields.len(),
      fields.join("\n  ")
    );
  }

  let changed: Vec<_> = report.changed().collect();
  if args.check {
    if !changed.is_empty() {
      let paths: Vec<String> = changed.iter().map(|u| u.path.display().to_string()).collect();
      bail!("out of date: {}", paths.join(", "));
    }
    return Ok(Outcome {
      units: report.units.len(),
      written: vec![],
      diagnostics: diagnostics.len(),
    });
  }

  let mut written = vec![];
  for unit in changed {
    std::fs::write(&unit.path, &unit.rendered)
      .with_context(|| format!("failed to write `{}`", unit.path.display()))?;
    info!(path = %unit.path.display(), "written");
    written.push(unit.path.clone());
  }
  Ok(Outcome {
    units: report.units.len(),
    written,
    diagnostics: diagnostics.len(),
  })
}

// `.rs` files mentioning the attribute, `target` directories skipped.
fn collect(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
  let mut files = vec![];
  for root in roots {
    let walker = WalkDir::new(root)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|entry| entry.file_name() != "target");
    for entry in walker {
      let entry = entry.with_context(|| format!("failed to walk `{}`", root.display()))?;
      let path = entry.path();
      if !entry.file_type().is_file() || path.extension().map(|e| e != "rs").unwrap_or(true) {
        continue;
      }
      let source =
        std::fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))?;
      if source.contains(ATTR_NAME) {
        files.push(path.to_path_buf());
      }
    }
  }
  files.sort();
  files.dedup();
  Ok(files)
}

/// `RUST_LOG` wins, `quickcopy_codegen=info` otherwise.
pub fn init_tracing() {
  use tracing_subscriber::layer::SubscriberExt;
  use tracing_subscriber::util::SubscriberInitExt;
  use tracing_subscriber::{fmt, EnvFilter};

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "quickcopy_codegen=info".into()))
    .with(fmt::layer().with_writer(std::io::stderr))
    .init();
}
