use std::path::PathBuf;

pub const DEFAULT_CRATE_ROOT: &str = "src";
pub const DEFAULT_RUNTIME: &str = "quickcopy";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  /// Directory holding `lib.rs`/`main.rs`, module paths are derived from it.
  pub crate_root: PathBuf,
  /// Path generated code reaches the runtime crate through.
  pub runtime: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      crate_root: PathBuf::from(DEFAULT_CRATE_ROOT),
      runtime: DEFAULT_RUNTIME.to_string(),
    }
  }
}
