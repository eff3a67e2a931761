use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Structural failures. Any of these stops the run.
#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to read `{}`: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to parse `{}` at {line}:{column}: {message}", path.display())]
  Parse {
    path: PathBuf,
    line: usize,
    column: usize,
    message: String,
  },
  #[error("invalid `{item}` annotation in `{}` at line {line}: {message}", path.display())]
  Annotation {
    path: PathBuf,
    item: String,
    line: usize,
    message: String,
  },
  #[error("copy function `{function}` must have exactly two parameters (dst, src), found {found}")]
  Arity { function: String, found: usize },
  #[error("copy function `{function}`: {reason}")]
  Signature { function: String, reason: String },
  #[error("copy function `{function}`: `{ty}` does not resolve to a struct with named fields")]
  UnresolvedType { function: String, ty: String },
  #[error("helper `{name}` would convert both `{first}` and `{second}`")]
  HelperCollision {
    name: String,
    first: String,
    second: String,
  },
  #[error("failed to render `{item}`: {message}")]
  Emit { item: String, message: String },
  #[error("invalid configuration: {0}")]
  Config(String),
}
