//! # quickcopy-codegen
//!
//! Generates the bodies of struct-to-struct copy functions.
//!
//! A copy function is a stub marked with `#[quickcopy]` taking the
//! destination first and the source second:
//!
//! ```ignore
//! #[quickcopy(ignore_case, fields(label = "name"))]
//! fn copy_user(dst: &mut UserDto, src: &User) {}
//! ```
//!
//! The generator matches the fields of both records, picks a conversion for
//! every pair and rewrites the body in place. Nested records, containers and
//! `Option`/`Box` wrappers get private helpers appended to the same file.
//!
//! ```no_run
//! use quickcopy_codegen::{driver, Config, FsTree, Session};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let session = Session::new(Arc::new(FsTree), Config::default()).unwrap();
//! let report = driver::generate(&session, &[PathBuf::from("src/api.rs")]).unwrap();
//! for unit in report.changed() {
//!   std::fs::write(&unit.path, &unit.rendered).unwrap();
//! }
//! ```

pub mod annotation;
pub mod catalog;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod driver;
pub mod emit;
pub mod error;
pub mod merge;
pub mod naming;
pub mod path;
pub mod plan;
pub mod registry;
pub mod resolve;
pub mod session;
pub mod shape;
pub mod source;
pub mod types;

pub use annotation::{Annotation, AnnotationError, FieldOptions, Policy, RenameRule};
pub use config::Config;
pub use driver::{generate, Report};
pub use error::{Error, Result};
pub use plan::{Diagnostic, FieldMapping, Plan};
pub use resolve::Strategy;
pub use session::Session;
pub use source::{FsTree, MemoryTree, SourceTree};
pub use types::TypeRef;
