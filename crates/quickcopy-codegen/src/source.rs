//! Compilation units.
//!
//! A unit is one parsed `.rs` file reduced to what the generator needs:
//! record declarations, functions (with their byte ranges), and imports.
//! `syn` trees are dropped after extraction, everything here is `Send + Sync`.

use crate::annotation::{Annotation, AnnotationError, FieldOptions};
use crate::error::{Error, Result};
use crate::path::unraw;
use crate::types::TypeRef;
use indexmap::IndexMap;
use proc_macro2::LineColumn;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};
use syn::spanned::Spanned;
use syn::{FnArg, Item, Pat, Type, UseTree};

/// Marker put on every generated helper's doc comment.
pub const GENERATED_MARKER: &str = "Generated by quickcopy";

/// Where units come from.
pub trait SourceTree: Send + Sync + fmt::Debug {
  /// `Ok(None)` when the file does not exist.
  fn read(&self, path: &Path) -> io::Result<Option<String>>;

  /// `.rs` files directly inside `dir`, sorted.
  fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
}

#[derive(Debug, Default)]
pub struct FsTree;

impl SourceTree for FsTree {
  fn read(&self, path: &Path) -> io::Result<Option<String>> {
    match std::fs::read_to_string(path) {
      Ok(source) => Ok(Some(source)),
      Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(err) => Err(err),
    }
  }

  fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in std::fs::read_dir(dir)? {
      let path = entry?.path();
      if path.is_file() && path.extension().map(|e| e == "rs").unwrap_or_default() {
        files.push(path);
      }
    }
    files.sort();
    Ok(files)
  }
}

/// In-memory tree, handy for tests and editor integrations.
#[derive(Debug, Default, Clone)]
pub struct MemoryTree {
  files: BTreeMap<PathBuf, String>,
}

impl MemoryTree {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_file(mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
    self.insert(path, source);
    self
  }

  pub fn insert(&mut self, path: impl Into<PathBuf>, source: impl Into<String>) {
    self.files.insert(path.into(), source.into());
  }
}

impl SourceTree for MemoryTree {
  fn read(&self, path: &Path) -> io::Result<Option<String>> {
    Ok(self.files.get(path).cloned())
  }

  fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
    Ok(
      self
        .files
        .keys()
        .filter(|p| p.parent() == Some(dir) && p.extension().map(|e| e == "rs").unwrap_or_default())
        .cloned()
        .collect(),
    )
  }
}

/// Absolute module path, always starting with `crate`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModulePath(Vec<String>);

impl ModulePath {
  pub fn root() -> Self {
    Self(vec!["crate".to_string()])
  }

  pub fn parse(src: &str) -> Option<Self> {
    let segments: Vec<String> = src.split("::").map(str::to_string).collect();
    if segments.first().map(String::as_str) == Some("crate") {
      Some(Self(segments))
    } else {
      None
    }
  }

  /// `src/lib.rs` → `crate`, `src/a/b.rs` and `src/a/b/mod.rs` → `crate::a::b`.
  pub fn for_file(crate_root: &Path, file: &Path) -> Self {
    let relative = file.strip_prefix(crate_root).unwrap_or(file);
    let mut segments = vec!["crate".to_string()];
    let components: Vec<String> = relative
      .with_extension("")
      .components()
      .filter_map(|c| match c {
        std::path::Component::Normal(s) => s.to_str().map(str::to_string),
        _ => None,
      })
      .collect();
    let count = components.len();
    for (i, name) in components.into_iter().enumerate() {
      let last = i + 1 == count;
      if last && (name == "mod" || (count == 1 && (name == "lib" || name == "main"))) {
        continue;
      }
      segments.push(name);
    }
    Self(segments)
  }

  pub fn is_root(&self) -> bool {
    self.0.len() == 1
  }

  pub fn parent(&self) -> Self {
    if self.is_root() {
      self.clone()
    } else {
      Self(self.0[..self.0.len() - 1].to_vec())
    }
  }

  pub fn join(&self, segment: &str) -> Self {
    let mut segments = self.0.clone();
    segments.push(segment.to_string());
    Self(segments)
  }

  /// Resolves `crate::..`, `self::..`, `super::..` or a child path against
  /// `self`.
  pub fn resolve(&self, path: &[String]) -> Self {
    let mut iter = path.iter().peekable();
    let mut base = match iter.peek().map(|s| s.as_str()) {
      Some("crate") => {
        iter.next();
        Self::root()
      }
      Some("self") => {
        iter.next();
        self.clone()
      }
      _ => self.clone(),
    };
    for segment in iter {
      base = if segment == "super" {
        base.parent()
      } else {
        base.join(segment)
      };
    }
    base
  }

  /// Candidate files for this module below `crate_root`.
  pub fn candidate_files(&self, crate_root: &Path) -> Vec<PathBuf> {
    if self.is_root() {
      return vec![crate_root.join("lib.rs"), crate_root.join("main.rs")];
    }
    let mut dir = crate_root.to_path_buf();
    for segment in &self.0[1..self.0.len() - 1] {
      dir.push(segment);
    }
    let last = &self.0[self.0.len() - 1];
    vec![dir.join(format!("{}.rs", last)), dir.join(last).join("mod.rs")]
  }
}

impl fmt::Display for ModulePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0.join("::"))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
  pub name: String,
  pub ty: TypeRef,
  pub options: FieldOptions,
}

/// A non-generic `struct` with named fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDecl {
  pub name: String,
  pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
  pub name: Option<String>,
  pub ty: TypeRef,
  pub is_mut_ref: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnDecl {
  pub name: String,
  /// Byte range of the whole item, attributes included.
  pub range: Range<usize>,
  pub annotation: Option<Annotation>,
  pub params: Vec<Param>,
  /// Has a receiver (`self`), which never fits a copy function.
  pub has_receiver: bool,
  /// Carries the generated-helper doc marker.
  pub generated: bool,
}

/// One `use` leaf: `use crate::dto::User as Person;` is
/// `{ path: [crate, dto, User], alias: Some(Person) }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
  pub path: Vec<String>,
  pub alias: Option<String>,
  pub glob: bool,
}

impl Import {
  /// Name the import binds in the unit.
  pub fn local_name(&self) -> Option<&str> {
    if self.glob {
      return None;
    }
    self.alias.as_deref().or_else(|| self.path.last().map(String::as_str))
  }
}

#[derive(Debug, Clone)]
pub struct Unit {
  pub path: PathBuf,
  pub module: ModulePath,
  pub source: String,
  pub records: IndexMap<String, RecordDecl>,
  pub functions: Vec<FnDecl>,
  pub imports: Vec<Import>,
}

impl Unit {
  pub fn parse(path: &Path, module: ModulePath, source: String) -> Result<Self> {
    let file = syn::parse_file(&source).map_err(|err| {
      let start = err.span().start();
      Error::Parse {
        path: path.to_path_buf(),
        line: start.line,
        column: start.column + 1,
        message: err.to_string(),
      }
    })?;
    let lines = LineIndex::new(&source);
    let annotation_err = |item: &str, err: AnnotationError| Error::Annotation {
      path: path.to_path_buf(),
      item: item.to_string(),
      line: err.span().start().line,
      message: err.to_string(),
    };

    let mut records = IndexMap::new();
    let mut functions = vec![];
    let mut imports = vec![];
    for item in &file.items {
      match item {
        Item::Struct(item) => {
          let named = match item.fields {
            syn::Fields::Named(ref fields) => fields,
            _ => continue,
          };
          if !item.generics.params.is_empty() {
            continue;
          }
          let name = item.ident.to_string();
          let mut fields = vec![];
          for field in &named.named {
            let options =
              FieldOptions::from_attrs(&field.attrs).map_err(|err| annotation_err(&name, err))?;
            fields.push(FieldDecl {
              name: field.ident.as_ref().map(|i| unraw(&i.to_string())).unwrap_or_default(),
              ty: TypeRef::from_syn(&field.ty),
              options,
            });
          }
          records.insert(name.clone(), RecordDecl { name, fields });
        }
        Item::Fn(item) => {
          let name = item.sig.ident.to_string();
          let annotation = Annotation::from_attrs(&item.attrs).map_err(|err| annotation_err(&name, err))?;
          let generated = item.attrs.iter().any(|attr| {
            attr.path.is_ident("doc") && attr.tokens.to_string().contains(GENERATED_MARKER)
          });
          let mut params = vec![];
          let mut has_receiver = false;
          for input in &item.sig.inputs {
            match input {
              FnArg::Receiver(_) => has_receiver = true,
              FnArg::Typed(pat) => params.push(param(&pat.pat, &pat.ty)),
            }
          }
          let span = item.span();
          functions.push(FnDecl {
            name,
            range: lines.offset(span.start())..lines.offset(span.end()),
            annotation,
            params,
            has_receiver,
            generated,
          });
        }
        Item::Use(item) => flatten_use(&item.tree, &mut vec![], &mut imports),
        _ => {}
      }
    }

    Ok(Self {
      path: path.to_path_buf(),
      module,
      source,
      records,
      functions,
      imports,
    })
  }

  pub fn dir(&self) -> &Path {
    self.path.parent().unwrap_or_else(|| Path::new(""))
  }
}

fn param(pat: &Pat, ty: &Type) -> Param {
  let name = match pat {
    Pat::Ident(ident) => Some(ident.ident.to_string()),
    _ => None,
  };
  match ty {
    Type::Reference(reference) => Param {
      name,
      ty: TypeRef::from_syn(&reference.elem),
      is_mut_ref: reference.mutability.is_some(),
    },
    _ => Param {
      name,
      ty: TypeRef::from_syn(ty),
      is_mut_ref: false,
    },
  }
}

fn flatten_use(tree: &UseTree, prefix: &mut Vec<String>, out: &mut Vec<Import>) {
  match tree {
    UseTree::Path(path) => {
      prefix.push(path.ident.to_string());
      flatten_use(&path.tree, prefix, out);
      prefix.pop();
    }
    // use a::b::{self}
    UseTree::Name(name) if name.ident == "self" => out.push(Import {
      path: prefix.clone(),
      alias: None,
      glob: false,
    }),
    UseTree::Name(name) => {
      let mut path = prefix.clone();
      path.push(name.ident.to_string());
      out.push(Import {
        path,
        alias: None,
        glob: false,
      })
    }
    UseTree::Rename(rename) => {
      let mut path = prefix.clone();
      if rename.ident != "self" {
        path.push(rename.ident.to_string());
      }
      out.push(Import {
        path,
        alias: Some(rename.rename.to_string()),
        glob: false,
      })
    }
    UseTree::Glob(_) => out.push(Import {
      path: prefix.clone(),
      alias: None,
      glob: true,
    }),
    UseTree::Group(group) => {
      for tree in &group.items {
        flatten_use(tree, prefix, out);
      }
    }
  }
}

/// Maps `proc_macro2` line/column positions back to byte offsets.
struct LineIndex<'a> {
  source: &'a str,
  starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
  fn new(source: &'a str) -> Self {
    let mut starts = vec![0];
    starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
    Self { source, starts }
  }

  // line is 1-based, column counts chars
  fn offset(&self, at: LineColumn) -> usize {
    let start = match at.line.checked_sub(1).and_then(|l| self.starts.get(l)) {
      Some(start) => *start,
      None => return self.source.len(),
    };
    self.source[start..]
      .char_indices()
      .nth(at.column)
      .map(|(i, _)| start + i)
      .unwrap_or_else(|| self.source.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_module_paths() {
    let root = Path::new("src");
    assert_eq!(ModulePath::for_file(root, Path::new("src/lib.rs")).to_string(), "crate");
    assert_eq!(ModulePath::for_file(root, Path::new("src/dto.rs")).to_string(), "crate::dto");
    assert_eq!(ModulePath::for_file(root, Path::new("src/a/mod.rs")).to_string(), "crate::a");
    assert_eq!(ModulePath::for_file(root, Path::new("src/a/b.rs")).to_string(), "crate::a::b");

    let here = ModulePath::parse("crate::a::b").unwrap();
    let resolved = here.resolve(&["super".to_string(), "c".to_string()]);
    assert_eq!(resolved.to_string(), "crate::a::c");
    assert_eq!(
      resolved.candidate_files(root),
      vec![PathBuf::from("src/a/c.rs"), PathBuf::from("src/a/c/mod.rs")]
    );
  }

  #[test]
  fn test_unit_extraction() {
    let source = r#"use crate::dto::{self, User as Person};
use super::models::*;

#[derive(Default)]
pub struct Account {
  pub id: u64,
  #[copy(flatten)]
  pub base: Base,
}

struct Wrapper<T> {
  inner: T,
}

#[quickcopy(ignore_case)]
fn copy_account(dst: &mut Account, src: &dto::Account) {}
"#;
    let unit = Unit::parse(Path::new("src/lib.rs"), ModulePath::root(), source.to_string()).unwrap();
    assert_eq!(unit.records.len(), 1);
    let account = &unit.records["Account"];
    assert_eq!(account.fields[0].ty, TypeRef::primitive("u64"));
    assert!(account.fields[1].options.flatten);

    assert_eq!(unit.imports.len(), 3);
    assert_eq!(unit.imports[0].local_name(), Some("dto"));
    assert_eq!(unit.imports[1].local_name(), Some("Person"));
    assert!(unit.imports[2].glob);

    let function = unit.functions.iter().find(|f| f.annotation.is_some()).unwrap();
    assert!(function.annotation.as_ref().unwrap().policy.ignore_case);
    assert_eq!(function.params.len(), 2);
    assert!(function.params[0].is_mut_ref);
    assert_eq!(function.params[1].ty, TypeRef::named("dto", "Account"));
    assert!(unit.source[function.range.clone()].starts_with("#[quickcopy(ignore_case)]"));
    assert!(unit.source[function.range.clone()].ends_with("{}"));
  }

  #[test]
  fn test_parse_error_position() {
    let err = Unit::parse(Path::new("src/lib.rs"), ModulePath::root(), "struct {".to_string()).unwrap_err();
    assert!(matches!(err, Error::Parse { line: 1, .. }));
  }
}
