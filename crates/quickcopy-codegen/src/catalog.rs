//! Type catalog.
//!
//! Finds the record declaration a type name refers to. Units are parsed
//! lazily, once per file, and shared between workers afterwards.

use crate::error::{Error, Result};
use crate::source::{ModulePath, RecordDecl, SourceTree, Unit};
use crate::types::TypeRef;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

// `use` chains deeper than this are treated as unresolvable.
const MAX_IMPORT_DEPTH: usize = 8;

/// A record declaration together with the unit declaring it.
#[derive(Debug, Clone)]
pub struct RecordRef {
  unit: Arc<Unit>,
  index: usize,
}

impl RecordRef {
  pub fn unit(&self) -> &Arc<Unit> {
    &self.unit
  }

  pub fn decl(&self) -> &RecordDecl {
    &self.unit.records[self.index]
  }

  /// The canonical type naming this record.
  pub fn ty(&self) -> TypeRef {
    TypeRef::named(&self.unit.module.to_string(), &self.decl().name)
  }
}

type Cell<T> = Arc<OnceCell<T>>;

#[derive(Debug)]
pub struct Catalog {
  tree: Arc<dyn SourceTree>,
  crate_root: PathBuf,
  units: Mutex<HashMap<PathBuf, Cell<Option<Arc<Unit>>>>>,
  dirs: Mutex<HashMap<PathBuf, Cell<Arc<Vec<PathBuf>>>>>,
  modules: Mutex<HashMap<ModulePath, PathBuf>>,
}

impl Catalog {
  pub fn new(tree: Arc<dyn SourceTree>, crate_root: impl Into<PathBuf>) -> Self {
    Self {
      tree,
      crate_root: crate_root.into(),
      units: Mutex::default(),
      dirs: Mutex::default(),
      modules: Mutex::default(),
    }
  }

  /// Loads (or returns the cached) unit at `path`. `Ok(None)` if the file
  /// does not exist.
  pub fn load(&self, path: &Path) -> Result<Option<Arc<Unit>>> {
    let cell = self
      .units
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .entry(path.to_path_buf())
      .or_default()
      .clone();
    let unit = cell.get_or_try_init(|| -> Result<_> {
      let source = match self.tree.read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
      })? {
        Some(source) => source,
        None => return Ok(None),
      };
      let module = ModulePath::for_file(&self.crate_root, path);
      debug!(path = %path.display(), %module, "parsing unit");
      let unit = Unit::parse(path, module.clone(), source)?;
      self
        .modules
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(module)
        .or_insert_with(|| path.to_path_buf());
      Ok(Some(Arc::new(unit)))
    })?;
    Ok(unit.clone())
  }

  /// The `.rs` files sharing a directory with `unit`, the unit itself
  /// excluded.
  pub fn siblings(&self, unit: &Unit) -> Result<Arc<Vec<PathBuf>>> {
    let dir = unit.dir().to_path_buf();
    let cell = self
      .dirs
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .entry(dir.clone())
      .or_default()
      .clone();
    let files = cell.get_or_try_init(|| -> Result<_> {
      let files = self.tree.list(&dir).map_err(|source| Error::Io {
        path: dir.clone(),
        source,
      })?;
      Ok(Arc::new(files))
    })?;
    Ok(Arc::new(
      files.iter().filter(|p| p.as_path() != unit.path).cloned().collect(),
    ))
  }

  pub fn module(&self, module: &ModulePath) -> Result<Option<Arc<Unit>>> {
    let known = self
      .modules
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(module)
      .cloned();
    if let Some(path) = known {
      return self.load(&path);
    }
    for candidate in module.candidate_files(&self.crate_root) {
      if let Some(unit) = self.load(&candidate)? {
        return Ok(Some(unit));
      }
    }
    Ok(None)
  }

  /// Record declaration of a canonical type.
  pub fn record(&self, ty: &TypeRef) -> Result<Option<RecordRef>> {
    let (qualifier, name) = match ty {
      TypeRef::Named { qualifier, name } => (qualifier, name),
      _ => return Ok(None),
    };
    let module = match ModulePath::parse(qualifier) {
      Some(module) => module,
      None => return Ok(None),
    };
    Ok(self.module(&module)?.and_then(|unit| local(&unit, name)))
  }

  /// Record declaration `ty` names when written inside `unit`.
  pub fn resolve(&self, ty: &TypeRef, unit: &Arc<Unit>) -> Result<Option<RecordRef>> {
    match ty {
      TypeRef::Named { qualifier, name } if qualifier.is_empty() => self.lookup(unit, name, 0, true),
      TypeRef::Named { qualifier, name } => {
        let segments: Vec<String> = qualifier.split("::").map(str::to_string).collect();
        match self.module_of(unit, &segments) {
          Some(module) => self.find(&module, name, 1),
          None => Ok(None),
        }
      }
      _ => Ok(None),
    }
  }

  /// Rewrites every record name in `ty` to its absolute form. Names that
  /// resolve to nothing are kept as written.
  pub fn canonicalize(&self, ty: &TypeRef, unit: &Arc<Unit>) -> Result<TypeRef> {
    Ok(match ty {
      TypeRef::Primitive(_) => ty.clone(),
      TypeRef::Container { kind, element } => TypeRef::Container {
        kind: *kind,
        element: Box::new(self.canonicalize(element, unit)?),
      },
      TypeRef::Reference { kind, pointee } => TypeRef::Reference {
        kind: *kind,
        pointee: Box::new(self.canonicalize(pointee, unit)?),
      },
      TypeRef::Named { .. } => match self.resolve(ty, unit)? {
        Some(record) => record.ty(),
        None => ty.clone(),
      },
    })
  }

  // local declarations, explicit imports, glob imports, then siblings
  fn lookup(&self, unit: &Arc<Unit>, name: &str, depth: usize, siblings: bool) -> Result<Option<RecordRef>> {
    if let Some(record) = local(unit, name) {
      return Ok(Some(record));
    }
    if depth >= MAX_IMPORT_DEPTH {
      return Ok(None);
    }

    for import in unit.imports.iter().filter(|i| i.local_name() == Some(name)) {
      let (item, module) = match import.path.split_last() {
        Some((item, module)) => (item, module),
        None => continue,
      };
      if let Some(module) = self.module_of(unit, module) {
        if let Some(record) = self.find(&module, item, depth + 1)? {
          return Ok(Some(record));
        }
      }
    }

    for import in unit.imports.iter().filter(|i| i.glob) {
      if let Some(module) = self.module_of(unit, &import.path) {
        if let Some(record) = self.find(&module, name, depth + 1)? {
          return Ok(Some(record));
        }
      }
    }

    if siblings {
      for path in self.siblings(unit)?.iter() {
        if let Some(sibling) = self.load(path)? {
          if let Some(record) = local(&sibling, name) {
            return Ok(Some(record));
          }
        }
      }
    }
    Ok(None)
  }

  fn find(&self, module: &ModulePath, name: &str, depth: usize) -> Result<Option<RecordRef>> {
    match self.module(module)? {
      Some(unit) => self.lookup(&unit, name, depth, false),
      None => Ok(None),
    }
  }

  // Module a (possibly relative) module path written in `unit` refers to.
  fn module_of(&self, unit: &Unit, segments: &[String]) -> Option<ModulePath> {
    let first = segments.first()?;
    if first == "crate" || first == "self" || first == "super" {
      return Some(unit.module.resolve(segments));
    }
    if let Some(import) = unit.imports.iter().find(|i| i.local_name() == Some(first.as_str())) {
      let base = unit.module.resolve(&import.path);
      return Some(base.resolve(&segments[1..]));
    }
    // Anything else is a child module, or an external crate which never
    // resolves to a local file.
    Some(unit.module.resolve(segments))
  }
}

fn local(unit: &Arc<Unit>, name: &str) -> Option<RecordRef> {
  unit.records.get_index_of(name).map(|index| RecordRef {
    unit: unit.clone(),
    index,
  })
}
