//! Generation registry.
//!
//! Every helper is planned once per run. A name is reserved before its plan
//! is computed; asking for a reserved name hands it back right away, which is
//! what terminates self- and mutually-referencing records.

use crate::error::{Error, Result};
use crate::naming::helper_name;
use crate::plan::Plan;
use crate::resolve::Strategy;
use crate::types::{ContainerKind, TypeRef};
use indexmap::IndexMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperBody {
  /// Field by field.
  Record(Plan),
  /// Element by element, `element` converts one item.
  Sequence {
    kind: ContainerKind,
    element: Strategy,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Helper {
  pub name: String,
  pub src: TypeRef,
  pub dst: TypeRef,
  pub body: HelperBody,
}

impl Helper {
  /// Helpers called from this helper's body.
  pub fn dependencies(&self) -> Vec<&str> {
    let mut out = vec![];
    match &self.body {
      HelperBody::Record(plan) => plan.helpers(&mut out),
      HelperBody::Sequence { element, .. } => element.helpers(&mut out),
    }
    out
  }
}

#[derive(Debug)]
enum Entry {
  Reserved { src: TypeRef, dst: TypeRef },
  Committed(Arc<Helper>),
}

impl Entry {
  fn converts(&self, src: &TypeRef, dst: &TypeRef) -> bool {
    match self {
      Entry::Reserved { src: s, dst: d } => s == src && d == dst,
      Entry::Committed(helper) => &helper.src == src && &helper.dst == dst,
    }
  }

  fn describe(&self) -> String {
    match self {
      Entry::Reserved { src, dst } => format!("{} -> {}", src, dst),
      Entry::Committed(helper) => format!("{} -> {}", helper.src, helper.dst),
    }
  }
}

/// Helpers keyed by name.
#[derive(Debug, Default)]
pub struct Registry {
  entries: Mutex<IndexMap<String, Entry>>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the name of the helper converting `src` into `dst`, planning it
  /// with `plan` on first request. The lock is not held while planning.
  pub fn request<F>(&self, src: &TypeRef, dst: &TypeRef, plan: F) -> Result<String>
  where
    F: FnOnce() -> Result<HelperBody>,
  {
    let name = helper_name(src, dst);
    {
      let mut entries = self.entries();
      match entries.get(&name) {
        Some(entry) if entry.converts(src, dst) => return Ok(name),
        Some(entry) => {
          return Err(Error::HelperCollision {
            name,
            first: entry.describe(),
            second: format!("{} -> {}", src, dst),
          })
        }
        None => {
          entries.insert(
            name.clone(),
            Entry::Reserved {
              src: src.clone(),
              dst: dst.clone(),
            },
          );
        }
      }
    }

    let body = match plan() {
      Ok(body) => body,
      Err(err) => {
        self.entries().shift_remove(&name);
        return Err(err);
      }
    };

    debug!(%name, %src, %dst, "helper committed");
    let helper = Helper {
      name: name.clone(),
      src: src.clone(),
      dst: dst.clone(),
      body,
    };
    self.entries().insert(name.clone(), Entry::Committed(Arc::new(helper)));
    Ok(name)
  }

  /// Committed helpers, sorted by name.
  pub fn helpers(&self) -> Vec<Arc<Helper>> {
    let mut helpers: Vec<_> = self
      .entries()
      .values()
      .filter_map(|entry| match entry {
        Entry::Committed(helper) => Some(helper.clone()),
        Entry::Reserved { .. } => None,
      })
      .collect();
    helpers.sort_by(|a, b| a.name.cmp(&b.name));
    helpers
  }

  pub fn len(&self) -> usize {
    self.entries().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn entries(&self) -> MutexGuard<'_, IndexMap<String, Entry>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
