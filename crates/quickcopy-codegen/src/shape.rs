//! Record shapes: the field list of a record after flattening.

use crate::annotation::FieldOptions;
use crate::catalog::{Catalog, RecordRef};
use crate::error::Result;
use crate::types::TypeRef;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
  /// Access segments, `["base", "name"]` for a field promoted out of a
  /// flattened `base`.
  pub path: Vec<String>,
  pub ty: TypeRef,
  /// Promoted out of a flattened field.
  pub embedded: bool,
  pub options: FieldOptions,
  /// Position in the declaration walk.
  pub order: usize,
}

impl FieldDescriptor {
  pub fn name(&self) -> &str {
    self.path.last().map(String::as_str).unwrap_or_default()
  }

  pub fn depth(&self) -> usize {
    self.path.len()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordShape {
  pub ty: TypeRef,
  /// Visible fields in declaration order.
  pub fields: Vec<FieldDescriptor>,
  /// Promoted fields shadowed by a shallower (or earlier) field of the same
  /// name. Only reachable through explicit dotted paths.
  pub hidden: Vec<FieldDescriptor>,
}

impl RecordShape {
  pub fn field(&self, path: &[String]) -> Option<&FieldDescriptor> {
    self
      .fields
      .iter()
      .chain(self.hidden.iter())
      .find(|f| f.path == path)
  }

  pub fn visible(&self, name: &str) -> Option<&FieldDescriptor> {
    self.fields.iter().find(|f| f.name() == name)
  }
}

/// Normalizes `record`. Field types come out canonicalized.
pub fn normalize(catalog: &Catalog, record: &RecordRef) -> Result<RecordShape> {
  let ty = record.ty();
  let mut all = vec![];
  let mut stack = vec![ty.clone()];
  walk(catalog, record, &[], &mut stack, &mut all)?;

  // shallowest wins, then declaration order
  let mut winners: HashMap<String, (usize, usize)> = HashMap::new();
  for field in &all {
    let entry = winners
      .entry(field.name().to_string())
      .or_insert((field.depth(), field.order));
    if field.depth() < entry.0 {
      *entry = (field.depth(), field.order);
    }
  }

  let (fields, hidden): (Vec<_>, Vec<_>) = all
    .into_iter()
    .partition(|f| winners.get(f.name()).map(|w| w.1) == Some(f.order));
  Ok(RecordShape { ty, fields, hidden })
}

fn walk(
  catalog: &Catalog,
  record: &RecordRef,
  prefix: &[String],
  stack: &mut Vec<TypeRef>,
  out: &mut Vec<FieldDescriptor>,
) -> Result<()> {
  for field in &record.decl().fields {
    let ty = catalog.canonicalize(&field.ty, record.unit())?;
    let mut path = prefix.to_vec();
    path.push(field.name.clone());

    if field.options.flatten {
      if let Some(inner) = catalog.record(&ty)? {
        let inner_ty = inner.ty();
        // a record flattening itself, directly or not
        if stack.contains(&inner_ty) {
          continue;
        }
        stack.push(inner_ty);
        walk(catalog, &inner, &path, stack, out)?;
        stack.pop();
        continue;
      }
    }

    out.push(FieldDescriptor {
      path,
      ty,
      embedded: !prefix.is_empty(),
      options: field.options.clone(),
      order: out.len(),
    });
  }
  Ok(())
}
