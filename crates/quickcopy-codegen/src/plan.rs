//! Plan assembler: pairs destination fields with source fields and resolves
//! each pair.

use crate::annotation::{Policy, RenameRule};
use crate::error::Result;
use crate::path::FieldPath;
use crate::resolve::{resolve, Strategy, Unmapped};
use crate::session::Session;
use crate::shape::RecordShape;
use crate::types::TypeRef;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
  pub src_path: Vec<String>,
  pub dst_path: Vec<String>,
  pub src_ty: TypeRef,
  pub dst_ty: TypeRef,
  pub strategy: Strategy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
  NoSourceField,
  RuleTargetNotFound,
  RuleSourceNotFound(String),
  Unmapped(Unmapped),
}

impl fmt::Display for Reason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Reason::NoSourceField => f.write_str("no source field"),
      Reason::RuleTargetNotFound => f.write_str("rule target not found"),
      Reason::RuleSourceNotFound(path) => write!(f, "rule source `{}` not found", path),
      Reason::Unmapped(reason) => reason.fmt(f),
    }
  }
}

/// A destination field left unpopulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub field: String,
  pub reason: Reason,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "`{}`: {}", self.field, self.reason)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
  /// In destination declaration order.
  pub mappings: Vec<FieldMapping>,
  pub diagnostics: Vec<Diagnostic>,
}

impl Plan {
  pub fn helpers<'a>(&'a self, out: &mut Vec<&'a str>) {
    for mapping in &self.mappings {
      mapping.strategy.helpers(out);
    }
  }
}

// A field reached through a dotted path.
struct Located {
  path: Vec<String>,
  ty: TypeRef,
  // declaration order of the outermost field
  order: usize,
}

/// Builds the plan populating `dst` from `src`.
///
/// Explicit `rules` go first, followed by the `from` options of the
/// destination fields. Every other visible destination field is then matched
/// by name.
pub fn assemble(
  session: &Session,
  src: &RecordShape,
  dst: &RecordShape,
  rules: &[RenameRule],
  policy: Policy,
) -> Result<Plan> {
  let mut plan = Plan::default();
  let mut ordered: Vec<((usize, usize), FieldMapping)> = vec![];
  let mut satisfied: HashSet<Vec<String>> = HashSet::new();

  let field_rules: Vec<RenameRule> = dst
    .fields
    .iter()
    .chain(dst.hidden.iter())
    .filter_map(|field| {
      field.options.from.as_ref().map(|from| RenameRule {
        dst: FieldPath::new(field.path.clone()),
        src: from.clone(),
      })
    })
    .collect();

  for rule in rules.iter().chain(field_rules.iter()) {
    let target = match locate(session, dst, rule.dst.segments())? {
      Some(target) => target,
      None => {
        plan.diagnostics.push(Diagnostic {
          field: rule.dst.to_string(),
          reason: Reason::RuleTargetNotFound,
        });
        continue;
      }
    };
    if !satisfied.insert(target.path.clone()) {
      continue;
    }
    let source = match locate(session, src, rule.src.segments())? {
      Some(source) => source,
      None => {
        plan.diagnostics.push(Diagnostic {
          field: target.path.join("."),
          reason: Reason::RuleSourceNotFound(rule.src.to_string()),
        });
        continue;
      }
    };
    push(session, &mut plan, &mut ordered, source, target, policy)?;
  }

  for field in &dst.fields {
    if field.options.skip || satisfied.contains(&field.path) {
      continue;
    }
    let name = field.name();
    let matched = src.fields.iter().find(|f| f.name() == name).or_else(|| {
      if policy.ignore_case {
        src.fields.iter().find(|f| f.name().eq_ignore_ascii_case(name))
      } else {
        None
      }
    });
    let source = match matched {
      Some(source) => source,
      // partly populated through dotted rules
      None if satisfied.iter().any(|p| p.starts_with(&field.path)) => continue,
      None => {
        plan.diagnostics.push(Diagnostic {
          field: field.path.join("."),
          reason: Reason::NoSourceField,
        });
        continue;
      }
    };
    satisfied.insert(field.path.clone());
    let source = Located {
      path: source.path.clone(),
      ty: source.ty.clone(),
      order: source.order,
    };
    let target = Located {
      path: field.path.clone(),
      ty: field.ty.clone(),
      order: field.order,
    };
    push(session, &mut plan, &mut ordered, source, target, policy)?;
  }

  ordered.sort_by_key(|(key, _)| *key);
  plan.mappings = ordered.into_iter().map(|(_, mapping)| mapping).collect();
  Ok(plan)
}

fn push(
  session: &Session,
  plan: &mut Plan,
  ordered: &mut Vec<((usize, usize), FieldMapping)>,
  source: Located,
  target: Located,
  policy: Policy,
) -> Result<()> {
  match resolve(session, &source.ty, &target.ty, policy)? {
    Strategy::Unmapped(reason) => plan.diagnostics.push(Diagnostic {
      field: target.path.join("."),
      reason: Reason::Unmapped(reason),
    }),
    strategy => ordered.push((
      (target.order, target.path.len()),
      FieldMapping {
        src_path: source.path,
        dst_path: target.path,
        src_ty: source.ty,
        dst_ty: target.ty,
        strategy,
      },
    )),
  }
  Ok(())
}

// Longest declared path prefix first, then a visible field by name. Named
// fields of record type are descended into for the remaining segments.
fn locate(session: &Session, shape: &RecordShape, segments: &[String]) -> Result<Option<Located>> {
  if segments.is_empty() {
    return Ok(None);
  }
  let mut found = None;
  for len in (1..=segments.len()).rev() {
    if let Some(field) = shape.field(&segments[..len]) {
      found = Some((field, len));
      break;
    }
  }
  if found.is_none() {
    found = shape.visible(&segments[0]).map(|field| (field, 1));
  }
  let (field, consumed) = match found {
    Some(found) => found,
    None => return Ok(None),
  };
  if consumed == segments.len() {
    return Ok(Some(Located {
      path: field.path.clone(),
      ty: field.ty.clone(),
      order: field.order,
    }));
  }
  let nested = match session.shape(&field.ty)? {
    Some(nested) => nested,
    None => return Ok(None),
  };
  Ok(locate(session, &nested, &segments[consumed..])?.map(|inner| {
    let mut path = field.path.clone();
    path.extend(inner.path);
    Located {
      path,
      ty: inner.ty,
      order: field.order,
    }
  }))
}
