//! Runs the generator over a set of units.
//!
//! Planning happens first, for all units in parallel, so every helper any
//! unit may need is committed before emission starts.

use crate::emit::{render_function, render_item, Emitter};
use crate::error::{Error, Result};
use crate::merge::merge;
use crate::plan::{assemble, Diagnostic, Plan};
use crate::registry::{Helper, HelperBody};
use crate::session::Session;
use crate::source::{FnDecl, Unit};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct FunctionReport {
  pub name: String,
  pub plan: Plan,
}

#[derive(Debug, Clone)]
pub struct UnitReport {
  pub path: PathBuf,
  pub original: String,
  pub rendered: String,
  pub functions: Vec<FunctionReport>,
}

impl UnitReport {
  pub fn changed(&self) -> bool {
    self.original != self.rendered
  }
}

#[derive(Debug, Clone, Default)]
pub struct Report {
  /// In input order.
  pub units: Vec<UnitReport>,
  /// Every helper committed during the run, sorted by name.
  pub helpers: Vec<Arc<Helper>>,
}

impl Report {
  pub fn changed(&self) -> impl Iterator<Item = &UnitReport> {
    self.units.iter().filter(|u| u.changed())
  }

  /// Diagnostics of annotated functions and helpers, labelled with the
  /// function they belong to.
  pub fn diagnostics(&self) -> Vec<(String, &Diagnostic)> {
    let mut out = vec![];
    for unit in &self.units {
      for function in &unit.functions {
        let label = format!("{}: {}", unit.path.display(), function.name);
        out.extend(function.plan.diagnostics.iter().map(|d| (label.clone(), d)));
      }
    }
    for helper in &self.helpers {
      if let HelperBody::Record(ref plan) = helper.body {
        out.extend(plan.diagnostics.iter().map(|d| (helper.name.clone(), d)));
      }
    }
    out
  }
}

struct Planned {
  unit: Arc<Unit>,
  // (index into unit.functions, plan)
  functions: Vec<(usize, Plan)>,
}

/// Plans and renders every unit in `paths`. Nothing is written.
pub fn generate(session: &Session, paths: &[PathBuf]) -> Result<Report> {
  let planned = paths
    .par_iter()
    .map(|path| plan_unit(session, path))
    .collect::<Result<Vec<_>>>()?;

  let helpers = session.registry().helpers();
  let units = {
    let by_name: HashMap<&str, &Helper> = helpers.iter().map(|h| (h.name.as_str(), h.as_ref())).collect();
    planned
      .par_iter()
      .map(|planned| emit_unit(session, planned, &by_name))
      .collect::<Result<Vec<_>>>()?
  };

  Ok(Report { units, helpers })
}

fn plan_unit(session: &Session, path: &Path) -> Result<Planned> {
  let unit = session.catalog().load(path)?.ok_or_else(|| Error::Io {
    path: path.to_path_buf(),
    source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
  })?;

  let mut functions = vec![];
  for (index, function) in unit.functions.iter().enumerate() {
    let annotation = match function.annotation {
      Some(ref annotation) => annotation,
      None => continue,
    };
    check_signature(function)?;
    let shape = |param: usize| -> Result<_> {
      let written = &function.params[param].ty;
      let ty = session.catalog().canonicalize(written, &unit)?;
      session.shape(&ty)?.ok_or_else(|| Error::UnresolvedType {
        function: function.name.clone(),
        ty: written.to_string(),
      })
    };
    let dst = shape(0)?;
    let src = shape(1)?;
    let plan = assemble(session, &src, &dst, &annotation.rules, annotation.policy)?;
    for diagnostic in &plan.diagnostics {
      warn!(path = %unit.path.display(), function = %function.name, "{}", diagnostic);
    }
    debug!(function = %function.name, mappings = plan.mappings.len(), "planned");
    functions.push((index, plan));
  }
  Ok(Planned { unit, functions })
}

fn check_signature(function: &FnDecl) -> Result<()> {
  let signature = |reason: &str| Error::Signature {
    function: function.name.clone(),
    reason: reason.to_string(),
  };
  if function.has_receiver {
    return Err(signature("must be a free function"));
  }
  if function.params.len() != 2 {
    return Err(Error::Arity {
      function: function.name.clone(),
      found: function.params.len(),
    });
  }
  if !function.params[0].is_mut_ref {
    return Err(signature("the destination must be taken as `&mut`"));
  }
  if function.params[1].is_mut_ref {
    return Err(signature("the source must be taken by value or as `&`"));
  }
  if function.params.iter().any(|p| p.name.is_none()) {
    return Err(signature("parameters must be plain identifiers"));
  }
  Ok(())
}

fn emit_unit(session: &Session, planned: &Planned, helpers: &HashMap<&str, &Helper>) -> Result<UnitReport> {
  let unit = &planned.unit;
  let emitter = Emitter::new(&unit.module, &session.config().runtime)?;

  let mut functions = BTreeMap::new();
  let mut reports = vec![];
  for (index, plan) in &planned.functions {
    let function = &unit.functions[*index];
    let param = |i: usize| function.params[i].name.as_deref().unwrap_or_default();
    let body = emitter.body(plan, param(0), param(1));
    let text = render_function(&unit.source[function.range.clone()], body)?;
    functions.insert(function.name.clone(), text);
    reports.push(FunctionReport {
      name: function.name.clone(),
      plan: plan.clone(),
    });
  }

  // every helper reachable from this unit's plans
  let mut pending: Vec<&str> = vec![];
  for (_, plan) in &planned.functions {
    plan.helpers(&mut pending);
  }
  let mut reached = BTreeSet::new();
  while let Some(name) = pending.pop() {
    if !reached.insert(name) {
      continue;
    }
    if let Some(helper) = helpers.get(name) {
      pending.extend(helper.dependencies());
    }
  }

  let mut rendered_helpers = BTreeMap::new();
  for name in reached {
    if let Some(helper) = helpers.get(name) {
      let text = render_item(name, emitter.helper(helper))?;
      rendered_helpers.insert(name.to_string(), text);
    }
  }

  let rendered = merge(unit, &functions, &rendered_helpers);
  let report = UnitReport {
    path: unit.path.clone(),
    original: unit.source.clone(),
    rendered,
    functions: reports,
  };
  info!(
    path = %report.path.display(),
    functions = report.functions.len(),
    helpers = rendered_helpers.len(),
    changed = report.changed(),
    "generated"
  );
  Ok(report)
}
