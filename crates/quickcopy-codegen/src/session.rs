//! The context threaded through planning: catalog, registry and config.

use crate::annotation::Policy;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::plan::assemble;
use crate::registry::{HelperBody, Registry};
use crate::resolve::resolve;
use crate::shape::{normalize, RecordShape};
use crate::source::SourceTree;
use crate::types::TypeRef;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
pub struct Session {
  config: Config,
  catalog: Catalog,
  registry: Registry,
}

impl Session {
  pub fn new(tree: Arc<dyn SourceTree>, config: Config) -> Result<Self> {
    if syn::parse_str::<syn::Path>(&config.runtime).is_err() {
      return Err(Error::Config(format!(
        "runtime `{}` is not a valid path",
        config.runtime
      )));
    }
    Ok(Self {
      catalog: Catalog::new(tree, config.crate_root.clone()),
      registry: Registry::new(),
      config,
    })
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  pub fn registry(&self) -> &Registry {
    &self.registry
  }

  /// Normalized shape of a canonical record type.
  pub fn shape(&self, ty: &TypeRef) -> Result<Option<RecordShape>> {
    match self.catalog.record(ty)? {
      Some(record) => Ok(Some(normalize(&self.catalog, &record)?)),
      None => Ok(None),
    }
  }

  /// Record helper converting `src` into `dst`. `None` when either side is
  /// not a known record.
  ///
  /// The helper is planned with the default policy and the destination's
  /// own field options, whichever function asked for it first.
  pub fn request_record(&self, src: &TypeRef, dst: &TypeRef) -> Result<Option<String>> {
    let (src_record, dst_record) = match (self.catalog.record(src)?, self.catalog.record(dst)?) {
      (Some(src_record), Some(dst_record)) => (src_record, dst_record),
      _ => return Ok(None),
    };
    let name = self.registry.request(src, dst, || {
      let src_shape = normalize(&self.catalog, &src_record)?;
      let dst_shape = normalize(&self.catalog, &dst_record)?;
      let plan = assemble(self, &src_shape, &dst_shape, &[], Policy::default())?;
      for diagnostic in &plan.diagnostics {
        warn!(from = %src, to = %dst, "{}", diagnostic);
      }
      Ok(HelperBody::Record(plan))
    })?;
    Ok(Some(name))
  }

  /// Element-wise helper between two containers of the same kind.
  ///
  /// Narrowing is allowed for the element, callers gate it under their own
  /// policy before asking.
  pub fn request_sequence(&self, src: &TypeRef, dst: &TypeRef) -> Result<Option<String>> {
    let (kind, src_element, dst_element) = match (src, dst) {
      (
        TypeRef::Container {
          kind,
          element: src_element,
        },
        TypeRef::Container {
          kind: dst_kind,
          element: dst_element,
        },
      ) if kind == dst_kind => (*kind, src_element, dst_element),
      _ => return Ok(None),
    };
    let policy = Policy {
      allow_narrowing: true,
      ..Policy::default()
    };
    let element = resolve(self, src_element, dst_element, policy)?;
    if element.is_unmapped() {
      return Ok(None);
    }
    let name = self
      .registry
      .request(src, dst, || Ok(HelperBody::Sequence { kind, element }))?;
    Ok(Some(name))
  }
}
