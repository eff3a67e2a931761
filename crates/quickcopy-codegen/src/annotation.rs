//! `#[quickcopy(...)]` on copy functions and `#[copy(...)]` on record fields.
//!
//! ```ignore
//! #[quickcopy(ignore_case, allow_narrowing, fields(label = "name", "home.city = address.city"))]
//! fn copy_user(dst: &mut UserDto, src: &User) {}
//!
//! #[derive(Default, QuickCopy)]
//! struct UserDto {
//!   #[copy(from = "name")]
//!   label: String,
//!   #[copy(flatten)]
//!   base: Base,
//!   #[copy(skip)]
//!   computed: u64,
//! }
//! ```

use crate::path::FieldPath;
use proc_macro2::Span;
use std::fmt;
use syn::spanned::Spanned;
use syn::{Attribute, Lit, Meta, MetaList, NestedMeta};

pub const ATTR_NAME: &str = "quickcopy";
pub const FIELD_ATTR_NAME: &str = "copy";

#[derive(Debug, Clone)]
pub struct AnnotationError {
  span: Span,
  message: String,
}

impl AnnotationError {
  fn new<T: Spanned>(node: T, message: impl Into<String>) -> Self {
    Self::with_span(node.span(), message)
  }

  fn with_span(span: Span, message: impl Into<String>) -> Self {
    Self {
      span,
      message: message.into(),
    }
  }

  pub fn span(&self) -> Span {
    self.span
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

impl fmt::Display for AnnotationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message)
  }
}

impl std::error::Error for AnnotationError {}

type Result<T> = std::result::Result<T, AnnotationError>;

/// Matching and conversion switches of one copy function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Policy {
  pub allow_narrowing: bool,
  pub ignore_case: bool,
  pub single_to_slice: bool,
}

/// `dst = src`, both dotted paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRule {
  pub dst: FieldPath,
  pub src: FieldPath,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
  pub policy: Policy,
  pub rules: Vec<RenameRule>,
}

impl Annotation {
  /// `Ok(None)` when none of the attributes is a quickcopy trigger.
  pub fn from_attrs(attrs: &[Attribute]) -> Result<Option<Self>> {
    let mut found: Option<Self> = None;
    for attr in attrs.iter().filter(|attr| is_attr(attr, ATTR_NAME)) {
      if found.is_some() {
        return Err(AnnotationError::new(attr, "Duplicate `quickcopy` attribute."));
      }
      let meta = attr
        .parse_meta()
        .map_err(|err| AnnotationError::new(attr, err.to_string()))?;
      found = Some(match meta {
        // #[quickcopy]
        Meta::Path(_) => Self::default(),
        // #[quickcopy(...)]
        Meta::List(ref list) => Self::from_nested(list.nested.iter())?,
        // #[quickcopy = "..."]
        Meta::NameValue(_) => return Err(AnnotationError::new(meta, "Invalid syntax.")),
      });
    }
    Ok(found)
  }

  pub fn from_nested<'a, I>(nested: I) -> Result<Self>
  where
    I: IntoIterator<Item = &'a NestedMeta>,
  {
    let mut annotation = Self::default();
    for meta in nested {
      match meta {
        NestedMeta::Meta(Meta::Path(path)) => {
          let ident = path
            .get_ident()
            .ok_or_else(|| AnnotationError::new(path, "Unknown option."))?;
          if ident == "allow_narrowing" {
            annotation.policy.allow_narrowing = true
          } else if ident == "ignore_case" {
            annotation.policy.ignore_case = true
          } else if ident == "single_to_slice" {
            annotation.policy.single_to_slice = true
          } else {
            return Err(AnnotationError::new(ident, format!("Unknown option: {}", ident)));
          }
        }
        // fields(..)
        NestedMeta::Meta(Meta::List(list)) => {
          if list.path.get_ident().map(|v| v == "fields").unwrap_or_default() {
            annotation.rules.extend(parse_rules(list)?);
          } else {
            return Err(AnnotationError::new(&list.path, "Unknown option."));
          }
        }
        NestedMeta::Meta(Meta::NameValue(v)) => {
          return Err(AnnotationError::new(v, "Unknown option."));
        }
        NestedMeta::Lit(lit) => return Err(AnnotationError::new(lit, "Invalid syntax.")),
      }
    }
    Ok(annotation)
  }
}

// fields(label = "name", "home.city = address.city")
fn parse_rules(list: &MetaList) -> Result<Vec<RenameRule>> {
  const ABORT_MESSAGE: &str = r#"Expected: dst = "src" or "dst.path = src.path""#;

  list
    .nested
    .iter()
    .map(|item| match item {
      NestedMeta::Meta(Meta::NameValue(v)) => {
        let ident = v
          .path
          .get_ident()
          .ok_or_else(|| AnnotationError::new(&v.path, ABORT_MESSAGE))?;
        let dst = parse_path(ident, &ident.to_string())?;
        let src = match v.lit {
          Lit::Str(ref lit) => parse_path(lit, &lit.value())?,
          _ => return Err(AnnotationError::new(&v.lit, ABORT_MESSAGE)),
        };
        Ok(RenameRule { dst, src })
      }
      NestedMeta::Lit(Lit::Str(lit)) => {
        let value = lit.value();
        let mut parts = value.splitn(2, '=');
        match (parts.next(), parts.next()) {
          (Some(dst), Some(src)) => Ok(RenameRule {
            dst: parse_path(lit, dst)?,
            src: parse_path(lit, src)?,
          }),
          _ => Err(AnnotationError::new(lit, ABORT_MESSAGE)),
        }
      }
      _ => Err(AnnotationError::new(item, ABORT_MESSAGE)),
    })
    .collect()
}

fn parse_path<T: Spanned>(node: T, src: &str) -> Result<FieldPath> {
  src
    .parse()
    .map_err(|err: crate::path::Error| AnnotationError::new(node, err.to_string()))
}

/// Options of one record field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOptions {
  /// Explicit source path, relative to the source record.
  pub from: Option<FieldPath>,
  /// Promote the inner record's fields into the enclosing shape.
  pub flatten: bool,
  /// Intentionally left for the caller to fill.
  pub skip: bool,
}

impl FieldOptions {
  pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
    let mut options = Self::default();
    for attr in attrs {
      if is_attr(attr, "serde") {
        // Only `flatten` matters here, anything else belongs to serde.
        if let Ok(Meta::List(list)) = attr.parse_meta() {
          let flatten = list.nested.iter().any(|m| match m {
            NestedMeta::Meta(Meta::Path(p)) => p.is_ident("flatten"),
            _ => false,
          });
          options.flatten |= flatten;
        }
        continue;
      }
      if !is_attr(attr, FIELD_ATTR_NAME) {
        continue;
      }
      let list = match attr
        .parse_meta()
        .map_err(|err| AnnotationError::new(attr, err.to_string()))?
      {
        Meta::List(list) => list,
        meta => return Err(AnnotationError::new(meta, "Expected `copy(...)`.")),
      };
      for item in list.nested.iter() {
        match item {
          NestedMeta::Meta(Meta::Path(path)) if path.is_ident("flatten") => options.flatten = true,
          NestedMeta::Meta(Meta::Path(path)) if path.is_ident("skip") => options.skip = true,
          NestedMeta::Meta(Meta::NameValue(v)) if v.path.is_ident("from") => match v.lit {
            Lit::Str(ref lit) => options.from = Some(parse_path(lit, &lit.value())?),
            _ => return Err(AnnotationError::new(&v.lit, "Expected a string literal.")),
          },
          _ => return Err(AnnotationError::new(item, "Unknown option.")),
        }
      }
    }
    if options.skip && options.from.is_some() {
      return Err(AnnotationError::with_span(
        attrs
          .iter()
          .find(|attr| is_attr(attr, FIELD_ATTR_NAME))
          .map(|attr| attr.span())
          .unwrap_or_else(Span::call_site),
        "`skip` and `from` cannot be combined.",
      ));
    }
    Ok(options)
  }
}

// `name` or `quickcopy::name`
fn is_attr(attr: &Attribute, name: &str) -> bool {
  let segments: Vec<_> = attr.path.segments.iter().map(|s| s.ident.to_string()).collect();
  match segments.as_slice() {
    [ident] => ident == name,
    [krate, ident] => krate == ATTR_NAME && ident == name,
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use syn::parse_quote;

  fn fn_attrs(item: syn::ItemFn) -> Vec<Attribute> {
    item.attrs
  }

  #[test]
  fn test_policy_and_rules() {
    let attrs = fn_attrs(parse_quote! {
      #[quickcopy(ignore_case, allow_narrowing, fields(label = "name", "home.city = address.city"))]
      fn copy(dst: &mut A, src: &B) {}
    });
    let annotation = Annotation::from_attrs(&attrs).unwrap().unwrap();
    assert_eq!(
      annotation.policy,
      Policy {
        allow_narrowing: true,
        ignore_case: true,
        single_to_slice: false,
      }
    );
    assert_eq!(annotation.rules.len(), 2);
    assert_eq!(annotation.rules[0].dst.to_string(), "label");
    assert_eq!(annotation.rules[0].src.to_string(), "name");
    assert_eq!(annotation.rules[1].dst.to_string(), "home.city");
    assert_eq!(annotation.rules[1].src.to_string(), "address.city");
  }

  #[test]
  fn test_bare_and_missing() {
    let attrs = fn_attrs(parse_quote! {
      /// Docs.
      #[quickcopy::quickcopy]
      fn copy(dst: &mut A, src: &B) {}
    });
    assert_eq!(Annotation::from_attrs(&attrs).unwrap(), Some(Annotation::default()));

    let attrs = fn_attrs(parse_quote! {
      #[inline]
      fn copy(dst: &mut A, src: &B) {}
    });
    assert_eq!(Annotation::from_attrs(&attrs).unwrap(), None);
  }

  #[test]
  fn test_unknown_option() {
    let attrs = fn_attrs(parse_quote! {
      #[quickcopy(deep)]
      fn copy(dst: &mut A, src: &B) {}
    });
    let err = Annotation::from_attrs(&attrs).unwrap_err();
    assert_eq!(err.message(), "Unknown option: deep");
  }

  #[test]
  fn test_field_options() {
    let item: syn::ItemStruct = parse_quote! {
      struct Dto {
        #[copy(from = "profile.name")]
        label: String,
        #[serde(flatten, default)]
        base: Base,
        #[copy(skip)]
        computed: u64,
      }
    };
    let options: Vec<_> = item
      .fields
      .iter()
      .map(|f| FieldOptions::from_attrs(&f.attrs).unwrap())
      .collect();
    assert_eq!(options[0].from.as_ref().unwrap().to_string(), "profile.name");
    assert!(options[1].flatten);
    assert!(options[2].skip);
  }

  #[test]
  fn test_field_options_conflict() {
    let item: syn::ItemStruct = parse_quote! {
      struct Dto {
        #[copy(skip, from = "name")]
        label: String,
      }
    };
    let field = item.fields.iter().next().unwrap();
    assert!(FieldOptions::from_attrs(&field.attrs).is_err());
  }
}
