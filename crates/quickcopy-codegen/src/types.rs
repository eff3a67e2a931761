//! Structural description of field types.
//!
//! `TypeRef` is what the resolver and the registry work with. It is plain
//! owned data (no spans) so it can be shared between worker threads and used
//! as a map key.

use quote::ToTokens;
use std::fmt;
use syn::{GenericArgument, PathArguments, Type};

pub const TIMESTAMP: &str = "Timestamp";
pub const UUID: &str = "Uuid";
pub const STRING: &str = "String";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
  /// Scalars, the opaque well-known types and anything the model can't
  /// destructure, kept as written.
  Primitive(String),
  Container {
    kind: ContainerKind,
    element: Box<TypeRef>,
  },
  Reference {
    kind: RefKind,
    pointee: Box<TypeRef>,
  },
  /// A path to a (possibly) user-declared type. Once canonicalized by the
  /// catalog, `qualifier` is an absolute module path such as `crate::dto`.
  Named { qualifier: String, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerKind {
  Vec,
  Array(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefKind {
  Option,
  Box,
}

impl TypeRef {
  pub fn primitive(name: &str) -> Self {
    TypeRef::Primitive(name.to_string())
  }

  pub fn named(qualifier: &str, name: &str) -> Self {
    TypeRef::Named {
      qualifier: qualifier.to_string(),
      name: name.to_string(),
    }
  }

  pub fn vec(element: TypeRef) -> Self {
    TypeRef::Container {
      kind: ContainerKind::Vec,
      element: Box::new(element),
    }
  }

  pub fn option(pointee: TypeRef) -> Self {
    TypeRef::Reference {
      kind: RefKind::Option,
      pointee: Box::new(pointee),
    }
  }

  pub fn boxed(pointee: TypeRef) -> Self {
    TypeRef::Reference {
      kind: RefKind::Box,
      pointee: Box::new(pointee),
    }
  }

  pub fn from_syn(ty: &Type) -> Self {
    match ty {
      Type::Paren(inner) => Self::from_syn(&inner.elem),
      Type::Group(inner) => Self::from_syn(&inner.elem),
      Type::Array(array) => match array_len(&array.len) {
        Some(len) => TypeRef::Container {
          kind: ContainerKind::Array(len),
          element: Box::new(Self::from_syn(&array.elem)),
        },
        None => opaque(ty),
      },
      Type::Path(path) if path.qself.is_none() => from_path(&path.path).unwrap_or_else(|| opaque(ty)),
      _ => opaque(ty),
    }
  }

  pub fn is_numeric(&self) -> bool {
    self.numeric_width().is_some()
  }

  /// Bit width of a numeric primitive. Pointer-sized integers count as 64.
  pub fn numeric_width(&self) -> Option<u32> {
    match self {
      TypeRef::Primitive(name) => match name.as_str() {
        "i8" | "u8" => Some(8),
        "i16" | "u16" => Some(16),
        "i32" | "u32" | "f32" => Some(32),
        "i64" | "u64" | "isize" | "usize" | "f64" => Some(64),
        "i128" | "u128" => Some(128),
        _ => None,
      },
      _ => None,
    }
  }

  pub fn is_integer(&self) -> bool {
    self.is_numeric() && !self.is_float()
  }

  pub fn is_float(&self) -> bool {
    matches!(self, TypeRef::Primitive(name) if name == "f32" || name == "f64")
  }

  pub fn is_primitive(&self, name: &str) -> bool {
    matches!(self, TypeRef::Primitive(n) if n == name)
  }

  /// `Vec<u8>`, the raw byte sequence.
  pub fn is_bytes(&self) -> bool {
    match self {
      TypeRef::Container {
        kind: ContainerKind::Vec,
        element,
      } => element.is_primitive("u8"),
      _ => false,
    }
  }

  /// Types read out of a place without `.clone()`.
  pub fn is_copy_scalar(&self) -> bool {
    self.is_numeric() || self.is_primitive("bool") || self.is_primitive("char")
  }
}

impl fmt::Display for TypeRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TypeRef::Primitive(name) => f.write_str(name),
      TypeRef::Container {
        kind: ContainerKind::Vec,
        element,
      } => write!(f, "Vec<{}>", element),
      TypeRef::Container {
        kind: ContainerKind::Array(len),
        element,
      } => write!(f, "[{}; {}]", element, len),
      TypeRef::Reference {
        kind: RefKind::Option,
        pointee,
      } => write!(f, "Option<{}>", pointee),
      TypeRef::Reference {
        kind: RefKind::Box,
        pointee,
      } => write!(f, "Box<{}>", pointee),
      TypeRef::Named { qualifier, name } if qualifier.is_empty() => f.write_str(name),
      TypeRef::Named { qualifier, name } => write!(f, "{}::{}", qualifier, name),
    }
  }
}

const PRIMITIVES: &[&str] = &[
  "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize", "f32",
  "f64", "bool", "char", "String",
];

fn opaque(ty: &Type) -> TypeRef {
  TypeRef::Primitive(ty.to_token_stream().to_string())
}

fn array_len(expr: &syn::Expr) -> Option<usize> {
  match expr {
    syn::Expr::Lit(syn::ExprLit {
      lit: syn::Lit::Int(lit),
      ..
    }) => lit.base10_parse().ok(),
    _ => None,
  }
}

fn from_path(path: &syn::Path) -> Option<TypeRef> {
  let last = path.segments.last()?;
  let ident = last.ident.to_string();
  let qualifier: Vec<String> = path
    .segments
    .iter()
    .take(path.segments.len() - 1)
    .map(|s| s.ident.to_string())
    .collect();

  // Well-known opaque types, whatever module they are spelled through. Only
  // UTC timestamps are interchangeable, other zones stay opaque.
  if ident == "DateTime" {
    return is_utc(&last.arguments).then(|| TypeRef::primitive(TIMESTAMP));
  }
  if ident == TIMESTAMP && matches!(last.arguments, PathArguments::None) {
    return Some(TypeRef::primitive(TIMESTAMP));
  }
  if ident == UUID && matches!(last.arguments, PathArguments::None) {
    return Some(TypeRef::primitive(UUID));
  }

  match &last.arguments {
    PathArguments::None => {
      if PRIMITIVES.contains(&ident.as_str()) && (qualifier.is_empty() || is_std(&qualifier)) {
        Some(TypeRef::Primitive(ident))
      } else {
        Some(TypeRef::Named {
          qualifier: qualifier.join("::"),
          name: ident,
        })
      }
    }
    PathArguments::AngleBracketed(args) => {
      if !(qualifier.is_empty() || is_std(&qualifier)) || args.args.len() != 1 {
        return None;
      }
      let inner = match args.args.first()? {
        GenericArgument::Type(ty) => TypeRef::from_syn(ty),
        _ => return None,
      };
      match ident.as_str() {
        "Vec" => Some(TypeRef::vec(inner)),
        "Option" => Some(TypeRef::option(inner)),
        "Box" => Some(TypeRef::boxed(inner)),
        _ => None,
      }
    }
    PathArguments::Parenthesized(_) => None,
  }
}

/// `<Utc>`, `<chrono::Utc>`
fn is_utc(arguments: &PathArguments) -> bool {
  let args = match arguments {
    PathArguments::AngleBracketed(args) if args.args.len() == 1 => args,
    _ => return false,
  };
  match args.args.first() {
    Some(GenericArgument::Type(Type::Path(zone))) => zone
      .path
      .segments
      .last()
      .map(|s| s.ident == "Utc" && matches!(s.arguments, PathArguments::None))
      .unwrap_or_default(),
    _ => false,
  }
}

fn is_std(qualifier: &[String]) -> bool {
  matches!(
    qualifier.first().map(String::as_str),
    Some("std") | Some("alloc") | Some("core")
  )
}
