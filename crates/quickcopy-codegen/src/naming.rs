//! Helper naming. A name is a readable slug of both types followed by a short
//! digest of their full paths. The registry is keyed by the name, so two
//! conversions never share a helper unless the digests collide, which the
//! registry reports.

use crate::types::{ContainerKind, RefKind, TypeRef};
use sha2::{Digest, Sha256};

/// `copy_{dst}_from_{src}_{digest}`
pub fn helper_name(src: &TypeRef, dst: &TypeRef) -> String {
  format!("copy_{}_from_{}_{}", slug(dst), slug(src), digest(src, dst))
}

fn digest(src: &TypeRef, dst: &TypeRef) -> String {
  let hash = Sha256::digest(format!("{} -> {}", src, dst).as_bytes());
  hex::encode(&hash[..4])
}

fn slug(ty: &TypeRef) -> String {
  match ty {
    TypeRef::Primitive(name) => snake_case(name),
    TypeRef::Container {
      kind: ContainerKind::Vec,
      element,
    } => format!("vec_{}", slug(element)),
    TypeRef::Container {
      kind: ContainerKind::Array(len),
      element,
    } => format!("arr{}_{}", len, slug(element)),
    TypeRef::Reference {
      kind: RefKind::Option,
      pointee,
    } => format!("opt_{}", slug(pointee)),
    TypeRef::Reference {
      kind: RefKind::Box,
      pointee,
    } => format!("box_{}", slug(pointee)),
    TypeRef::Named { name, .. } => snake_case(name),
  }
}

/// `UserDTO` → `user_dto`, `HTTPServer` → `http_server`. Anything that is
/// not alphanumeric becomes a single `_`.
fn snake_case(name: &str) -> String {
  let chars: Vec<char> = name.chars().collect();
  let mut out = String::with_capacity(name.len() + 4);
  for (i, &c) in chars.iter().enumerate() {
    if !c.is_alphanumeric() {
      if !out.is_empty() && !out.ends_with('_') {
        out.push('_');
      }
      continue;
    }
    if c.is_uppercase() {
      let prev = if i > 0 { chars.get(i - 1).copied() } else { None };
      let next = chars.get(i + 1).copied();
      let boundary = match prev {
        Some(p) if p.is_lowercase() || p.is_numeric() => true,
        Some(p) if p.is_uppercase() => next.map(|n| n.is_lowercase()).unwrap_or_default(),
        _ => false,
      };
      if boundary && !out.ends_with('_') {
        out.push('_');
      }
      out.extend(c.to_lowercase());
    } else {
      out.push(c);
    }
  }
  out.trim_end_matches('_').to_string()
}
