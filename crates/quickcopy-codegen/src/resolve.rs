//! Conversion resolver: what turns a source field into a destination field.

use crate::annotation::Policy;
use crate::error::Result;
use crate::session::Session;
use crate::types::{ContainerKind, RefKind, TypeRef, STRING, TIMESTAMP, UUID};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
  IntToText,
  TextToInt,
  FloatToText,
  TextToFloat,
  TimestampToText,
  TextToTimestamp,
  UuidToText,
  TextToUuid,
  TextToBytes,
  BytesToText,
}

impl Builtin {
  pub fn lookup(src: &TypeRef, dst: &TypeRef) -> Option<Self> {
    let text = TypeRef::primitive(STRING);
    let builtin = if dst == &text {
      if src.is_integer() {
        Builtin::IntToText
      } else if src.is_float() {
        Builtin::FloatToText
      } else if src.is_primitive(TIMESTAMP) {
        Builtin::TimestampToText
      } else if src.is_primitive(UUID) {
        Builtin::UuidToText
      } else if src.is_bytes() {
        Builtin::BytesToText
      } else {
        return None;
      }
    } else if src == &text {
      if dst.is_integer() {
        Builtin::TextToInt
      } else if dst.is_float() {
        Builtin::TextToFloat
      } else if dst.is_primitive(TIMESTAMP) {
        Builtin::TextToTimestamp
      } else if dst.is_primitive(UUID) {
        Builtin::TextToUuid
      } else if dst.is_bytes() {
        Builtin::TextToBytes
      } else {
        return None;
      }
    } else {
      return None;
    };
    Some(builtin)
  }

  /// Function name in the runtime's `convert` module.
  pub fn function(&self) -> &'static str {
    match self {
      Builtin::IntToText => "int_to_text",
      Builtin::TextToInt => "text_to_int",
      Builtin::FloatToText => "float_to_text",
      Builtin::TextToFloat => "text_to_float",
      Builtin::TimestampToText => "timestamp_to_text",
      Builtin::TextToTimestamp => "text_to_timestamp",
      Builtin::UuidToText => "uuid_to_text",
      Builtin::TextToUuid => "text_to_uuid",
      Builtin::TextToBytes => "text_to_bytes",
      Builtin::BytesToText => "bytes_to_text",
    }
  }

  /// Generic over the destination type.
  pub fn is_generic(&self) -> bool {
    matches!(self, Builtin::TextToInt | Builtin::TextToFloat)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unmapped {
  Narrowing { src: TypeRef, dst: TypeRef },
  NoConversion { src: TypeRef, dst: TypeRef },
}

impl fmt::Display for Unmapped {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Unmapped::Narrowing { src, dst } => write!(f, "narrowing `{}` to `{}` is not allowed", src, dst),
      Unmapped::NoConversion { src, dst } => write!(f, "no conversion from `{}` to `{}`", src, dst),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
  Identity,
  /// `as` cast to the named primitive.
  Cast(String),
  Builtin(Builtin),
  /// Generated record helper.
  StructFn(String),
  /// Generated element-wise helper.
  SliceFn(String),
  PointerWrap { kind: RefKind, inner: Box<Strategy> },
  /// One-element `Vec` around the converted value.
  SingleToSlice(Box<Strategy>),
  Unmapped(Unmapped),
}

impl Strategy {
  pub fn is_unmapped(&self) -> bool {
    matches!(self, Strategy::Unmapped(_))
  }

  /// Names of the generated helpers this strategy calls.
  pub fn helpers<'a>(&'a self, out: &mut Vec<&'a str>) {
    match self {
      Strategy::StructFn(name) | Strategy::SliceFn(name) => out.push(name),
      Strategy::PointerWrap { inner, .. } | Strategy::SingleToSlice(inner) => inner.helpers(out),
      _ => {}
    }
  }
}

/// Picks the conversion from `src` to `dst`. Both types must be canonical.
/// May plan (and commit) helpers through the session's registry.
pub fn resolve(session: &Session, src: &TypeRef, dst: &TypeRef, policy: Policy) -> Result<Strategy> {
  let strategy = resolve_inner(session, src, dst, policy)?;
  debug!(%src, %dst, ?strategy, "resolved");
  Ok(strategy)
}

fn resolve_inner(session: &Session, src: &TypeRef, dst: &TypeRef, policy: Policy) -> Result<Strategy> {
  if src == dst {
    return Ok(Strategy::Identity);
  }

  if let (Some(src_width), Some(dst_width)) = (src.numeric_width(), dst.numeric_width()) {
    if src_width > dst_width && !policy.allow_narrowing {
      return Ok(unmapped_narrowing(src, dst));
    }
    return Ok(match dst {
      TypeRef::Primitive(name) => Strategy::Cast(name.clone()),
      _ => no_conversion(src, dst),
    });
  }

  if let Some(builtin) = Builtin::lookup(src, dst) {
    return Ok(Strategy::Builtin(builtin));
  }

  match (src, dst) {
    (
      TypeRef::Container {
        kind: src_kind,
        element: src_element,
      },
      TypeRef::Container {
        kind: dst_kind,
        element: dst_element,
      },
    ) if src_kind == dst_kind => {
      let element_policy = Policy {
        single_to_slice: false,
        ..policy
      };
      return Ok(match resolve_inner(session, src_element, dst_element, element_policy)? {
        Strategy::Identity => Strategy::Identity,
        Strategy::Unmapped(reason) => Strategy::Unmapped(reason),
        _ => match session.request_sequence(src, dst)? {
          Some(name) => Strategy::SliceFn(name),
          None => no_conversion(src, dst),
        },
      });
    }
    (
      TypeRef::Reference {
        kind: src_kind,
        pointee: src_pointee,
      },
      TypeRef::Reference {
        kind: dst_kind,
        pointee: dst_pointee,
      },
    ) if src_kind == dst_kind => {
      return Ok(match resolve_inner(session, src_pointee, dst_pointee, policy)? {
        Strategy::Unmapped(reason) => Strategy::Unmapped(reason),
        inner => Strategy::PointerWrap {
          kind: *dst_kind,
          inner: Box::new(inner),
        },
      });
    }
    (TypeRef::Named { .. }, TypeRef::Named { .. }) => {
      return Ok(match session.request_record(src, dst)? {
        Some(name) => Strategy::StructFn(name),
        None => no_conversion(src, dst),
      });
    }
    _ => {}
  }

  if policy.single_to_slice {
    if let TypeRef::Container {
      kind: ContainerKind::Vec,
      element,
    } = dst
    {
      if !matches!(src, TypeRef::Container { .. }) {
        let inner_policy = Policy {
          single_to_slice: false,
          ..policy
        };
        let inner = resolve_inner(session, src, element, inner_policy)?;
        if !inner.is_unmapped() {
          return Ok(Strategy::SingleToSlice(Box::new(inner)));
        }
      }
    }
  }

  Ok(no_conversion(src, dst))
}

fn no_conversion(src: &TypeRef, dst: &TypeRef) -> Strategy {
  Strategy::Unmapped(Unmapped::NoConversion {
    src: src.clone(),
    dst: dst.clone(),
  })
}

fn unmapped_narrowing(src: &TypeRef, dst: &TypeRef) -> Strategy {
  Strategy::Unmapped(Unmapped::Narrowing {
    src: src.clone(),
    dst: dst.clone(),
  })
}
