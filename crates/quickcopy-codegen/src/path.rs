use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use std::fmt;
use std::str::FromStr;
use syn::{Expr, Member};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("Empty field path")]
  Empty,
  #[error("Invalid field path: `{0}`")]
  InvalidExpression(String),
  #[error("Tuple index `{0}` is not supported, fields must be named")]
  TupleIndex(String),
  #[error("`{0}` can't name a field")]
  Reserved(String),
}

// Keywords that have no raw form.
const RESERVED: &[&str] = &["self", "Self", "super", "crate"];

/// A dotted field path such as `address.city`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
  pub fn new(segments: Vec<String>) -> Self {
    Self(segments)
  }

  pub fn segments(&self) -> &[String] {
    &self.0
  }
}

impl FromStr for FieldPath {
  type Err = Error;

  fn from_str(src: &str) -> Result<Self, Error> {
    let src = src.trim();
    if src.is_empty() {
      return Err(Error::Empty);
    }
    let expr: Expr = syn::parse_str(src).map_err(|_| Error::InvalidExpression(src.to_string()))?;
    let mut segments = vec![];
    collect(&expr, src, &mut segments)?;
    if let Some(segment) = segments.iter().find(|s| RESERVED.contains(&s.as_str())) {
      return Err(Error::Reserved(segment.clone()));
    }
    Ok(Self(segments))
  }
}

impl fmt::Display for FieldPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0.join("."))
  }
}

// {a.b.c} => [a, b, c]
fn collect(expr: &Expr, src: &str, out: &mut Vec<String>) -> Result<(), Error> {
  match expr {
    Expr::Field(field) => {
      collect(&field.base, src, out)?;
      match field.member {
        Member::Named(ref ident) => out.push(unraw(&ident.to_string())),
        Member::Unnamed(ref index) => return Err(Error::TupleIndex(index.index.to_string())),
      }
      Ok(())
    }
    Expr::Path(path) if path.qself.is_none() && path.path.segments.len() == 1 => {
      out.push(unraw(&path.path.segments[0].ident.to_string()));
      Ok(())
    }
    _ => Err(Error::InvalidExpression(src.to_string())),
  }
}

/// `r#type` and `type` name the same field.
pub fn unraw(name: &str) -> String {
  name.strip_prefix("r#").unwrap_or(name).to_string()
}

/// `{base}.a.b` for access segments.
pub fn access_tokens(base: &TokenStream, segments: &[String]) -> TokenStream {
  let idents = segments.iter().map(|s| field_ident(s));
  quote! {
    #base #(. #idents)*
  }
}

fn field_ident(name: &str) -> syn::Ident {
  if syn::parse_str::<syn::Ident>(name).is_ok() {
    format_ident!("{}", name)
  } else {
    format_ident!("r#{}", name)
  }
}

#[test]
fn test_ident() {
  let path: FieldPath = "a".parse().unwrap();
  let base = quote!(src);
  let expected: TokenStream = syn::parse_quote! {
    src.a
  };
  assert_eq!(access_tokens(&base, path.segments()).to_string(), expected.to_string());
}

#[test]
fn test_field_deep() {
  let path: FieldPath = "a.b.c.d".parse().unwrap();
  assert_eq!(path.segments(), &["a", "b", "c", "d"]);
  assert_eq!(path.to_string(), "a.b.c.d");
  let base = quote!(dst);
  let expected: TokenStream = syn::parse_quote! {
    dst.a.b.c.d
  };
  assert_eq!(access_tokens(&base, path.segments()).to_string(), expected.to_string());
}

#[test]
fn test_raw_ident() {
  let path: FieldPath = "r#type".parse().unwrap();
  assert_eq!(path.segments(), &["type"]);
  let expected: TokenStream = syn::parse_quote! {
    src.r#type
  };
  assert_eq!(access_tokens(&quote!(src), path.segments()).to_string(), expected.to_string());
}

#[test]
fn test_invalid() {
  assert_eq!("".parse::<FieldPath>(), Err(Error::Empty));
  assert_eq!("a.0".parse::<FieldPath>(), Err(Error::TupleIndex("0".to_string())));
  assert!(matches!("a + b".parse::<FieldPath>(), Err(Error::InvalidExpression(_))));
  assert!(matches!("a::b".parse::<FieldPath>(), Err(Error::InvalidExpression(_))));
}

#[test]
fn test_keywords_without_raw_form() {
  assert_eq!("self".parse::<FieldPath>(), Err(Error::Reserved("self".to_string())));
  assert!("Self".parse::<FieldPath>().is_err());
  assert!("crate".parse::<FieldPath>().is_err());
  assert!("a.self".parse::<FieldPath>().is_err());
  assert!("a.super".parse::<FieldPath>().is_err());
  assert!("r#match".parse::<FieldPath>().is_ok());
}
