//! Rendering plans and helpers to Rust source.

use crate::error::{Error, Result};
use crate::path::access_tokens;
use crate::plan::{FieldMapping, Plan};
use crate::registry::{Helper, HelperBody};
use crate::resolve::Strategy;
use crate::source::{ModulePath, GENERATED_MARKER};
use crate::types::{ContainerKind, RefKind, TypeRef, TIMESTAMP, UUID};
use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote, ToTokens};

/// Where a converted value is read from.
#[derive(Debug, Clone)]
enum Source {
  /// A place of the source type, `src.a.b`.
  Place(TokenStream),
  /// An expression borrowing the source type, `item` or `&**item`.
  Ref(TokenStream),
}

impl Source {
  fn borrowed(&self) -> TokenStream {
    match self {
      Source::Place(place) => quote!(&#place),
      Source::Ref(expr) => expr.clone(),
    }
  }

  fn copied(&self) -> TokenStream {
    match self {
      Source::Place(place) => place.clone(),
      Source::Ref(expr) => {
        let expr = atom(expr);
        quote!(*#expr)
      }
    }
  }

  fn cloned(&self) -> TokenStream {
    let receiver = self.receiver();
    quote!(#receiver.clone())
  }

  fn receiver(&self) -> TokenStream {
    match self {
      Source::Place(place) => place.clone(),
      Source::Ref(expr) => atom(expr),
    }
  }

  // Box<T> → &T
  fn unboxed(&self) -> Source {
    match self {
      Source::Place(place) => Source::Ref(quote!(&*#place)),
      Source::Ref(expr) => {
        let expr = atom(expr);
        Source::Ref(quote!(&**#expr))
      }
    }
  }
}

// Parenthesizes anything but a plain identifier.
fn atom(expr: &TokenStream) -> TokenStream {
  if syn::parse2::<syn::Ident>(expr.clone()).is_ok() {
    expr.clone()
  } else {
    quote!((#expr))
  }
}

pub struct Emitter {
  module: String,
  runtime: syn::Path,
}

impl Emitter {
  /// Emits code living in `module`, reaching builtins through `runtime`.
  pub fn new(module: &ModulePath, runtime: &str) -> Result<Self> {
    let runtime = syn::parse_str(runtime)
      .map_err(|_| Error::Config(format!("runtime `{}` is not a valid path", runtime)))?;
    Ok(Self {
      module: module.to_string(),
      runtime,
    })
  }

  /// The body populating `dst` from `src`.
  pub fn body(&self, plan: &Plan, dst: &str, src: &str) -> TokenStream {
    let dst = format_ident!("{}", dst).into_token_stream();
    let src = format_ident!("{}", src).into_token_stream();
    let stmts = plan.mappings.iter().map(|m| self.assignment(m, &dst, &src));
    quote! {
      {
        #(#stmts)*
      }
    }
  }

  pub fn helper(&self, helper: &Helper) -> TokenStream {
    let name = format_ident!("{}", helper.name);
    let doc = format!(" {}: `{}` from `{}`.", GENERATED_MARKER, helper.dst, helper.src);
    let dst_ty = self.ty(&helper.dst);
    let src_ty = self.ty(&helper.src);

    match &helper.body {
      HelperBody::Record(plan) if plan.mappings.is_empty() => quote! {
        #[doc = #doc]
        fn #name(_dst: &mut #dst_ty, _src: &#src_ty) {}
      },
      HelperBody::Record(plan) => {
        let body = self.body(plan, "dst", "src");
        quote! {
          #[doc = #doc]
          fn #name(dst: &mut #dst_ty, src: &#src_ty) #body
        }
      }
      HelperBody::Sequence { kind, element } => {
        let src_element = element_of(&helper.src);
        let dst_element = element_of(&helper.dst);
        let src_element_ty = self.ty(src_element);
        let dst_element_ty = self.ty(dst_element);
        match kind {
          ContainerKind::Vec => {
            let value = self.value(element, &Source::Ref(quote!(item)), src_element, dst_element);
            quote! {
              #[doc = #doc]
              fn #name(dst: &mut Vec<#dst_element_ty>, src: &[#src_element_ty]) {
                *dst = src.iter().map(|item| #value).collect();
              }
            }
          }
          ContainerKind::Array(_) => {
            let stmt = match element {
              Strategy::StructFn(f) => {
                let f = format_ident!("{}", f);
                quote!(#f(slot, item);)
              }
              _ => {
                let value = self.value(element, &Source::Ref(quote!(item)), src_element, dst_element);
                quote!(*slot = #value;)
              }
            };
            quote! {
              #[doc = #doc]
              fn #name(dst: &mut #dst_ty, src: &#src_ty) {
                for (slot, item) in dst.iter_mut().zip(src.iter()) {
                  #stmt
                }
              }
            }
          }
        }
      }
    }
  }

  fn assignment(&self, mapping: &FieldMapping, dst: &TokenStream, src: &TokenStream) -> TokenStream {
    let target = access_tokens(dst, &mapping.dst_path);
    let place = access_tokens(src, &mapping.src_path);
    match &mapping.strategy {
      // populated in place
      Strategy::StructFn(f) | Strategy::SliceFn(f) => {
        let f = format_ident!("{}", f);
        quote!(#f(&mut #target, &#place);)
      }
      strategy => {
        let value = self.value(strategy, &Source::Place(place), &mapping.src_ty, &mapping.dst_ty);
        quote!(#target = #value;)
      }
    }
  }

  fn value(&self, strategy: &Strategy, src: &Source, src_ty: &TypeRef, dst_ty: &TypeRef) -> TokenStream {
    match strategy {
      Strategy::Identity if dst_ty.is_copy_scalar() => src.copied(),
      Strategy::Identity => src.cloned(),
      Strategy::Cast(ty) => {
        let ty = format_ident!("{}", ty);
        let value = src.copied();
        quote!(#value as #ty)
      }
      Strategy::Builtin(builtin) => {
        let runtime = &self.runtime;
        let f = format_ident!("{}", builtin.function());
        let arg = src.borrowed();
        if builtin.is_generic() {
          let ty = self.ty(dst_ty);
          quote!(#runtime::convert::#f::<#ty>(#arg))
        } else {
          quote!(#runtime::convert::#f(#arg))
        }
      }
      Strategy::StructFn(f) | Strategy::SliceFn(f) => {
        let f = format_ident!("{}", f);
        let arg = src.borrowed();
        quote! {
          {
            let mut out = Default::default();
            #f(&mut out, #arg);
            out
          }
        }
      }
      Strategy::PointerWrap {
        kind: RefKind::Option,
        inner,
      } => {
        let receiver = src.receiver();
        let value = self.value(inner, &Source::Ref(quote!(item)), pointee_of(src_ty), pointee_of(dst_ty));
        quote!(#receiver.as_ref().map(|item| #value))
      }
      Strategy::PointerWrap {
        kind: RefKind::Box,
        inner,
      } => {
        let value = self.value(inner, &src.unboxed(), pointee_of(src_ty), pointee_of(dst_ty));
        quote!(Box::new(#value))
      }
      Strategy::SingleToSlice(inner) => {
        let value = self.value(inner, src, src_ty, element_of(dst_ty));
        quote!(vec![#value])
      }
      Strategy::Unmapped(_) => quote!(Default::default()),
    }
  }

  /// Type as written from inside the emitting module.
  pub fn ty(&self, ty: &TypeRef) -> TokenStream {
    let runtime = &self.runtime;
    match ty {
      TypeRef::Primitive(name) if name == TIMESTAMP => quote!(#runtime::Timestamp),
      TypeRef::Primitive(name) if name == UUID => quote!(#runtime::Uuid),
      TypeRef::Primitive(name) => name.parse().unwrap_or_else(|_| quote!(_)),
      TypeRef::Container {
        kind: ContainerKind::Vec,
        element,
      } => {
        let element = self.ty(element);
        quote!(Vec<#element>)
      }
      TypeRef::Container {
        kind: ContainerKind::Array(len),
        element,
      } => {
        let element = self.ty(element);
        let len = Literal::usize_unsuffixed(*len);
        quote!([#element; #len])
      }
      TypeRef::Reference {
        kind: RefKind::Option,
        pointee,
      } => {
        let pointee = self.ty(pointee);
        quote!(Option<#pointee>)
      }
      TypeRef::Reference {
        kind: RefKind::Box,
        pointee,
      } => {
        let pointee = self.ty(pointee);
        quote!(Box<#pointee>)
      }
      TypeRef::Named { qualifier, name } => {
        let name = format_ident!("{}", name);
        if *qualifier == self.module || qualifier.is_empty() {
          quote!(#name)
        } else {
          let segments = qualifier.split("::").map(|s| format_ident!("{}", s));
          quote!(#(#segments::)* #name)
        }
      }
    }
  }
}

fn element_of(ty: &TypeRef) -> &TypeRef {
  match ty {
    TypeRef::Container { element, .. } => element,
    _ => ty,
  }
}

fn pointee_of(ty: &TypeRef) -> &TypeRef {
  match ty {
    TypeRef::Reference { pointee, .. } => pointee,
    _ => ty,
  }
}

/// Replaces the body of the function at `text` (a whole `fn` item, attributes
/// included) and pretty prints it.
pub fn render_function(text: &str, body: TokenStream) -> Result<String> {
  let mut item: syn::ItemFn = syn::parse_str(text).map_err(|err| Error::Emit {
    item: text.lines().find(|l| l.contains("fn ")).unwrap_or(text).trim().to_string(),
    message: err.to_string(),
  })?;
  item.block = Box::new(syn::parse2(body).map_err(|err| Error::Emit {
    item: item.sig.ident.to_string(),
    message: err.to_string(),
  })?);
  Ok(render(syn::Item::Fn(item)))
}

/// Pretty prints a generated item.
pub fn render_item(name: &str, tokens: TokenStream) -> Result<String> {
  let item: syn::Item = syn::parse2(tokens).map_err(|err| Error::Emit {
    item: name.to_string(),
    message: err.to_string(),
  })?;
  Ok(render(item))
}

fn render(item: syn::Item) -> String {
  prettyplease::unparse(&syn::File {
    shebang: None,
    attrs: vec![],
    items: vec![item],
  })
}
