//! Marker attributes for quickcopy.
//!
//! Both macros leave their input untouched. They only check the arguments
//! the generator reads, so mistakes surface at compile time.

extern crate proc_macro;

use proc_macro_error::{abort, proc_macro_error};
use quickcopy_codegen::{Annotation, FieldOptions};
use quote::quote;
use syn::{parse_macro_input, AttributeArgs, Data, DeriveInput, Fields, FnArg, ItemFn};

/// Marks a copy function whose body is generated by the `quickcopy` tool.
///
/// ```ignore
/// #[quickcopy(ignore_case, fields(label = "name"))]
/// fn copy_user(dst: &mut UserDto, src: &User) {}
/// ```
#[proc_macro_attribute]
#[proc_macro_error]
pub fn quickcopy(
  args: proc_macro::TokenStream,
  item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
  let args = parse_macro_input!(args as AttributeArgs);
  if let Err(err) = Annotation::from_nested(args.iter()) {
    abort!(err.span(), "{}", err.message());
  }

  let function = parse_macro_input!(item as ItemFn);
  let inputs = &function.sig.inputs;
  if inputs.len() != 2 {
    abort!(
      inputs,
      "A copy function takes exactly two parameters: (dst: &mut D, src: &S)"
    );
  }
  if let Some(FnArg::Receiver(receiver)) = inputs.first() {
    abort!(receiver, "A copy function can't take `self`");
  }

  let tokens = quote!(#function);
  tokens.into()
}

/// Registers the `#[copy(...)]` field attribute.
#[proc_macro_derive(QuickCopy, attributes(copy))]
#[proc_macro_error]
pub fn derive_quick_copy(tokens: proc_macro::TokenStream) -> proc_macro::TokenStream {
  let input = parse_macro_input!(tokens as DeriveInput);
  let fields = match input.data {
    Data::Struct(ref data) => match data.fields {
      Fields::Named(ref fields) => fields,
      _ => abort!(input.ident, "QuickCopy only supports structs with named fields."),
    },
    _ => abort!(input.ident, "QuickCopy only supports structs."),
  };
  for field in &fields.named {
    if let Err(err) = FieldOptions::from_attrs(&field.attrs) {
      abort!(err.span(), "{}", err.message());
    }
  }
  proc_macro::TokenStream::new()
}
