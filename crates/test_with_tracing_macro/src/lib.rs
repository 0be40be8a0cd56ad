// Copyright (c) The Sevault Authors.
// Licensed under the MIT License.

//! Proc-macro half of `test_with_tracing`; use that crate instead.

use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;
use syn::ItemFn;

/// Marks a test that installs the tracing subscriber before its body runs.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "this attribute takes no arguments",
        )
        .to_compile_error()
        .into();
    }
    let mut func = parse_macro_input!(item as ItemFn);
    let block = func.block;
    func.block = Box::new(syn::parse_quote!({
        ::test_with_tracing::init();
        #block
    }));
    quote! {
        #[::core::prelude::v1::test]
        #func
    }
    .into()
}
