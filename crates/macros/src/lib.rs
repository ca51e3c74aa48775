#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

use proc_macro2::TokenStream;
use quote::quote;
use syn::ItemFn;
use syn::parse_macro_input;

/// Marks the function as a `#[test]` and initialises `rcterm_utilities::test_logger()`
/// before the body runs. Other attributes, such as `#[should_panic]`, are kept.
///
/// The crate using this attribute must depend on `rcterm_utilities`.
#[proc_macro_attribute]
pub fn rcterm_test(_attr: proc_macro::TokenStream, item: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    rcterm_test_impl(input).into()
}

fn rcterm_test_impl(input: ItemFn) -> TokenStream {
    let block = &input.block;
    let attrs = &input.attrs;
    let sig = &input.sig;
    let vis = &input.vis;

    quote! {
        #[test]
        #(#attrs)*
        #vis #sig {
            rcterm_utilities::test_logger();
            #block
        }
    }
}
