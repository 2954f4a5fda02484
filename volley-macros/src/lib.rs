use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{spanned::Spanned, Ident, ItemFn};

/// Registers a benchmark with the process-wide registry.
///
/// Goes on a plain function taking no arguments and returning a value that implements
/// `volley::Benchmark`. The function is kept as written and is called once, the first time
/// the registry is used. The crate using this attribute must depend on `linkme`.
///
/// # Example
/// ```ignore
/// use volley::prelude::*;
///
/// #[benchmark]
/// fn block_number() -> BlockNumber {
///     BlockNumber
/// }
/// ```
#[proc_macro_attribute]
pub fn benchmark(attr: TokenStream, item: TokenStream) -> TokenStream {
    benchmark_internal(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn benchmark_internal(attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    if !attr.is_empty() {
        return Err(syn::Error::new(attr.span(), "#[benchmark] takes no arguments"));
    }

    let input = syn::parse2::<ItemFn>(item)?;
    let sig = &input.sig;
    if sig.asyncness.is_some() {
        return Err(syn::Error::new(sig.span(), "#[benchmark] fn must not be async"));
    }
    if !sig.inputs.is_empty() || !sig.generics.params.is_empty() {
        return Err(syn::Error::new(
            sig.span(),
            "#[benchmark] fn must take no arguments and no generics",
        ));
    }

    let name = &sig.ident;
    let ctor = Ident::new(&format!("__volley_ctor_{name}"), Span::call_site());
    let entry = Ident::new(
        &format!("__VOLLEY_BENCHMARK_{}", name.to_string().to_uppercase()),
        Span::call_site(),
    );

    Ok(quote! {
        #input

        #[doc(hidden)]
        fn #ctor() -> ::std::sync::Arc<dyn ::volley::Benchmark> {
            ::std::sync::Arc::new(#name())
        }

        #[doc(hidden)]
        #[::volley::registry::distributed_slice(::volley::registry::VOLLEY_BENCHMARKS)]
        static #entry: ::volley::registry::BenchmarkCtor = #ctor;
    })
}
