//! `#[derive(Described)]`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, GenericParam, LitStr, parse_macro_input, parse_quote};

pub fn derive_described_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(error) => error.to_compile_error().into(),
    }
}

fn expand(mut input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = input.ident.clone();
    let path = custom_path(&input)?;

    let mut args = Vec::new();
    for param in &input.generics.params {
        match param {
            GenericParam::Type(ty) => args.push(ty.ident.clone()),
            GenericParam::Lifetime(lifetime) => {
                return Err(syn::Error::new_spanned(
                    lifetime,
                    "`Described` types must be 'static; lifetime parameters are not supported",
                ));
            }
            GenericParam::Const(constant) => {
                return Err(syn::Error::new_spanned(
                    constant,
                    "const parameters are not supported; implement `Described` by hand",
                ));
            }
        }
    }

    {
        let where_clause = input.generics.make_where_clause();
        for arg in &args {
            where_clause
                .predicates
                .push(parse_quote!(#arg: ::courier::Described));
        }
    }
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let path = match path {
        Some(path) => quote!(#path),
        None => {
            let suffix = format!("::{name}");
            quote!(::core::concat!(::core::module_path!(), #suffix))
        }
    };
    let key = if args.is_empty() {
        quote!(::courier::TypeKey::named(#path))
    } else {
        let args = args
            .iter()
            .map(|arg| quote!(<#arg as ::courier::Described>::type_key()));
        quote!(::courier::TypeKey::generic(#path, [#(#args),*]))
    };

    Ok(quote! {
        impl #impl_generics ::courier::Described for #name #ty_generics #where_clause {
            fn type_key() -> ::courier::TypeKey {
                #key
            }
        }
    })
}

fn custom_path(input: &DeriveInput) -> syn::Result<Option<LitStr>> {
    let mut path = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("described") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("path") {
                path = Some(meta.value()?.parse::<LitStr>()?);
                Ok(())
            } else {
                Err(meta.error("unknown attribute; expected `path = \"...\"`"))
            }
        })?;
    }
    Ok(path)
}
