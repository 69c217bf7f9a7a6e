//! `#[derive(Request)]`, `#[derive(Command)]` and `#[derive(Notification)]`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, GenericParam, Type, parse_macro_input, parse_quote};

pub enum Marker {
    Command,
    Notification,
}

pub fn derive_request_impl(input: TokenStream) -> TokenStream {
    let mut input = parse_macro_input!(input as DeriveInput);
    let response = match response_type(&input) {
        Ok(response) => response,
        Err(error) => return error.to_compile_error().into(),
    };
    bound_type_params(&mut input);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::courier::Request for #name #ty_generics #where_clause {
            type Response = #response;
        }
    };

    TokenStream::from(expanded)
}

pub fn derive_marker_impl(input: TokenStream, marker: Marker) -> TokenStream {
    let mut input = parse_macro_input!(input as DeriveInput);
    bound_type_params(&mut input);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let trait_path = match marker {
        Marker::Command => quote!(::courier::Command),
        Marker::Notification => quote!(::courier::Notification),
    };

    let expanded = quote! {
        impl #impl_generics #trait_path for #name #ty_generics #where_clause {}
    };

    TokenStream::from(expanded)
}

fn response_type(input: &DeriveInput) -> syn::Result<Type> {
    let mut response = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("request") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("response") {
                response = Some(meta.value()?.parse::<Type>()?);
                Ok(())
            } else {
                Err(meta.error("unknown attribute; expected `response = Type`"))
            }
        })?;
    }
    response.ok_or_else(|| {
        syn::Error::new_spanned(
            &input.ident,
            "missing `#[request(response = Type)]` on a `Request` derive",
        )
    })
}

/// Messages travel between tasks, so every type parameter must be
/// `Described + Send + Sync`.
fn bound_type_params(input: &mut DeriveInput) {
    let params: Vec<_> = input
        .generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(ty) => Some(ty.ident.clone()),
            _ => None,
        })
        .collect();
    let bounds = quote!(::courier::Described + ::core::marker::Send + ::core::marker::Sync);
    let where_clause = input.generics.make_where_clause();
    for param in params {
        where_clause.predicates.push(parse_quote!(#param: #bounds));
    }
}
