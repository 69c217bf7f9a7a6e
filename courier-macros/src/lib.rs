//! Derive macros for Courier message types.
//!
//! - `#[derive(Described)]`: a stable [`TypeKey`] from the module path and name
//! - `#[derive(Request)]` with `#[request(response = T)]`
//! - `#[derive(Command)]`
//! - `#[derive(Notification)]`
//!
//! [`TypeKey`]: https://docs.rs/courier/latest/courier/enum.TypeKey.html

use proc_macro::TokenStream;

mod described;
mod message;

/// Derive macro implementing `Described`.
///
/// The key path defaults to `module_path!()::Name`; override it with
/// `#[described(path = "app::User")]`. Type parameters become key arguments
/// and must themselves be `Described`.
#[proc_macro_derive(Described, attributes(described))]
pub fn derive_described(input: TokenStream) -> TokenStream {
    described::derive_described_impl(input)
}

/// Derive macro implementing `Request`.
///
/// ```rust,ignore
/// #[derive(Described, Request)]
/// #[request(response = User)]
/// struct GetUser(u64);
/// ```
#[proc_macro_derive(Request, attributes(request))]
pub fn derive_request(input: TokenStream) -> TokenStream {
    message::derive_request_impl(input)
}

/// Derive macro implementing `Command`.
#[proc_macro_derive(Command)]
pub fn derive_command(input: TokenStream) -> TokenStream {
    message::derive_marker_impl(input, message::Marker::Command)
}

/// Derive macro implementing `Notification`.
#[proc_macro_derive(Notification)]
pub fn derive_notification(input: TokenStream) -> TokenStream {
    message::derive_marker_impl(input, message::Marker::Notification)
}
