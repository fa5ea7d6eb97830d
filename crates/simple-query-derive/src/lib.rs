//! Derive macros for simple-query
//!
//! Provides `#[derive(ReadModel)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod read_model;

/// Derive `ReadModel` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use simple_query::ReadModel;
///
/// #[derive(ReadModel)]
/// struct UserSummary {
///     #[read_model(column = "id")]
///     identifier: i64,
///     #[read_model(column = "name")]
///     full_name: Option<String>,
///     email: String,
/// }
/// ```
///
/// # Attributes
///
/// - `#[read_model(column = "name")]` - Read the field from a differently named column
/// - `#[read_model(skip)]` - Not read from the row; filled with `Default::default()`
#[proc_macro_derive(ReadModel, attributes(read_model))]
pub fn derive_read_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    read_model::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
