//! Derive macros for regionql
//!
//! Provides `#[derive(Region)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod region;

/// Derive `RegionEntity` metadata for a struct.
///
/// # Example
///
/// ```ignore
/// use regionql::Region;
///
/// #[derive(Region)]
/// #[region(name = "People", rename_all = "camelCase")]
/// struct Person {
///     #[region(id)]
///     id: i64,
///     first_name: String,
///     #[region(rename = "surname")]
///     last_name: String,
///     age: Option<u32>,
/// }
/// ```
///
/// # Generated
///
/// - `impl RegionEntity` returning a `&'static EntityMetadata` built on first use
///
/// # Attributes
///
/// - `#[region(name = "People")]` - Region name (defaults to the struct name)
/// - `#[region(rename_all = "camelCase")]` - Rename every property
///   (`camelCase`, `snake_case`, `PascalCase`, `lowercase`)
/// - `#[region(id)]` - Mark field as the identity property
/// - `#[region(rename = "name")]` - Map field to a different property name
/// - `#[region(kind = "string")]` - Override the inferred property kind
/// - `#[region(skip)]` - Leave the field out of the metadata
#[proc_macro_derive(Region, attributes(region))]
pub fn derive_region(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    region::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
