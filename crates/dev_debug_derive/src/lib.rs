//! Procedural macros for dev_debug
//!
//! `#[derive(Inspect)]` implements `dev_debug::Inspect` and, for structs and
//! enums with data, `dev_debug::Object`.

use proc_macro::TokenStream;

mod attrs;
mod inspect;

/// Derive macro for `dev_debug::Inspect`.
///
/// Structs become keyed structures whose fields are tagged by their Rust
/// visibility: `pub` is public, `pub(crate)`/`pub(super)`/`pub(in ..)` is
/// protected, everything else is private. Unit enum variants normalize to
/// their name; variants with data become structures named `Type::Variant`.
///
/// # Attributes
///
/// - `#[inspect(name = "...")]` on the type - Replaces the reported type name
/// - `#[inspect(skip)]` - Leave the field out
/// - `#[inspect(rename = "...")]` - Report the field under another name
/// - `#[inspect(visibility = "public" | "protected" | "private")]` - Override the tag
/// - `#[inspect(parent)]` - The field embeds a base structure; its fields are
///   reported as inherited fields
/// - `#[inspect(id)]` - A `dev_debug::ObjectId` field used as the identity token
///
/// # Example
///
/// ```ignore
/// #[derive(Inspect)]
/// struct Admin {
///     #[inspect(parent)]
///     user: User,
///     pub(crate) permissions: Vec<String>,
///     #[inspect(skip)]
///     session_key: String,
/// }
/// ```
#[proc_macro_derive(Inspect, attributes(inspect))]
pub fn derive_inspect(input: TokenStream) -> TokenStream {
    inspect::derive_inspect_impl(input)
}
