//! `#[derive(Resource)]`: reads `#[table]`/`#[column]`/`#[primary_key]`/
//! `#[deprecated]`/`#[filterable]`/`#[aggregate]`/`#[belongs_to]`/
//! `#[has_many]`/`#[one_to_one]`/`#[many_to_many]`/`#[index]`/
//! `#[tenant_scoped]` off a struct and transcribes them into a `'static
//! ResourceDescriptor`. No compatibility checks, no identifier validation —
//! that all happens at runtime in `semitexa_core`'s collector, which can
//! accumulate multiple errors where a proc-macro can only abort once.

mod codegen;
mod model;
mod types;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

#[proc_macro_derive(
    Resource,
    attributes(
        table,
        column,
        primary_key,
        deprecated,
        filterable,
        aggregate,
        belongs_to,
        has_many,
        one_to_one,
        many_to_many,
        index,
        tenant_scoped
    )
)]
pub fn derive_resource(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = model::parse(&input).and_then(|model| codegen::generate(&model));

    match expanded {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
