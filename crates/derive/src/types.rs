//! Infers a field's `source_type` tag from its Rust type, the way the
//! collector's compatibility matrix expects to see it (`"string"`,
//! `"integer"`, `"floating"`, `"boolean"`, `"timestamp"`, `"bytes"`,
//! `"array"`, or an `"enum"`/`"enum:{backing}"` tag for anything else).
//!
//! There is no trait-object or specialization trick here that could detect
//! "this type implements `BackedEnum`" at macro-expansion time — that's a
//! property of the final crate graph, not of a bare `syn::Type`. A field
//! backed by an enum must say so explicitly via `#[column(source_type =
//! "enum:integer")]`; left unannotated, an unrecognized type path becomes
//! the opaque `"enum"` tag, which the collector's compatibility matrix
//! always rejects.

use syn::{GenericArgument, PathArguments, Type};

pub fn infer_source_type(ty: &Type) -> (String, bool) {
    match ty {
        Type::Reference(reference) => {
            let (inner, nullable) = infer_source_type(&reference.elem);
            (inner, nullable)
        }
        Type::Path(path) => {
            let Some(segment) = path.path.segments.last() else {
                return ("enum".to_string(), false);
            };
            let name = segment.ident.to_string();

            if name == "Option" {
                if let Some(inner) = first_generic_type(segment) {
                    let (tag, _) = infer_source_type(inner);
                    return (tag, true);
                }
                return ("enum".to_string(), true);
            }

            if name == "Vec" {
                return match first_generic_type(segment) {
                    Some(Type::Path(inner)) if inner.path.is_ident("u8") => ("bytes".to_string(), false),
                    _ => ("array".to_string(), false),
                };
            }

            (scalar_tag(&name), false)
        }
        _ => ("enum".to_string(), false),
    }
}

fn first_generic_type(segment: &syn::PathSegment) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

fn scalar_tag(name: &str) -> String {
    match name {
        "String" | "str" => "string",
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64" | "u128" | "usize" => {
            "integer"
        }
        "f32" | "f64" => "floating",
        "bool" => "boolean",
        "NaiveDateTime" | "NaiveDate" | "NaiveTime" | "DateTime" => "timestamp",
        "Value" => "string",
        _ => "enum",
    }
    .to_string()
}
