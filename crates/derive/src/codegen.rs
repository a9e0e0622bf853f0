//! Turns a parsed [`crate::model::ResourceModel`] into the `impl Resource`
//! the derive emits. Every annotation becomes a literal field in a `static
//! ResourceDescriptor` — there is nothing here to branch on business rules,
//! only token construction.

use proc_macro2::TokenStream;
use quote::quote;
use syn::Result;

use crate::model::{
    ColumnAttr, DefaultLiteral, FieldModel, IndexAttr, RelationAttr, RelationKindLit, ResourceModel, TenantScopedAttr,
};

pub fn generate(model: &ResourceModel) -> Result<TokenStream> {
    let struct_name = &model.struct_name;
    let table_name = &model.table.name;
    let map_to = option_str_tokens(&model.table.map_to);
    let has_domain_mapping = model.table.map_to.is_some();

    let field_tokens: Vec<TokenStream> = model.fields.iter().map(field_tokens).collect::<Result<_>>()?;
    let index_tokens: Vec<TokenStream> = model.indexes.iter().map(index_tokens).collect();
    let tenant_scoped_tokens = tenant_scoped_tokens(&model.tenant_scoped);

    Ok(quote! {
        #[automatically_derived]
        impl ::semitexa_core::Resource for #struct_name {
            fn descriptor() -> &'static ::semitexa_core::ResourceDescriptor {
                static FIELDS: &[::semitexa_core::FieldAnnotation] = &[ #(#field_tokens),* ];
                static CLASS_INDEXES: &[::semitexa_core::ClassIndexAnnotation] = &[ #(#index_tokens),* ];
                static DESCRIPTOR: ::semitexa_core::ResourceDescriptor = ::semitexa_core::ResourceDescriptor {
                    table_name: #table_name,
                    map_to: #map_to,
                    has_domain_mapping: #has_domain_mapping,
                    fields: FIELDS,
                    class_indexes: CLASS_INDEXES,
                    tenant_scoped: #tenant_scoped_tokens,
                };
                &DESCRIPTOR
            }
        }
    })
}

fn field_tokens(field: &FieldModel) -> Result<TokenStream> {
    let property_name = &field.property_name;
    let source_type = &field.source_type;
    let column = column_tokens(field.column.as_ref(), field.nullable_from_type)?;
    let primary_key = match &field.primary_key {
        Some(pk) => {
            let strategy = pk_strategy_tokens(pk.strategy.as_deref());
            quote! { Some(#strategy) }
        }
        None => quote! { None },
    };
    let deprecated = field.deprecated;
    let filterable = match &field.filterable {
        Some(f) => {
            let name = f.name.as_deref().unwrap_or("");
            quote! { Some(#name) }
        }
        None => quote! { None },
    };
    let aggregate = field.aggregate;
    let relation = match &field.relation {
        Some(r) => {
            let tokens = relation_tokens(r);
            quote! { Some(#tokens) }
        }
        None => quote! { None },
    };

    Ok(quote! {
        ::semitexa_core::FieldAnnotation {
            property_name: #property_name,
            source_type: #source_type,
            column: #column,
            primary_key: #primary_key,
            deprecated: #deprecated,
            filterable: #filterable,
            aggregate: #aggregate,
            relation: #relation,
        }
    })
}

fn column_tokens(column: Option<&ColumnAttr>, nullable_from_type: bool) -> Result<TokenStream> {
    let Some(column) = column else {
        return Ok(quote! { None });
    };

    let sql_type = column_type_tokens(column.sql_type.as_deref().unwrap_or(""));
    let length = option_u32_tokens(column.length);
    let precision = option_u32_tokens(column.precision);
    let scale = option_u32_tokens(column.scale);
    let nullable = column.nullable.unwrap_or(nullable_from_type);
    let name = option_str_tokens(&column.name);
    let default = match &column.default {
        Some(DefaultLiteral::Int(v)) => quote! { Some(::semitexa_core::AnnotationLiteral::Int(#v)) },
        Some(DefaultLiteral::Float(v)) => quote! { Some(::semitexa_core::AnnotationLiteral::Float(#v)) },
        Some(DefaultLiteral::Bool(v)) => quote! { Some(::semitexa_core::AnnotationLiteral::Bool(#v)) },
        Some(DefaultLiteral::Str(v)) => quote! { Some(::semitexa_core::AnnotationLiteral::Str(#v)) },
        None => quote! { None },
    };

    Ok(quote! {
        Some(::semitexa_core::ColumnAnnotation {
            sql_type: #sql_type,
            length: #length,
            precision: #precision,
            scale: #scale,
            default: #default,
            nullable: #nullable,
            name: #name,
        })
    })
}

fn index_tokens(index: &IndexAttr) -> TokenStream {
    let columns = &index.columns;
    let unique = index.unique;
    let name = option_str_tokens(&index.name);
    quote! {
        ::semitexa_core::ClassIndexAnnotation {
            columns: &[ #(#columns),* ],
            unique: #unique,
            name: #name,
        }
    }
}

fn tenant_scoped_tokens(tenant_scoped: &Option<TenantScopedAttr>) -> TokenStream {
    match tenant_scoped {
        Some(_) => quote! { Some(::semitexa_core::TenantStrategy::SameStorage) },
        None => quote! { None },
    }
}

fn relation_tokens(relation: &RelationAttr) -> TokenStream {
    let kind = match relation.kind {
        RelationKindLit::BelongsTo => quote! { ::semitexa_core::RelationKind::BelongsTo },
        RelationKindLit::HasMany => quote! { ::semitexa_core::RelationKind::HasMany },
        RelationKindLit::OneToOne => quote! { ::semitexa_core::RelationKind::OneToOne },
        RelationKindLit::ManyToMany => quote! { ::semitexa_core::RelationKind::ManyToMany },
    };
    let target_table = &relation.target;
    let foreign_key = option_str_tokens(&relation.foreign_key);
    let pivot_table = option_str_tokens(&relation.pivot_table);
    let related_key = option_str_tokens(&relation.related_key);
    let on_delete = match &relation.on_delete {
        Some(raw) => {
            let action = fk_action_tokens(raw);
            quote! { Some(#action) }
        }
        None => quote! { None },
    };
    let on_update = match &relation.on_update {
        Some(raw) => {
            let action = fk_action_tokens(raw);
            quote! { Some(#action) }
        }
        None => quote! { None },
    };

    quote! {
        ::semitexa_core::RelationAnnotation {
            kind: #kind,
            target_table: #target_table,
            foreign_key: #foreign_key,
            pivot_table: #pivot_table,
            related_key: #related_key,
            on_delete: #on_delete,
            on_update: #on_update,
        }
    }
}

fn column_type_tokens(raw: &str) -> TokenStream {
    match raw.to_ascii_lowercase().as_str() {
        "varchar" => quote! { ::semitexa_core::ColumnType::Varchar },
        "char" => quote! { ::semitexa_core::ColumnType::Char },
        "text" => quote! { ::semitexa_core::ColumnType::Text },
        "mediumtext" => quote! { ::semitexa_core::ColumnType::MediumText },
        "longtext" => quote! { ::semitexa_core::ColumnType::LongText },
        "tinyint" => quote! { ::semitexa_core::ColumnType::TinyInt },
        "smallint" => quote! { ::semitexa_core::ColumnType::SmallInt },
        "int" => quote! { ::semitexa_core::ColumnType::Int },
        "bigint" => quote! { ::semitexa_core::ColumnType::BigInt },
        "float" => quote! { ::semitexa_core::ColumnType::Float },
        "double" => quote! { ::semitexa_core::ColumnType::Double },
        "decimal" => quote! { ::semitexa_core::ColumnType::Decimal },
        "boolean" | "bool" => quote! { ::semitexa_core::ColumnType::Boolean },
        "datetime" => quote! { ::semitexa_core::ColumnType::DateTime },
        "timestamp" => quote! { ::semitexa_core::ColumnType::Timestamp },
        "date" => quote! { ::semitexa_core::ColumnType::Date },
        "time" => quote! { ::semitexa_core::ColumnType::Time },
        "year" => quote! { ::semitexa_core::ColumnType::Year },
        "json" => quote! { ::semitexa_core::ColumnType::Json },
        "blob" => quote! { ::semitexa_core::ColumnType::Blob },
        "binary" => quote! { ::semitexa_core::ColumnType::Binary },
        // An unrecognized `sql_type` string falls back to `Varchar` rather
        // than aborting compilation — the collector's compatibility matrix
        // is where a genuinely wrong type gets reported as data, not here.
        _ => quote! { ::semitexa_core::ColumnType::Varchar },
    }
}

fn pk_strategy_tokens(raw: Option<&str>) -> TokenStream {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("uuid") => quote! { ::semitexa_core::PkStrategy::Uuid },
        Some("manual") => quote! { ::semitexa_core::PkStrategy::Manual },
        _ => quote! { ::semitexa_core::PkStrategy::Auto },
    }
}

fn fk_action_tokens(raw: &str) -> TokenStream {
    match raw.to_ascii_lowercase().as_str() {
        "cascade" => quote! { ::semitexa_core::ForeignKeyAction::Cascade },
        "set_null" => quote! { ::semitexa_core::ForeignKeyAction::SetNull },
        "no_action" => quote! { ::semitexa_core::ForeignKeyAction::NoAction },
        _ => quote! { ::semitexa_core::ForeignKeyAction::Restrict },
    }
}

fn option_str_tokens(value: &Option<String>) -> TokenStream {
    match value {
        Some(v) => quote! { Some(#v) },
        None => quote! { None },
    }
}

fn option_u32_tokens(value: Option<u32>) -> TokenStream {
    match value {
        Some(v) => quote! { Some(#v) },
        None => quote! { None },
    }
}
