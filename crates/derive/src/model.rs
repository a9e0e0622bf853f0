//! Reads a `#[derive(Resource)]` input's attributes into a plain struct,
//! with no cross-checking between fields — `#[column]` and `#[belongs_to]`
//! are parsed independently even though the collector will reject a field
//! carrying both. That check, like every other compatibility check, is the
//! collector's job at runtime, not this macro's at expansion time.

use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Result};

use crate::types::infer_source_type;

pub struct TableAttr {
    pub name: String,
    pub map_to: Option<String>,
}

#[derive(Default)]
pub struct IndexAttr {
    pub columns: Vec<String>,
    pub unique: bool,
    pub name: Option<String>,
}

#[derive(Default)]
pub struct TenantScopedAttr {
    pub strategy: Option<String>,
}

#[derive(Default)]
pub struct ColumnAttr {
    pub sql_type: Option<String>,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub default: Option<DefaultLiteral>,
    pub nullable: Option<bool>,
    pub name: Option<String>,
    pub source_type_override: Option<String>,
}

pub enum DefaultLiteral {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

#[derive(Default)]
pub struct PrimaryKeyAttr {
    pub strategy: Option<String>,
}

#[derive(Default)]
pub struct FilterableAttr {
    pub name: Option<String>,
}

pub struct RelationAttr {
    pub kind: RelationKindLit,
    pub target: String,
    pub foreign_key: Option<String>,
    pub pivot_table: Option<String>,
    pub related_key: Option<String>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

#[derive(Clone, Copy)]
pub enum RelationKindLit {
    BelongsTo,
    HasMany,
    OneToOne,
    ManyToMany,
}

pub struct FieldModel {
    pub property_name: String,
    pub source_type: String,
    pub nullable_from_type: bool,
    pub column: Option<ColumnAttr>,
    pub primary_key: Option<PrimaryKeyAttr>,
    pub deprecated: bool,
    pub filterable: Option<FilterableAttr>,
    pub aggregate: bool,
    pub relation: Option<RelationAttr>,
}

pub struct ResourceModel {
    pub struct_name: syn::Ident,
    pub table: TableAttr,
    pub indexes: Vec<IndexAttr>,
    pub tenant_scoped: Option<TenantScopedAttr>,
    pub fields: Vec<FieldModel>,
}

pub fn parse(input: &DeriveInput) -> Result<ResourceModel> {
    let table = parse_table(&input.attrs)?.ok_or_else(|| {
        syn::Error::new_spanned(input, "#[derive(Resource)] requires a #[table(name = \"...\")] attribute")
    })?;

    let mut indexes = Vec::new();
    for attr in &input.attrs {
        if attr.path().is_ident("index") {
            indexes.push(parse_index(attr)?);
        }
    }

    let tenant_scoped = parse_tenant_scoped(&input.attrs)?;

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(input, "#[derive(Resource)] only applies to structs"));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(input, "#[derive(Resource)] requires named fields"));
    };

    let mut fields = Vec::new();
    for field in &named.named {
        let property_name = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "field has no name"))?
            .to_string();

        let (mut source_type, nullable_from_type) = infer_source_type(&field.ty);
        let column = parse_column(&field.attrs)?;
        if let Some(column) = &column {
            if let Some(override_type) = &column.source_type_override {
                source_type = override_type.clone();
            }
        }

        fields.push(FieldModel {
            property_name,
            source_type,
            nullable_from_type,
            column,
            primary_key: parse_primary_key(&field.attrs)?,
            deprecated: has_flag(&field.attrs, "deprecated"),
            filterable: parse_filterable(&field.attrs)?,
            aggregate: has_flag(&field.attrs, "aggregate"),
            relation: parse_relation(&field.attrs)?,
        });
    }

    Ok(ResourceModel {
        struct_name: input.ident.clone(),
        table,
        indexes,
        tenant_scoped,
        fields,
    })
}

fn has_flag(attrs: &[Attribute], ident: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(ident))
}

fn find<'a>(attrs: &'a [Attribute], ident: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|attr| attr.path().is_ident(ident))
}

fn parse_table(attrs: &[Attribute]) -> Result<Option<TableAttr>> {
    let Some(attr) = find(attrs, "table") else {
        return Ok(None);
    };

    let mut name = None;
    let mut map_to = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("name") {
            name = Some(meta.value()?.parse::<LitStr>()?.value());
        } else if meta.path.is_ident("map_to") {
            map_to = Some(meta.value()?.parse::<LitStr>()?.value());
        } else {
            return Err(meta.error("unrecognized key in #[table(...)]"));
        }
        Ok(())
    })?;

    let name = name.ok_or_else(|| syn::Error::new_spanned(attr, "#[table(...)] requires a `name`"))?;
    Ok(Some(TableAttr { name, map_to }))
}

fn parse_index(attr: &Attribute) -> Result<IndexAttr> {
    let mut out = IndexAttr::default();
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("columns") {
            meta.parse_nested_meta(|inner| {
                if let Some(ident) = inner.path.get_ident() {
                    out.columns.push(ident.to_string());
                    return Ok(());
                }
                Err(inner.error("expected a bare column identifier"))
            })?;
        } else if meta.path.is_ident("unique") {
            out.unique = true;
        } else if meta.path.is_ident("name") {
            out.name = Some(meta.value()?.parse::<LitStr>()?.value());
        } else {
            return Err(meta.error("unrecognized key in #[index(...)]"));
        }
        Ok(())
    })?;
    Ok(out)
}

fn parse_tenant_scoped(attrs: &[Attribute]) -> Result<Option<TenantScopedAttr>> {
    let Some(attr) = find(attrs, "tenant_scoped") else {
        return Ok(None);
    };

    let mut out = TenantScopedAttr::default();
    if matches!(attr.meta, syn::Meta::List(_)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("strategy") {
                out.strategy = Some(meta.value()?.parse::<LitStr>()?.value());
            } else {
                return Err(meta.error("unrecognized key in #[tenant_scoped(...)]"));
            }
            Ok(())
        })?;
    }
    Ok(Some(out))
}

fn parse_column(attrs: &[Attribute]) -> Result<Option<ColumnAttr>> {
    let Some(attr) = find(attrs, "column") else {
        return Ok(None);
    };

    if !matches!(attr.meta, syn::Meta::List(_)) {
        return Err(syn::Error::new_spanned(attr, "#[column(...)] requires a `sql_type`"));
    }

    let mut out = ColumnAttr::default();
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("sql_type") {
            out.sql_type = Some(meta.value()?.parse::<LitStr>()?.value());
        } else if meta.path.is_ident("length") {
            out.length = Some(meta.value()?.parse::<syn::LitInt>()?.base10_parse()?);
        } else if meta.path.is_ident("precision") {
            out.precision = Some(meta.value()?.parse::<syn::LitInt>()?.base10_parse()?);
        } else if meta.path.is_ident("scale") {
            out.scale = Some(meta.value()?.parse::<syn::LitInt>()?.base10_parse()?);
        } else if meta.path.is_ident("nullable") {
            out.nullable = Some(true);
        } else if meta.path.is_ident("name") {
            out.name = Some(meta.value()?.parse::<LitStr>()?.value());
        } else if meta.path.is_ident("source_type") {
            out.source_type_override = Some(meta.value()?.parse::<LitStr>()?.value());
        } else if meta.path.is_ident("default") {
            let lit: syn::Lit = meta.value()?.parse()?;
            out.default = Some(match lit {
                syn::Lit::Str(s) => DefaultLiteral::Str(s.value()),
                syn::Lit::Int(i) => DefaultLiteral::Int(i.base10_parse()?),
                syn::Lit::Float(f) => DefaultLiteral::Float(f.base10_parse()?),
                syn::Lit::Bool(b) => DefaultLiteral::Bool(b.value),
                other => return Err(syn::Error::new_spanned(other, "unsupported default literal")),
            });
        } else {
            return Err(meta.error("unrecognized key in #[column(...)]"));
        }
        Ok(())
    })?;

    let sql_type = out
        .sql_type
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(attr, "#[column(...)] requires a `sql_type`"))?;
    out.sql_type = Some(sql_type);
    Ok(Some(out))
}

fn parse_primary_key(attrs: &[Attribute]) -> Result<Option<PrimaryKeyAttr>> {
    let Some(attr) = find(attrs, "primary_key") else {
        return Ok(None);
    };

    let mut out = PrimaryKeyAttr::default();
    if matches!(attr.meta, syn::Meta::List(_)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("strategy") {
                out.strategy = Some(meta.value()?.parse::<LitStr>()?.value());
            } else {
                return Err(meta.error("unrecognized key in #[primary_key(...)]"));
            }
            Ok(())
        })?;
    }
    Ok(Some(out))
}

fn parse_filterable(attrs: &[Attribute]) -> Result<Option<FilterableAttr>> {
    let Some(attr) = find(attrs, "filterable") else {
        return Ok(None);
    };

    let mut out = FilterableAttr::default();
    if matches!(attr.meta, syn::Meta::List(_)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                out.name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else {
                return Err(meta.error("unrecognized key in #[filterable(...)]"));
            }
            Ok(())
        })?;
    }
    Ok(Some(out))
}

fn parse_relation(attrs: &[Attribute]) -> Result<Option<RelationAttr>> {
    let kinds = [
        ("belongs_to", RelationKindLit::BelongsTo),
        ("has_many", RelationKindLit::HasMany),
        ("one_to_one", RelationKindLit::OneToOne),
        ("many_to_many", RelationKindLit::ManyToMany),
    ];

    for (ident, kind) in kinds {
        let Some(attr) = find(attrs, ident) else {
            continue;
        };

        let mut target = None;
        let mut foreign_key = None;
        let mut pivot_table = None;
        let mut related_key = None;
        let mut on_delete = None;
        let mut on_update = None;

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("target") {
                target = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("foreign_key") {
                foreign_key = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("pivot_table") {
                pivot_table = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("related_key") {
                related_key = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("on_delete") {
                on_delete = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("on_update") {
                on_update = Some(meta.value()?.parse::<LitStr>()?.value());
            } else {
                return Err(meta.error("unrecognized key in relation attribute"));
            }
            Ok(())
        })?;

        let target = target.ok_or_else(|| syn::Error::new_spanned(attr, "relation attribute requires a `target`"))?;

        return Ok(Some(RelationAttr {
            kind,
            target,
            foreign_key,
            pivot_table,
            related_key,
            on_delete,
            on_update,
        }));
    }

    Ok(None)
}
