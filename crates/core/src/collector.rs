//! Turns registered resource descriptors into a normalized, validated
//! [`schema::DeclaredSchema`](crate::schema::DeclaredSchema).
//!
//! Every table is walked independently and every problem found along the
//! way is pushed onto `errors`/`warnings` rather than returned early, so one
//! bad annotation never hides the rest.

use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::resource::{
    AnnotationLiteral, FieldAnnotation, RelationAnnotation, ResourceDescriptor, TenantStrategy,
};
use crate::schema::{
    ColumnDefinition, ColumnType, DeclaredSchema, ForeignKeyAction, ForeignKeyDefinition, Ident,
    IndexDefinition, Literal, PkStrategy, RelationKind, RelationMeta, TableDefinition,
};

pub const DEPRECATION_SENTINEL: &str = "SEMITEXA_DEPRECATED";

#[derive(Debug, Default)]
pub struct CollectedSchema {
    pub schema: DeclaredSchema,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl CollectedSchema {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[must_use]
pub fn collect(descriptors: &[&'static ResourceDescriptor]) -> CollectedSchema {
    let mut out = CollectedSchema::default();

    for descriptor in descriptors {
        collect_one(descriptor, &mut out);
    }

    synthesize_pivots(&mut out);
    resolve_foreign_keys(&mut out);
    resolve_referenced_columns(&mut out);

    for table in &out.schema.tables {
        if table.primary_key().is_none() {
            out.warnings
                .push(format!("table `{}` has no primary key", table.name));
        }
    }

    out
}

fn collect_one(descriptor: &'static ResourceDescriptor, out: &mut CollectedSchema) {
    let table_name = match Ident::new(descriptor.table_name) {
        Ok(ident) => ident,
        Err(_) => {
            out.errors.push(ValidationError::InvalidIdentifier {
                value: descriptor.table_name.to_string(),
            });
            return;
        }
    };

    if descriptor.map_to.is_some() && !descriptor.has_domain_mapping {
        out.errors.push(ValidationError::MissingDomainMapping {
            table: table_name.to_string(),
        });
    }

    let mut table = TableDefinition::new(table_name.clone());
    let mut seen_columns: BTreeMap<String, ()> = BTreeMap::new();

    for field in descriptor.fields {
        collect_field(&table_name, field, &mut table, &mut seen_columns, out);
    }

    for class_index in descriptor.class_indexes {
        match build_index(&table_name, class_index.columns, class_index.unique, class_index.name) {
            Ok(index) => table.indexes.push(index),
            Err(error) => out.errors.push(error),
        }
    }

    if let Some(TenantStrategy::SameStorage) = descriptor.tenant_scoped {
        ensure_tenant_column(&mut table);
    }

    out.schema.tables.push(table);
}

fn collect_field(
    table_name: &Ident,
    field: &FieldAnnotation,
    table: &mut TableDefinition,
    seen_columns: &mut BTreeMap<String, ()>,
    out: &mut CollectedSchema,
) {
    if let Some(relation) = &field.relation {
        collect_relation(table_name, field, relation, table, out);
        return;
    }

    if field.aggregate {
        // Virtual field: no column, no storage.
        return;
    }

    let Some(column_annotation) = &field.column else {
        return;
    };

    let column_name = column_annotation.name.unwrap_or(field.property_name);
    let name = match Ident::new(column_name) {
        Ok(ident) => ident,
        Err(_) => {
            out.errors.push(ValidationError::InvalidIdentifier {
                value: column_name.to_string(),
            });
            return;
        }
    };

    if seen_columns.insert(name.to_string(), ()).is_some() {
        // Duplicate columns across mixins merge silently: first one wins.
        return;
    }

    if !is_compatible(column_annotation.sql_type, field.source_type) {
        out.errors.push(ValidationError::IncompatibleType {
            table: table_name.to_string(),
            column: name.to_string(),
            source_type: field.source_type.to_string(),
            sql_type: format!("{:?}", column_annotation.sql_type),
        });
    }

    let pk_strategy = field.primary_key;
    if field.primary_key.is_some() {
        if matches!(pk_strategy, Some(PkStrategy::Auto)) && is_string_like(field.source_type) {
            out.errors.push(ValidationError::StringPkAutoStrategy {
                table: table_name.to_string(),
                column: name.to_string(),
            });
        }
        if matches!(pk_strategy, Some(PkStrategy::Uuid))
            && !matches!(column_annotation.sql_type, ColumnType::Binary | ColumnType::Varchar)
        {
            out.errors.push(ValidationError::UuidPkInvalidColumnType {
                table: table_name.to_string(),
                column: name.to_string(),
            });
        }
    }

    if field.deprecated {
        let referenced_by_index = table
            .indexes
            .iter()
            .any(|idx| idx.columns.contains(&name));
        if referenced_by_index {
            out.warnings.push(format!(
                "column `{table_name}.{name}` is deprecated but still referenced by an index"
            ));
        }
    }

    let default = column_annotation.default.map(widen_literal);

    table.columns.push(ColumnDefinition {
        name: name.clone(),
        property_name: field.property_name.to_string(),
        column_type: column_annotation.sql_type,
        source_type: field.source_type.to_string(),
        nullable: column_annotation.nullable,
        length: column_annotation.length,
        precision: column_annotation.precision,
        scale: column_annotation.scale,
        default,
        is_primary_key: field.primary_key.is_some(),
        pk_strategy: field.primary_key,
        is_deprecated: field.deprecated,
    });

    if let Some(filterable_name) = field.filterable {
        let index_name = if filterable_name.is_empty() {
            IndexDefinition::generate_name(table_name.as_str(), std::slice::from_ref(&name), false)
        } else {
            filterable_name.to_string()
        };
        if let Ok(index_ident) = Ident::new(index_name) {
            table.indexes.push(IndexDefinition {
                name: index_ident,
                columns: vec![name],
                unique: false,
            });
        }
    }
}

fn collect_relation(
    table_name: &Ident,
    field: &FieldAnnotation,
    relation: &RelationAnnotation,
    table: &mut TableDefinition,
    out: &mut CollectedSchema,
) {
    // `BelongsTo`'s FK column lives on the declaring table and points at the
    // target, so it defaults to a name built from the target (`author_id`
    // referencing `authors`). `HasMany`/`OneToOne`/`ManyToMany`'s FK lives on
    // the *other* table and points back here, so it defaults to a name built
    // from the declaring table instead (`user_id` on `posts` for a `User`
    // `hasMany` `posts`).
    let foreign_key = relation.foreign_key.map(str::to_string).unwrap_or_else(|| match relation.kind {
        RelationKind::BelongsTo => default_foreign_key_column(relation.target_table),
        RelationKind::OneToOne | RelationKind::HasMany | RelationKind::ManyToMany => {
            default_foreign_key_column(table_name.as_str())
        }
    });

    let pivot_table = relation.pivot_table.map(str::to_string).or_else(|| {
        matches!(relation.kind, RelationKind::ManyToMany)
            .then(|| default_pivot_name(table_name.as_str(), relation.target_table))
    });

    let related_key = relation
        .related_key
        .map(str::to_string)
        .or_else(|| {
            matches!(relation.kind, RelationKind::ManyToMany)
                .then(|| default_foreign_key_column(relation.target_table))
        });

    if relation.kind == RelationKind::BelongsTo {
        add_belongs_to_foreign_key(table_name, table, relation, &foreign_key, out);
    }

    let meta = RelationMeta {
        property: field.property_name.to_string(),
        kind: relation.kind,
        target: relation.target_table.to_string(),
        foreign_key,
        pivot_table,
        related_key,
    };

    if table.relations.insert(meta.property.clone(), meta).is_some() {
        out.warnings.push(format!(
            "relation `{}.{}` declared more than once",
            table_name, field.property_name
        ));
    }
}

/// `BelongsTo` places its FK column and constraint on the *declaring* table,
/// pointing at the target's primary key — the inverse of `HasMany`/
/// `OneToOne`, which place theirs on the target (see `resolve_foreign_keys`).
fn add_belongs_to_foreign_key(
    table_name: &Ident,
    table: &mut TableDefinition,
    relation: &RelationAnnotation,
    foreign_key: &str,
    out: &mut CollectedSchema,
) {
    let fk_column = match Ident::new(foreign_key) {
        Ok(ident) => ident,
        Err(_) => {
            out.errors.push(ValidationError::InvalidIdentifier {
                value: foreign_key.to_string(),
            });
            return;
        }
    };

    let Ok(referenced_table) = Ident::new(relation.target_table) else {
        out.errors.push(ValidationError::InvalidIdentifier {
            value: relation.target_table.to_string(),
        });
        return;
    };

    let nullable = table.column(fk_column.as_str()).map_or(true, |c| c.nullable);

    if table.column(fk_column.as_str()).is_none() {
        table.columns.push(ColumnDefinition {
            name: fk_column.clone(),
            property_name: String::new(),
            column_type: ColumnType::Int,
            source_type: "integer".to_string(),
            nullable,
            length: None,
            precision: None,
            scale: None,
            default: None,
            is_primary_key: false,
            pk_strategy: None,
            is_deprecated: false,
        });
    }

    if table.foreign_keys.iter().any(|fk| fk.column == fk_column) {
        return;
    }

    let (default_on_delete, default_on_update) = default_actions(nullable);
    let on_delete = relation.on_delete.unwrap_or(default_on_delete);
    let on_update = relation.on_update.unwrap_or(default_on_update);

    table.foreign_keys.push(ForeignKeyDefinition {
        name: Ident::new(ForeignKeyDefinition::generate_name(
            table_name.as_str(),
            fk_column.as_str(),
        ))
        .unwrap_or_else(|_| fk_column.clone()),
        table: table_name.clone(),
        column: fk_column,
        referenced_table,
        referenced_column: Ident::new("id").unwrap_or_else(|_| ident_id_fallback()),
        on_delete,
        on_update,
    });
}

fn ensure_tenant_column(table: &mut TableDefinition) {
    if table.column("tenant_id").is_some() {
        return;
    }
    let Ok(name) = Ident::new("tenant_id") else {
        return;
    };
    table.columns.push(ColumnDefinition {
        name,
        property_name: "tenantId".to_string(),
        column_type: ColumnType::Varchar,
        source_type: "string".to_string(),
        nullable: false,
        length: Some(64),
        precision: None,
        scale: None,
        default: None,
        is_primary_key: false,
        pk_strategy: None,
        is_deprecated: false,
    });
}

fn build_index(
    table_name: &Ident,
    columns: &[&str],
    unique: bool,
    name: Option<&str>,
) -> Result<IndexDefinition, ValidationError> {
    let mut idents = Vec::with_capacity(columns.len());
    for column in columns {
        idents.push(
            Ident::new(*column).map_err(|_| ValidationError::InvalidIdentifier {
                value: (*column).to_string(),
            })?,
        );
    }

    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| IndexDefinition::generate_name(table_name.as_str(), &idents, unique));

    let name = Ident::new(name).map_err(|_| ValidationError::InvalidIdentifier {
        value: table_name.to_string(),
    })?;

    Ok(IndexDefinition {
        name,
        columns: idents,
        unique,
    })
}

/// Pivot synthesis: every `ManyToMany` relation names its pivot table; if no
/// table by that name exists yet, create it with the two FK columns plus a
/// unique composite index.
fn synthesize_pivots(out: &mut CollectedSchema) {
    let mut pivots: BTreeMap<String, (String, String, String, String)> = BTreeMap::new();

    for table in &out.schema.tables {
        for relation in table.relations.values() {
            if relation.kind != RelationKind::ManyToMany {
                continue;
            }
            let Some(pivot_name) = &relation.pivot_table else {
                continue;
            };
            let Some(related_key) = &relation.related_key else {
                continue;
            };
            pivots.entry(pivot_name.clone()).or_insert((
                relation.foreign_key.clone(),
                table.name.to_string(),
                related_key.clone(),
                relation.target.clone(),
            ));
        }
    }

    for (pivot_name, (fk_col, owner_table, related_col, target_table)) in pivots {
        if out.schema.table(&pivot_name).is_some() {
            continue;
        }
        let Ok(table_ident) = Ident::new(pivot_name.clone()) else {
            out.errors.push(ValidationError::InvalidIdentifier { value: pivot_name });
            continue;
        };
        let mut pivot = TableDefinition::new(table_ident.clone());

        let Ok(id_ident) = Ident::new("id") else {
            continue;
        };
        pivot.columns.push(ColumnDefinition {
            name: id_ident,
            property_name: "id".to_string(),
            column_type: ColumnType::Int,
            source_type: "integer".to_string(),
            nullable: false,
            length: None,
            precision: None,
            scale: None,
            default: None,
            is_primary_key: true,
            pk_strategy: Some(PkStrategy::Auto),
            is_deprecated: false,
        });

        let (Ok(fk_ident), Ok(related_ident)) = (Ident::new(&fk_col), Ident::new(&related_col))
        else {
            continue;
        };
        for ident in [fk_ident.clone(), related_ident.clone()] {
            pivot.columns.push(ColumnDefinition {
                name: ident,
                property_name: String::new(),
                column_type: ColumnType::Int,
                source_type: "integer".to_string(),
                nullable: false,
                length: None,
                precision: None,
                scale: None,
                default: None,
                is_primary_key: false,
                pk_strategy: None,
                is_deprecated: false,
            });
        }

        let index_name = IndexDefinition::generate_name(
            table_ident.as_str(),
            &[fk_ident.clone(), related_ident.clone()],
            true,
        );
        if let Ok(index_ident) = Ident::new(index_name) {
            pivot.indexes.push(IndexDefinition {
                name: index_ident,
                columns: vec![fk_ident.clone(), related_ident.clone()],
                unique: true,
            });
        }

        if let (Ok(owner_ref), Ok(target_ref)) = (Ident::new(&owner_table), Ident::new(&target_table)) {
            pivot.foreign_keys.push(make_fk(&table_ident, &fk_ident, &owner_ref, false));
            pivot
                .foreign_keys
                .push(make_fk(&table_ident, &related_ident, &target_ref, false));
        }

        out.schema.tables.push(pivot);
    }
}

/// FK resolution: `BelongsTo` already emitted its FK while the owning field
/// was walked (the column lives on the same table), so this pass only needs
/// to place the FK for `HasMany`/`OneToOne` onto the *target* table.
fn resolve_foreign_keys(out: &mut CollectedSchema) {
    let mut pending: Vec<(String, Ident, Ident, ForeignKeyAction, ForeignKeyAction)> = Vec::new();

    for table in &out.schema.tables {
        for relation in table.relations.values() {
            match relation.kind {
                RelationKind::HasMany | RelationKind::OneToOne => {
                    let Ok(fk_column) = Ident::new(relation.foreign_key.clone()) else {
                        continue;
                    };
                    let nullable = true; // FK columns synthesized here are always nullable.
                    let (on_delete, on_update) = default_actions(nullable);
                    pending.push((
                        relation.target.clone(),
                        fk_column,
                        table.name.clone(),
                        on_delete,
                        on_update,
                    ));
                }
                RelationKind::BelongsTo | RelationKind::ManyToMany => {}
            }
        }
    }

    for (target_table, fk_column, referenced_table, on_delete, on_update) in pending {
        let Some(target) = out
            .schema
            .tables
            .iter_mut()
            .find(|t| t.name.as_str() == target_table)
        else {
            continue;
        };

        if target
            .foreign_keys
            .iter()
            .any(|fk| fk.column == fk_column)
        {
            continue;
        }

        if target.column(fk_column.as_str()).is_none() {
            target.columns.push(ColumnDefinition {
                name: fk_column.clone(),
                property_name: String::new(),
                column_type: ColumnType::Int,
                source_type: "integer".to_string(),
                nullable: true,
                length: None,
                precision: None,
                scale: None,
                default: None,
                is_primary_key: false,
                pk_strategy: None,
                is_deprecated: false,
            });
        }

        let target_name = target.name.clone();
        target.foreign_keys.push(ForeignKeyDefinition {
            name: Ident::new(ForeignKeyDefinition::generate_name(
                target_name.as_str(),
                fk_column.as_str(),
            ))
            .unwrap_or_else(|_| fk_column.clone()),
            table: target_name,
            column: fk_column,
            referenced_table,
            referenced_column: Ident::new("id").unwrap_or_else(|_| ident_id_fallback()),
            on_delete,
            on_update,
        });
    }
}

/// Every foreign key is built pointing at `id` before its target table is
/// necessarily collected yet (`BelongsTo`'s FK is emitted while the
/// *declaring* table is still being walked). Once every table exists, this
/// pass rewrites `referenced_column` to the target's actually-declared
/// primary-key column, leaving the `id` default in place for any target with
/// no declared primary key (the missing-PK warning below already flags that).
fn resolve_referenced_columns(out: &mut CollectedSchema) {
    let primary_keys: BTreeMap<String, Ident> = out
        .schema
        .tables
        .iter()
        .filter_map(|t| t.primary_key().map(|pk| (t.name.to_string(), pk.name.clone())))
        .collect();

    for table in &mut out.schema.tables {
        for fk in &mut table.foreign_keys {
            if let Some(pk_column) = primary_keys.get(fk.referenced_table.as_str()) {
                fk.referenced_column = pk_column.clone();
            }
        }
    }
}

fn make_fk(table: &Ident, column: &Ident, referenced_table: &Ident, nullable: bool) -> ForeignKeyDefinition {
    let (on_delete, on_update) = default_actions(nullable);
    ForeignKeyDefinition {
        name: Ident::new(ForeignKeyDefinition::generate_name(
            table.as_str(),
            column.as_str(),
        ))
        .unwrap_or_else(|_| column.clone()),
        table: table.clone(),
        column: column.clone(),
        referenced_table: referenced_table.clone(),
        referenced_column: Ident::new("id").unwrap_or_else(|_| ident_id_fallback()),
        on_delete,
        on_update,
    }
}

fn ident_id_fallback() -> Ident {
    // `"id"` always matches the identifier regex; this branch is unreachable
    // but keeps the function total instead of panicking on a logic bug.
    Ident::new("id").expect("`id` is a valid identifier")
}

const fn default_actions(nullable: bool) -> (ForeignKeyAction, ForeignKeyAction) {
    if nullable {
        (ForeignKeyAction::SetNull, ForeignKeyAction::SetNull)
    } else {
        (ForeignKeyAction::Restrict, ForeignKeyAction::Restrict)
    }
}

fn default_foreign_key_column(table_name: &str) -> String {
    format!("{table_name}_id")
}

fn default_pivot_name(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}_{b}")
    } else {
        format!("{b}_{a}")
    }
}

fn widen_literal(literal: AnnotationLiteral) -> Literal {
    match literal {
        AnnotationLiteral::Int(v) => Literal::Int(v),
        AnnotationLiteral::Float(v) => Literal::Float(v),
        AnnotationLiteral::Bool(v) => Literal::Bool(v),
        AnnotationLiteral::Str(v) => Literal::Str(v.to_string()),
    }
}

fn is_string_like(source_type: &str) -> bool {
    backing_scalar(source_type) == "string"
}

/// Unwraps a backed enumeration's tag (`"enum:integer"`) to its backing
/// scalar; a bare `"enum"` tag (non-backed) is left as-is so compatibility
/// checks below always reject it.
fn backing_scalar(source_type: &str) -> &str {
    source_type
        .strip_prefix("enum:")
        .unwrap_or(source_type)
}

fn is_compatible(sql_type: ColumnType, source_type: &str) -> bool {
    let scalar = backing_scalar(source_type);
    match sql_type {
        ColumnType::Varchar
        | ColumnType::Char
        | ColumnType::Text
        | ColumnType::MediumText
        | ColumnType::LongText
        | ColumnType::Time => scalar == "string",
        ColumnType::Json => scalar == "string" || scalar == "array",
        ColumnType::TinyInt
        | ColumnType::SmallInt
        | ColumnType::Int
        | ColumnType::BigInt
        | ColumnType::Year => scalar == "integer",
        ColumnType::Float | ColumnType::Double => scalar == "floating",
        ColumnType::Decimal => scalar == "string" || scalar == "floating",
        ColumnType::Boolean => scalar == "boolean" || scalar == "integer",
        ColumnType::DateTime | ColumnType::Timestamp | ColumnType::Date => {
            scalar == "timestamp" || scalar == "string"
        }
        ColumnType::Blob | ColumnType::Binary => scalar == "bytes" || scalar == "string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_matrix_accepts_documented_pairs() {
        assert!(is_compatible(ColumnType::Varchar, "string"));
        assert!(is_compatible(ColumnType::Json, "array"));
        assert!(is_compatible(ColumnType::Boolean, "integer"));
        assert!(is_compatible(ColumnType::Decimal, "floating"));
        assert!(!is_compatible(ColumnType::Int, "string"));
    }

    #[test]
    fn backed_enum_unwraps_to_backing_scalar() {
        assert!(is_compatible(ColumnType::Int, "enum:integer"));
        assert!(!is_compatible(ColumnType::Int, "enum"));
    }

    #[test]
    fn default_pivot_name_is_alphabetically_stable() {
        assert_eq!(default_pivot_name("users", "tags"), "tags_users");
        assert_eq!(default_pivot_name("tags", "users"), "tags_users");
    }

    use crate::resource::ColumnAnnotation;

    const AUTHOR_UUID_FIELD: FieldAnnotation = FieldAnnotation {
        property_name: "uuid",
        source_type: "string",
        column: Some(ColumnAnnotation {
            sql_type: ColumnType::Varchar,
            length: Some(36),
            precision: None,
            scale: None,
            default: None,
            nullable: false,
            name: None,
        }),
        primary_key: Some(PkStrategy::Uuid),
        deprecated: false,
        filterable: None,
        aggregate: false,
        relation: None,
    };

    const AUTHOR_FIELDS: &[FieldAnnotation] = &[AUTHOR_UUID_FIELD];

    const AUTHOR_DESCRIPTOR: ResourceDescriptor = ResourceDescriptor {
        table_name: "authors",
        map_to: None,
        has_domain_mapping: false,
        fields: AUTHOR_FIELDS,
        class_indexes: &[],
        tenant_scoped: None,
    };

    const BELONGS_TO_AUTHOR: RelationAnnotation = RelationAnnotation {
        kind: RelationKind::BelongsTo,
        target_table: "authors",
        foreign_key: Some("author_uuid"),
        pivot_table: None,
        related_key: None,
        on_delete: None,
        on_update: None,
    };

    const BOOK_FIELDS: &[FieldAnnotation] = &[FieldAnnotation {
        property_name: "author",
        source_type: "enum",
        column: None,
        primary_key: None,
        deprecated: false,
        filterable: None,
        aggregate: false,
        relation: Some(BELONGS_TO_AUTHOR),
    }];

    const BOOK_DESCRIPTOR: ResourceDescriptor = ResourceDescriptor {
        table_name: "books",
        map_to: None,
        has_domain_mapping: false,
        fields: BOOK_FIELDS,
        class_indexes: &[],
        tenant_scoped: None,
    };

    #[test]
    fn belongs_to_fk_references_the_targets_declared_primary_key_column() {
        let collected = collect(&[&AUTHOR_DESCRIPTOR, &BOOK_DESCRIPTOR]);
        assert!(collected.is_valid(), "{:?}", collected.errors);

        let books = collected.schema.tables.iter().find(|t| t.name.as_str() == "books").unwrap();
        let fk = books.foreign_keys.iter().find(|fk| fk.column.as_str() == "author_uuid").unwrap();
        assert_eq!(fk.referenced_column.as_str(), "uuid");
    }

    #[test]
    fn belongs_to_fk_falls_back_to_id_when_target_has_no_declared_primary_key() {
        const NO_PK_FIELDS: &[FieldAnnotation] = &[];
        const NO_PK_DESCRIPTOR: ResourceDescriptor = ResourceDescriptor {
            table_name: "authors",
            map_to: None,
            has_domain_mapping: false,
            fields: NO_PK_FIELDS,
            class_indexes: &[],
            tenant_scoped: None,
        };

        let collected = collect(&[&NO_PK_DESCRIPTOR, &BOOK_DESCRIPTOR]);
        let books = collected.schema.tables.iter().find(|t| t.name.as_str() == "books").unwrap();
        let fk = books.foreign_keys.iter().find(|fk| fk.column.as_str() == "author_uuid").unwrap();
        assert_eq!(fk.referenced_column.as_str(), "id");
    }
}
