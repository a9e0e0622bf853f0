//! Batched relation loading: one query per relation per call, regardless of
//! how many parent rows are being hydrated, so a list of N resources never
//! triggers N+1 queries for a `BelongsTo`/`HasMany`/`OneToOne`/`ManyToMany`.

use std::collections::BTreeMap;

use crate::adapter::DatabaseAdapter;
use crate::error::{Error, Result};
use crate::hydrate::HydratedRow;
use crate::resource::ResourceDescriptor;
use crate::schema::RelationKind;

/// The result of loading one relation for a batch of parent keys.
#[derive(Debug, Clone)]
pub enum Loaded {
    /// `BelongsTo`/`OneToOne`: at most one related row per parent.
    Single(BTreeMap<String, HydratedRow>),
    /// `HasMany`/`ManyToMany`: zero or more related rows per parent.
    Many(BTreeMap<String, Vec<HydratedRow>>),
}

/// Loads `relation_property` on every descriptor in `parent_keys` with a
/// single round trip, grouping results by the parent key the row belongs to.
pub fn load_relation(
    adapter: &mut dyn DatabaseAdapter,
    owner: &'static ResourceDescriptor,
    target: &'static ResourceDescriptor,
    relation_property: &str,
    parent_keys: &[String],
) -> Result<Loaded> {
    if parent_keys.is_empty() {
        return Ok(Loaded::Many(BTreeMap::new()));
    }

    let Some(field) = owner.fields.iter().find(|f| f.property_name == relation_property) else {
        return Err(Error::UnknownRelation {
            table: owner.table_name.to_string(),
            property: relation_property.to_string(),
        });
    };
    let Some(relation) = &field.relation else {
        return Err(Error::UnknownRelation {
            table: owner.table_name.to_string(),
            property: relation_property.to_string(),
        });
    };

    let in_clause = parent_keys
        .iter()
        .map(|key| format!("'{}'", key.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ");

    let target_pk = primary_key_column(target);

    match relation.kind {
        // `parent_keys` here are the owning rows' FK *values* (already known
        // to the caller), not their own ids — so the result is keyed by the
        // target's primary key, which the caller looks up directly.
        RelationKind::BelongsTo => {
            let sql = format!(
                "SELECT * FROM `{}` WHERE `{target_pk}` IN ({in_clause})",
                relation.target_table
            );
            let rows = adapter.query_rows(&sql)?;
            group_by_column(&rows, target_pk, target, false)
        }
        RelationKind::OneToOne | RelationKind::HasMany => {
            let foreign_key = relation.foreign_key.unwrap_or("");
            let sql = format!(
                "SELECT * FROM `{}` WHERE `{foreign_key}` IN ({in_clause})",
                relation.target_table
            );
            let rows = adapter.query_rows(&sql)?;
            group_by_column(&rows, foreign_key, target, matches!(relation.kind, RelationKind::HasMany))
        }
        RelationKind::ManyToMany => {
            let pivot = relation.pivot_table.unwrap_or("");
            let related_key = relation.related_key.unwrap_or("");
            let foreign_key = relation.foreign_key.unwrap_or("");
            let sql = format!(
                "SELECT p.`{foreign_key}` AS parent_key, t.* FROM `{pivot}` p \
                 JOIN `{}` t ON t.`{target_pk}` = p.`{related_key}` \
                 WHERE p.`{foreign_key}` IN ({in_clause})",
                relation.target_table
            );
            let rows = adapter.query_rows(&sql)?;
            group_by_column(&rows, "parent_key", target, true)
        }
    }
}

/// The target's declared primary-key column name, falling back to `id` when
/// no field on the descriptor carries a `primary_key` annotation.
fn primary_key_column(target: &'static ResourceDescriptor) -> &'static str {
    target
        .fields
        .iter()
        .find(|f| f.primary_key.is_some())
        .map(|f| f.column.and_then(|c| c.name).unwrap_or(f.property_name))
        .unwrap_or("id")
}

fn group_by_column(
    rows: &[crate::adapter::Row],
    key_column: &str,
    target: &'static ResourceDescriptor,
    many: bool,
) -> Result<Loaded> {
    if many {
        let mut out: BTreeMap<String, Vec<HydratedRow>> = BTreeMap::new();
        for row in rows {
            let Some(key) = row.get(key_column).and_then(|bytes| std::str::from_utf8(bytes).ok()) else {
                continue;
            };
            out.entry(key.to_string()).or_default().push(HydratedRow::from_row(row, target)?);
        }
        Ok(Loaded::Many(out))
    } else {
        let mut out = BTreeMap::new();
        for row in rows {
            let Some(key) = row.get(key_column).and_then(|bytes| std::str::from_utf8(bytes).ok()) else {
                continue;
            };
            out.insert(key.to_string(), HydratedRow::from_row(row, target)?);
        }
        Ok(Loaded::Single(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Row;
    use crate::resource::{ColumnAnnotation, FieldAnnotation};
    use crate::schema::ColumnType;
    use semitexa_testkit::FakeAdapter;

    const COMMENT_FIELDS: &[FieldAnnotation] = &[FieldAnnotation {
        property_name: "id",
        source_type: "integer",
        column: Some(ColumnAnnotation {
            sql_type: ColumnType::Int,
            length: None,
            precision: None,
            scale: None,
            default: None,
            nullable: false,
            name: None,
        }),
        primary_key: None,
        deprecated: false,
        filterable: None,
        aggregate: false,
        relation: None,
    }];

    const COMMENT_DESCRIPTOR: ResourceDescriptor = ResourceDescriptor {
        table_name: "comments",
        map_to: None,
        has_domain_mapping: false,
        fields: COMMENT_FIELDS,
        class_indexes: &[],
        tenant_scoped: None,
    };

    const HAS_MANY_COMMENTS: RelationAnnotation = RelationAnnotation {
        kind: RelationKind::HasMany,
        target_table: "comments",
        foreign_key: Some("post_id"),
        pivot_table: None,
        related_key: None,
        on_delete: None,
        on_update: None,
    };

    const POST_FIELDS: &[FieldAnnotation] = &[FieldAnnotation {
        property_name: "comments",
        source_type: "enum",
        column: None,
        primary_key: None,
        deprecated: false,
        filterable: None,
        aggregate: false,
        relation: Some(HAS_MANY_COMMENTS),
    }];

    const POST_DESCRIPTOR: ResourceDescriptor = ResourceDescriptor {
        table_name: "posts",
        map_to: None,
        has_domain_mapping: false,
        fields: POST_FIELDS,
        class_indexes: &[],
        tenant_scoped: None,
    };

    fn row(pairs: &[(&str, &str)]) -> Row {
        Row {
            columns: pairs.iter().map(|(k, _)| (*k).to_string()).collect(),
            values: pairs.iter().map(|(_, v)| Some(v.as_bytes().to_vec())).collect(),
        }
    }

    #[test]
    fn empty_parent_keys_short_circuits_without_a_query() {
        let mut adapter = FakeAdapter::new();
        let loaded = load_relation(&mut adapter, &POST_DESCRIPTOR, &COMMENT_DESCRIPTOR, "comments", &[]).unwrap();
        assert!(matches!(loaded, Loaded::Many(m) if m.is_empty()));
        assert!(adapter.executed.is_empty());
    }

    #[test]
    fn has_many_groups_rows_by_foreign_key_in_a_single_query() {
        let sql = "SELECT * FROM `comments` WHERE `post_id` IN ('1', '2')";
        let mut adapter = FakeAdapter::new().with_rows(
            sql,
            vec![
                row(&[("post_id", "1"), ("id", "10")]),
                row(&[("post_id", "1"), ("id", "11")]),
                row(&[("post_id", "2"), ("id", "12")]),
            ],
        );

        let loaded =
            load_relation(&mut adapter, &POST_DESCRIPTOR, &COMMENT_DESCRIPTOR, "comments", &["1".to_string(), "2".to_string()]).unwrap();
        assert_eq!(adapter.executed.len(), 1);
        match loaded {
            Loaded::Many(groups) => {
                assert_eq!(groups.get("1").unwrap().len(), 2);
                assert_eq!(groups.get("2").unwrap().len(), 1);
            }
            Loaded::Single(_) => panic!("expected HasMany to load as Many"),
        }
    }

    const AUTHOR_FIELDS: &[FieldAnnotation] = &[FieldAnnotation {
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
        primary_key: Some(crate::schema::PkStrategy::Uuid),
        deprecated: false,
        filterable: None,
        aggregate: false,
        relation: None,
    }];

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
    fn belongs_to_joins_on_the_targets_declared_primary_key_column() {
        let sql = "SELECT * FROM `authors` WHERE `uuid` IN ('a1')";
        let mut adapter = FakeAdapter::new().with_rows(sql, vec![row(&[("uuid", "a1")])]);

        let loaded = load_relation(&mut adapter, &BOOK_DESCRIPTOR, &AUTHOR_DESCRIPTOR, "author", &["a1".to_string()]).unwrap();
        assert!(matches!(loaded, Loaded::Single(m) if m.contains_key("a1")));
    }

    #[test]
    fn unknown_relation_property_is_rejected() {
        let mut adapter = FakeAdapter::new();
        let err = load_relation(&mut adapter, &POST_DESCRIPTOR, &COMMENT_DESCRIPTOR, "nope", &["1".to_string()]).unwrap_err();
        assert!(matches!(err, Error::UnknownRelation { .. }));
    }
}
