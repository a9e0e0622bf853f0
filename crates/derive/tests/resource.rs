use semitexa_core::{PkStrategy, RelationKind, Resource, TenantStrategy};
use semitexa_derive::Resource as DeriveResource;

#[derive(DeriveResource)]
#[table(name = "posts", map_to = "PostDomain")]
#[index(columns(author_id, published_at), name = "idx_posts_author_published")]
#[tenant_scoped(strategy = "same_storage")]
struct Post {
    #[primary_key(strategy = "auto")]
    #[column(sql_type = "int")]
    id: i64,

    #[column(sql_type = "varchar", length = 255)]
    #[filterable]
    title: String,

    #[column(sql_type = "text", nullable)]
    body: Option<String>,

    #[deprecated]
    #[column(sql_type = "varchar", length = 64)]
    legacy_slug: String,

    #[belongs_to(target = "authors", foreign_key = "author_id", on_delete = "cascade")]
    author: (),

    #[has_many(target = "comments")]
    comments: (),

    #[many_to_many(target = "tags", pivot_table = "post_tags", related_key = "tag_id")]
    tags: (),

    #[aggregate]
    #[column(sql_type = "int")]
    comment_count: i64,
}

#[test]
fn table_and_map_to_are_transcribed_verbatim() {
    let descriptor = Post::descriptor();
    assert_eq!(descriptor.table_name, "posts");
    assert_eq!(descriptor.map_to, Some("PostDomain"));
    assert!(descriptor.has_domain_mapping);
    assert_eq!(descriptor.tenant_scoped, Some(TenantStrategy::SameStorage));
}

#[test]
fn index_attribute_collects_its_columns() {
    let descriptor = Post::descriptor();
    assert_eq!(descriptor.class_indexes.len(), 1);
    let index = &descriptor.class_indexes[0];
    assert_eq!(index.columns, &["author_id", "published_at"]);
    assert_eq!(index.name, Some("idx_posts_author_published"));
}

#[test]
fn column_and_primary_key_annotations_round_trip() {
    let descriptor = Post::descriptor();
    let id_field = descriptor.fields.iter().find(|f| f.property_name == "id").unwrap();
    assert_eq!(id_field.primary_key, Some(PkStrategy::Auto));
    assert_eq!(id_field.source_type, "integer");
    assert_eq!(id_field.column.unwrap().sql_type, semitexa_core::ColumnType::Int);
}

#[test]
fn option_wrapped_columns_are_nullable_and_unwrap_their_source_type() {
    let descriptor = Post::descriptor();
    let body_field = descriptor.fields.iter().find(|f| f.property_name == "body").unwrap();
    assert_eq!(body_field.source_type, "string");
    assert!(body_field.column.unwrap().nullable);
}

#[test]
fn deprecated_and_filterable_flags_are_read_independently() {
    let descriptor = Post::descriptor();
    let title_field = descriptor.fields.iter().find(|f| f.property_name == "title").unwrap();
    assert_eq!(title_field.filterable, Some(""));
    assert!(!title_field.deprecated);

    let legacy_field = descriptor.fields.iter().find(|f| f.property_name == "legacy_slug").unwrap();
    assert!(legacy_field.deprecated);
    assert_eq!(legacy_field.filterable, None);
}

#[test]
fn relation_kinds_and_their_explicit_keys_are_transcribed() {
    let descriptor = Post::descriptor();

    let author = descriptor.fields.iter().find(|f| f.property_name == "author").unwrap();
    let relation = author.relation.unwrap();
    assert_eq!(relation.kind, RelationKind::BelongsTo);
    assert_eq!(relation.target_table, "authors");
    assert_eq!(relation.foreign_key, Some("author_id"));

    let tags = descriptor.fields.iter().find(|f| f.property_name == "tags").unwrap();
    let tags_relation = tags.relation.unwrap();
    assert_eq!(tags_relation.kind, RelationKind::ManyToMany);
    assert_eq!(tags_relation.pivot_table, Some("post_tags"));
    assert_eq!(tags_relation.related_key, Some("tag_id"));
}

#[test]
fn aggregate_fields_carry_no_column_or_relation() {
    let descriptor = Post::descriptor();
    let count_field = descriptor.fields.iter().find(|f| f.property_name == "comment_count").unwrap();
    assert!(count_field.aggregate);
    assert!(count_field.relation.is_none());
}
