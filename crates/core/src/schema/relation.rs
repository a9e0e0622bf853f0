#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    BelongsTo,
    HasMany,
    OneToOne,
    ManyToMany,
}

/// Declared relation between the owning resource and a target resource type.
///
/// `target` names the registered resource (by `ResourceDescriptor::table`)
/// rather than storing a `TypeId` directly, so the metadata stays `'static`
/// and cheap to clone; the registry resolves `target` back to a descriptor
/// lazily when relations are hydrated.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationMeta {
    pub property: String,
    pub kind: RelationKind,
    pub target: String,
    pub foreign_key: String,
    pub pivot_table: Option<String>,
    pub related_key: Option<String>,
}
