//! The annotation surface produced by `#[derive(Resource)]`.
//!
//! `ResourceDescriptor` is a literal transcription of the attributes written
//! on a type — the derive macro performs no semantic validation (no
//! compatibility-matrix checks, no identifier regex checks). That work
//! belongs to the collector, which must *accumulate* errors rather than
//! abort compilation; a proc-macro can only emit one hard error per expansion
//! and cannot defer failure to caller-visible data.

use crate::schema::{ColumnType, ForeignKeyAction, PkStrategy, RelationKind};

/// Implemented by every `#[derive(Resource)]` type. `descriptor()` returns a
/// `'static` reference built once at compile time (a `static` owned by the
/// derive's generated code), so calling it repeatedly is free.
pub trait Resource: 'static {
    fn descriptor() -> &'static ResourceDescriptor;
}

/// Opt-in capability for resources that map to a separate domain value.
/// `FromTable{mapTo}` requires the annotated type to implement this; the
/// collector records a `MissingDomainMapping` error when it doesn't.
pub trait ToDomain {
    type Domain;

    fn to_domain(self) -> Self::Domain;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantStrategy {
    SameStorage,
}

/// A default-value literal that can live in a `static` built by the derive
/// macro (a `String`-carrying variant can't, since `String::from` isn't a
/// `const fn`; the collector widens this into `schema::Literal` when it
/// builds the owned `ColumnDefinition`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnnotationLiteral {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnAnnotation {
    pub sql_type: ColumnType,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub default: Option<AnnotationLiteral>,
    pub nullable: bool,
    pub name: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
pub struct RelationAnnotation {
    pub kind: RelationKind,
    pub target_table: &'static str,
    pub foreign_key: Option<&'static str>,
    pub pivot_table: Option<&'static str>,
    pub related_key: Option<&'static str>,
    pub on_delete: Option<ForeignKeyAction>,
    pub on_update: Option<ForeignKeyAction>,
}

/// Every annotation observed on a single field, carried side by side so a
/// field may be e.g. both `Column` and `Filterable`, or both a relation and
/// nothing else (a relation field has no backing column).
#[derive(Debug, Clone, Copy)]
pub struct FieldAnnotation {
    pub property_name: &'static str,
    pub source_type: &'static str,
    pub column: Option<ColumnAnnotation>,
    pub primary_key: Option<PkStrategy>,
    pub deprecated: bool,
    /// `Some("")` means `Filterable` with no explicit `name` (the collector
    /// generates `idx_{table}_{column}`); `Some(name)` overrides it; `None`
    /// means the field carries no `Filterable` annotation at all.
    pub filterable: Option<&'static str>,
    pub aggregate: bool,
    pub relation: Option<RelationAnnotation>,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassIndexAnnotation {
    pub columns: &'static [&'static str],
    pub unique: bool,
    pub name: Option<&'static str>,
}

/// The whole of what `#[derive(Resource)]` read off one type.
#[derive(Debug, Clone, Copy)]
pub struct ResourceDescriptor {
    pub table_name: &'static str,
    pub map_to: Option<&'static str>,
    pub has_domain_mapping: bool,
    pub fields: &'static [FieldAnnotation],
    pub class_indexes: &'static [ClassIndexAnnotation],
    pub tenant_scoped: Option<TenantStrategy>,
}
