//! The declared schema model: tables, columns, indexes, foreign keys, and
//! relations, as produced by the collector from resource annotations.

mod column;
mod foreign_key;
mod ident;
mod index;
mod relation;
mod table;

pub use column::{ColumnDefinition, ColumnType, Literal, PkStrategy};
pub use foreign_key::{ForeignKeyAction, ForeignKeyDefinition};
pub use ident::{Ident, is_valid_identifier};
pub use index::IndexDefinition;
pub use relation::{RelationKind, RelationMeta};
pub use table::TableDefinition;

/// The full declared schema: every table known to the collector, keyed by
/// table name for deterministic iteration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclaredSchema {
    pub tables: Vec<TableDefinition>,
}

impl DeclaredSchema {
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.name.as_str() == name)
    }
}
