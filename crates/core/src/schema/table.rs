use std::collections::BTreeMap;

use super::column::ColumnDefinition;
use super::foreign_key::ForeignKeyDefinition;
use super::ident::Ident;
use super::index::IndexDefinition;
use super::relation::RelationMeta;

/// A declared table: owns its columns (insertion order preserved, as an
/// ordered mapping), indexes, foreign keys, and relations.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: Ident,
    pub columns: Vec<ColumnDefinition>,
    pub indexes: Vec<IndexDefinition>,
    pub foreign_keys: Vec<ForeignKeyDefinition>,
    pub relations: BTreeMap<String, RelationMeta>,
}

impl TableDefinition {
    #[must_use]
    pub fn new(name: Ident) -> Self {
        Self {
            name,
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            relations: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name.as_str() == name)
    }

    #[must_use]
    pub fn primary_key(&self) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.is_primary_key)
    }

    /// Foreign keys whose owning side is this table (used by `ordering` to
    /// build the CREATE TABLE dependency graph).
    #[must_use]
    pub fn dependencies(&self) -> impl Iterator<Item = &Ident> {
        self.foreign_keys.iter().map(|fk| &fk.referenced_table)
    }
}
