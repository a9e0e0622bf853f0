//! Live database state, as read from `INFORMATION_SCHEMA`. The actual
//! queries (grounded on `shuymn-stateql/crates/dialect-mysql/src/export_queries.rs`)
//! live in `semitexa-mysql`; this crate only defines the trait contract and
//! the row-shaped value types the comparator consumes.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::schema::ForeignKeyAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbTableState {
    pub name: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbColumnState {
    pub table: String,
    pub name: String,
    /// Raw `COLUMN_TYPE`, e.g. `"varchar(255)"` or `"int(11) unsigned"`.
    pub column_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub is_primary_key: bool,
    pub auto_increment: bool,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbIndexState {
    pub table: String,
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbForeignKeyState {
    pub table: String,
    pub column: String,
    pub name: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub on_delete: ForeignKeyAction,
    pub on_update: ForeignKeyAction,
}

/// The full live-state snapshot read for one comparator pass. Lives only for
/// the duration of that pass — never cached across `sync` invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveSchemaState {
    pub tables: Vec<DbTableState>,
    pub columns: Vec<DbColumnState>,
    pub indexes: Vec<DbIndexState>,
    pub foreign_keys: Vec<DbForeignKeyState>,
}

impl LiveSchemaState {
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&DbTableState> {
        self.tables.iter().find(|t| t.name == name)
    }

    #[must_use]
    pub fn columns_for<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a DbColumnState> {
        self.columns.iter().filter(move |c| c.table == table)
    }

    #[must_use]
    pub fn indexes_for<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a DbIndexState> {
        self.indexes.iter().filter(move |i| i.table == table)
    }

    #[must_use]
    pub fn foreign_keys_for<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a DbForeignKeyState> {
        self.foreign_keys.iter().filter(move |fk| fk.table == table)
    }
}

/// Implemented per dialect (here, only `semitexa-mysql`). Tables named in
/// `ignore_tables` must be entirely absent from the returned state.
pub trait SchemaReader {
    fn read(&mut self, database: &str, ignore_tables: &BTreeSet<String>) -> Result<LiveSchemaState>;
}
