//! In-memory `DatabaseAdapter`/`SchemaReader` doubles and small fixture
//! builders, so `semitexa-core`'s own tests (and any downstream crate's)
//! never need a real MySQL server.

use std::collections::{BTreeSet, HashMap};

use semitexa_core::{
    AffectedRows, DatabaseAdapter, DbColumnState, DbForeignKeyState, DbIndexState, DbTableState, Error,
    ForeignKeyAction, LiveSchemaState, Result, Row, SchemaReader, Transaction,
};

/// Records every statement it was asked to run; `query_rows` answers from a
/// fixed table of canned responses keyed by exact SQL text rather than
/// attempting to parse and evaluate SQL.
#[derive(Default)]
pub struct FakeAdapter {
    pub executed: Vec<String>,
    pub rows: HashMap<String, Vec<Row>>,
    /// When `Some`, any statement containing this substring fails with
    /// `Error::Integrity` instead of succeeding — used to exercise
    /// partial-execution handling in the executor/sync tests.
    pub fail_on: Option<String>,
    pub supports_atomic_ddl: bool,
}

impl FakeAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on = Some(needle.into());
        self
    }

    #[must_use]
    pub fn with_rows(mut self, sql: impl Into<String>, rows: Vec<Row>) -> Self {
        self.rows.insert(sql.into(), rows);
        self
    }
}

impl DatabaseAdapter for FakeAdapter {
    fn execute(&mut self, sql: &str) -> Result<AffectedRows> {
        self.executed.push(sql.to_string());
        if let Some(needle) = &self.fail_on {
            if sql.contains(needle.as_str()) {
                return Err(Error::Integrity(format!("simulated failure on: {sql}")));
            }
        }
        Ok(AffectedRows(1))
    }

    fn query_rows(&mut self, sql: &str) -> Result<Vec<Row>> {
        Ok(self.rows.get(sql).cloned().unwrap_or_default())
    }

    fn begin(&mut self) -> Result<Box<dyn Transaction + '_>> {
        Ok(Box::new(FakeTransaction { adapter: self }))
    }

    fn supports_atomic_ddl(&self) -> bool {
        self.supports_atomic_ddl
    }
}

struct FakeTransaction<'a> {
    adapter: &'a mut FakeAdapter,
}

impl Transaction for FakeTransaction<'_> {
    fn execute(&mut self, sql: &str) -> Result<AffectedRows> {
        self.adapter.execute(sql)
    }

    fn query_rows(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.adapter.query_rows(sql)
    }

    fn commit(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    fn savepoint(&mut self, name: &str) -> Result<()> {
        self.adapter.execute(&format!("SAVEPOINT `{name}`")).map(drop)
    }

    fn release_savepoint(&mut self, name: &str) -> Result<()> {
        self.adapter.execute(&format!("RELEASE SAVEPOINT `{name}`")).map(drop)
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> Result<()> {
        self.adapter.execute(&format!("ROLLBACK TO SAVEPOINT `{name}`")).map(drop)
    }
}

/// A canned `LiveSchemaState`, filtered by `ignore_tables` on every read the
/// same way `semitexa-mysql`'s reader filters its `INFORMATION_SCHEMA` rows.
#[derive(Debug, Clone, Default)]
pub struct FakeReader {
    pub state: LiveSchemaState,
}

impl FakeReader {
    #[must_use]
    pub fn new(state: LiveSchemaState) -> Self {
        Self { state }
    }
}

impl SchemaReader for FakeReader {
    fn read(&mut self, _database: &str, ignore_tables: &BTreeSet<String>) -> Result<LiveSchemaState> {
        let mut state = self.state.clone();
        state.tables.retain(|t| !ignore_tables.contains(&t.name));
        state.columns.retain(|c| !ignore_tables.contains(&c.table));
        state.indexes.retain(|i| !ignore_tables.contains(&i.table));
        state.foreign_keys.retain(|fk| !ignore_tables.contains(&fk.table));
        Ok(state)
    }
}

/// A live table with no columns/indexes/foreign keys of its own; combine
/// with [`column`] and friends to flesh one out.
#[must_use]
pub fn table(name: &str) -> DbTableState {
    DbTableState {
        name: name.to_string(),
        comment: String::new(),
    }
}

#[must_use]
pub fn column(table: &str, name: &str, column_type: &str) -> DbColumnState {
    DbColumnState {
        table: table.to_string(),
        name: name.to_string(),
        column_type: column_type.to_string(),
        nullable: false,
        default: None,
        is_primary_key: false,
        auto_increment: false,
        comment: String::new(),
    }
}

#[must_use]
pub fn primary_key_column(table: &str, name: &str, column_type: &str) -> DbColumnState {
    DbColumnState {
        is_primary_key: true,
        auto_increment: true,
        ..column(table, name, column_type)
    }
}

#[must_use]
pub fn index(table: &str, name: &str, columns: &[&str], unique: bool) -> DbIndexState {
    DbIndexState {
        table: table.to_string(),
        name: name.to_string(),
        columns: columns.iter().map(|c| (*c).to_string()).collect(),
        unique,
    }
}

#[must_use]
pub fn foreign_key(table: &str, column: &str, referenced_table: &str, referenced_column: &str) -> DbForeignKeyState {
    DbForeignKeyState {
        table: table.to_string(),
        column: column.to_string(),
        name: semitexa_core::ForeignKeyDefinition::generate_name(table, column),
        referenced_table: referenced_table.to_string(),
        referenced_column: referenced_column.to_string(),
        on_delete: ForeignKeyAction::Restrict,
        on_update: ForeignKeyAction::Restrict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_adapter_records_every_statement() {
        let mut adapter = FakeAdapter::new();
        adapter.execute("CREATE TABLE `users` (...)").unwrap();
        assert_eq!(adapter.executed.len(), 1);
    }

    #[test]
    fn fake_adapter_fails_matching_statements() {
        let mut adapter = FakeAdapter::new().failing_on("DROP TABLE");
        assert!(adapter.execute("DROP TABLE `users`").is_err());
        assert!(adapter.execute("CREATE TABLE `users` (...)").is_ok());
    }

    #[test]
    fn fake_reader_filters_ignored_tables() {
        let state = LiveSchemaState {
            tables: vec![table("users"), table("secrets")],
            columns: vec![column("users", "id", "int(11)"), column("secrets", "value", "text")],
            indexes: vec![],
            foreign_keys: vec![],
        };
        let mut reader = FakeReader::new(state);
        let filtered = reader.read("db", &BTreeSet::from(["secrets".to_string()])).unwrap();
        assert_eq!(filtered.tables.len(), 1);
        assert!(filtered.table("secrets").is_none());
    }
}
