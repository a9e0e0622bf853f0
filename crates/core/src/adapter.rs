//! The boundary between the sync engine and a concrete MySQL connection.
//! Only `semitexa-mysql` implements this; `semitexa-testkit` provides a
//! fake for tests that never touch a real server.
//!
//! `DatabaseAdapter`/`Transaction` are split so the executor can run plain
//! statements and transactional ones through the same interface.
//! `supports_atomic_ddl` tells the executor whether the connected server can
//! run a batch of DDL statements inside one transaction (MySQL 8.0+ with
//! atomic DDL) or only one statement at a time.

use crate::error::Result;

/// One applied statement's effect on row counts, as MySQL reports it via
/// the connection's "rows affected" counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffectedRows(pub u64);

pub trait DatabaseAdapter {
    fn execute(&mut self, sql: &str) -> Result<AffectedRows>;

    fn query_rows(&mut self, sql: &str) -> Result<Vec<Row>>;

    fn begin(&mut self) -> Result<Box<dyn Transaction + '_>>;

    /// `true` when the executor may wrap a whole batch of statements in one
    /// transaction. When `false`, the executor falls back to running
    /// statements one at a time unless the caller explicitly demanded
    /// atomic DDL, in which case it surfaces
    /// `CapabilityError::AtomicDdlRequired` instead of silently degrading.
    fn supports_atomic_ddl(&self) -> bool;
}

pub trait Transaction {
    fn execute(&mut self, sql: &str) -> Result<AffectedRows>;
    fn query_rows(&mut self, sql: &str) -> Result<Vec<Row>>;
    fn commit(self: Box<Self>) -> Result<()>;
    fn rollback(self: Box<Self>) -> Result<()>;
    /// Nested transaction via `SAVEPOINT`. See `tx.rs` for depth bookkeeping.
    fn savepoint(&mut self, name: &str) -> Result<()>;
    fn release_savepoint(&mut self, name: &str) -> Result<()>;
    fn rollback_to_savepoint(&mut self, name: &str) -> Result<()>;
}

/// A single result row, column-ordered, with values already stringified or
/// left as `NULL`. Hydration (`hydrate.rs`) does the type casting; this
/// layer only needs to move bytes out of the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub columns: Vec<String>,
    pub values: Vec<Option<Vec<u8>>>,
}

impl Row {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&[u8]> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values[idx].as_deref()
    }
}
