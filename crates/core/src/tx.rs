//! Transaction manager built on top of [`adapter::Transaction`]. Nested
//! calls use `SAVEPOINT sp_{depth}` rather than opening a second real
//! transaction, since MySQL (like most engines) only allows one per
//! connection.

use crate::adapter::{DatabaseAdapter, Transaction};
use crate::error::Result;

pub struct Tx<'a> {
    inner: Box<dyn Transaction + 'a>,
    depth: usize,
}

impl<'a> Tx<'a> {
    pub fn begin(adapter: &'a mut dyn DatabaseAdapter) -> Result<Self> {
        Ok(Self {
            inner: adapter.begin()?,
            depth: 0,
        })
    }

    pub fn execute(&mut self, sql: &str) -> Result<u64> {
        Ok(self.inner.execute(sql)?.0)
    }

    /// Runs `body` inside a `SAVEPOINT`; a returned `Err` rolls back to the
    /// savepoint (leaving the outer transaction alive) rather than
    /// poisoning the whole transaction.
    pub fn nested<T>(&mut self, body: impl FnOnce(&mut Tx<'a>) -> Result<T>) -> Result<T> {
        self.depth += 1;
        let savepoint = format!("sp_{}", self.depth);
        self.inner.savepoint(&savepoint)?;

        match body(self) {
            Ok(value) => {
                self.inner.release_savepoint(&savepoint)?;
                self.depth -= 1;
                Ok(value)
            }
            Err(error) => {
                self.inner.rollback_to_savepoint(&savepoint)?;
                self.depth -= 1;
                Err(error)
            }
        }
    }

    pub fn commit(self) -> Result<()> {
        self.inner.commit()
    }

    pub fn rollback(self) -> Result<()> {
        self.inner.rollback()
    }
}

/// Runs `body` in a fresh top-level transaction, committing on success and
/// rolling back on any error — the common case callers reach for instead
/// of manually pairing `begin`/`commit`/`rollback`.
pub fn run<T>(
    adapter: &mut dyn DatabaseAdapter,
    body: impl FnOnce(&mut Tx<'_>) -> Result<T>,
) -> Result<T> {
    let mut tx = Tx::begin(adapter)?;
    match body(&mut tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(error) => {
            tx.rollback()?;
            Err(error)
        }
    }
}
