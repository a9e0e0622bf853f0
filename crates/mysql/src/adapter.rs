//! `DatabaseAdapter`/`Transaction` over a pooled `mysql::Conn`. Every
//! statement is plain `query_drop`/`query`. `supports_atomic_ddl` reports
//! `true` unconditionally: `MysqlConnection::server_version` already refuses
//! to hand out a connection to anything below 8.0.0 before any `MysqlAdapter`
//! is built, and MySQL 8.0+ supports atomic DDL, so every adapter this crate
//! constructs is backed by a server that can run a DDL batch inside one
//! transaction.

use std::time::Duration;

use mysql::Value;
use mysql::prelude::Queryable;

use semitexa_core::{AffectedRows, DatabaseAdapter, Error, Result, Row, Transaction};

use crate::connection::MysqlConnection;

const DEFAULT_POOL_TIMEOUT: Duration = Duration::from_secs(10);

pub struct MysqlAdapter {
    pool: semitexa_core::Pool<MysqlConnection>,
    connect: Box<dyn Fn() -> Result<MysqlConnection> + Send + Sync>,
    pool_timeout: Duration,
}

impl MysqlAdapter {
    #[must_use]
    pub fn new(pool_size: usize, connect: impl Fn() -> Result<MysqlConnection> + Send + Sync + 'static) -> Self {
        Self {
            pool: semitexa_core::Pool::new(pool_size),
            connect: Box::new(connect),
            pool_timeout: DEFAULT_POOL_TIMEOUT,
        }
    }

    fn checkout(&self) -> Result<MysqlConnection> {
        self.pool.pop(self.pool_timeout, || (self.connect)())
    }
}

impl DatabaseAdapter for MysqlAdapter {
    fn execute(&mut self, sql: &str) -> Result<AffectedRows> {
        let mut conn = self.checkout()?;
        let result = run_execute(&mut conn.conn, sql);
        self.pool.push(conn);
        result
    }

    fn query_rows(&mut self, sql: &str) -> Result<Vec<Row>> {
        let mut conn = self.checkout()?;
        let result = run_query(&mut conn.conn, sql);
        self.pool.push(conn);
        result
    }

    fn begin(&mut self) -> Result<Box<dyn Transaction + '_>> {
        let mut conn = self.checkout()?;
        run_execute(&mut conn.conn, "START TRANSACTION")?;
        Ok(Box::new(MysqlTransaction {
            pool: &self.pool,
            conn: Some(conn),
        }))
    }

    fn supports_atomic_ddl(&self) -> bool {
        true
    }
}

struct MysqlTransaction<'a> {
    pool: &'a semitexa_core::Pool<MysqlConnection>,
    conn: Option<MysqlConnection>,
}

impl MysqlTransaction<'_> {
    fn conn_mut(&mut self) -> &mut mysql::Conn {
        &mut self.conn.as_mut().expect("transaction used after commit/rollback").conn
    }
}

impl Transaction for MysqlTransaction<'_> {
    fn execute(&mut self, sql: &str) -> Result<AffectedRows> {
        run_execute(self.conn_mut(), sql)
    }

    fn query_rows(&mut self, sql: &str) -> Result<Vec<Row>> {
        run_query(self.conn_mut(), sql)
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        run_execute(self.conn_mut(), "COMMIT")?;
        self.pool.push(self.conn.take().expect("transaction has a connection"));
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        run_execute(self.conn_mut(), "ROLLBACK")?;
        self.pool.push(self.conn.take().expect("transaction has a connection"));
        Ok(())
    }

    fn savepoint(&mut self, name: &str) -> Result<()> {
        run_execute(self.conn_mut(), &format!("SAVEPOINT `{name}`")).map(drop)
    }

    fn release_savepoint(&mut self, name: &str) -> Result<()> {
        run_execute(self.conn_mut(), &format!("RELEASE SAVEPOINT `{name}`")).map(drop)
    }

    fn rollback_to_savepoint(&mut self, name: &str) -> Result<()> {
        run_execute(self.conn_mut(), &format!("ROLLBACK TO SAVEPOINT `{name}`")).map(drop)
    }
}

impl Drop for MysqlTransaction<'_> {
    /// A transaction dropped without `commit`/`rollback` (e.g. a `?` early
    /// return) still owns its connection; return it to the pool rather than
    /// leaking a permanently checked-out slot. The connection is left
    /// mid-transaction, which is why `tx::run` always rolls back on error
    /// before letting the `Tx` drop.
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.push(conn);
        }
    }
}

fn run_execute(conn: &mut mysql::Conn, sql: &str) -> Result<AffectedRows> {
    conn.query_drop(sql).map_err(|source| statement_error(sql, &source))?;
    Ok(AffectedRows(conn.affected_rows()))
}

fn run_query(conn: &mut mysql::Conn, sql: &str) -> Result<Vec<Row>> {
    let rows: Vec<mysql::Row> = conn.query(sql).map_err(|source| statement_error(sql, &source))?;
    Ok(rows.iter().map(row_to_core_row).collect())
}

fn row_to_core_row(row: &mysql::Row) -> Row {
    let columns: Vec<String> = row.columns_ref().iter().map(|c| c.name_str().into_owned()).collect();
    let values = (0..columns.len()).map(|i| row.as_ref(i).and_then(value_to_bytes)).collect();
    Row { columns, values }
}

fn value_to_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(bytes.clone()),
        Value::Int(n) => Some(n.to_string().into_bytes()),
        Value::UInt(n) => Some(n.to_string().into_bytes()),
        Value::Float(f) => Some(f.to_string().into_bytes()),
        Value::Double(f) => Some(f.to_string().into_bytes()),
        Value::Date(year, month, day, hour, minute, second, micros) => Some(
            format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micros:06}").into_bytes(),
        ),
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if *negative { "-" } else { "" };
            Some(format!("{sign}{days}d{hours:02}:{minutes:02}:{seconds:02}.{micros:06}").into_bytes())
        }
    }
}

fn statement_error(sql: &str, source: &mysql::Error) -> Error {
    if is_integrity_violation(source) {
        Error::Integrity(format!("{source} (statement: {sql})"))
    } else {
        Error::ConnectionLost(format!("{source} (statement: {sql})"))
    }
}

/// MySQL reports constraint violations (duplicate key, FK violation) as
/// server error codes in the 1000s range rather than a connection fault.
fn is_integrity_violation(source: &mysql::Error) -> bool {
    matches!(source, mysql::Error::MySqlError(e) if matches!(e.code, 1062 | 1451 | 1452 | 1048))
}
