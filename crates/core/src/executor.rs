//! Runs a rendered [`plan::PlannedStatement`] sequence against a
//! [`DatabaseAdapter`]. When the adapter reports `supports_atomic_ddl`, the
//! whole selected batch runs inside one transaction (`START
//! TRANSACTION`/`COMMIT`, `ROLLBACK` on the first failure); otherwise
//! statements apply one at a time and a failure just stops the run where it
//! is, and the caller (see `sync.rs`) gets back exactly how far it got.

use crate::adapter::{DatabaseAdapter, Transaction};
use crate::error::{CapabilityError, Error, Result};
use crate::plan::PlannedStatement;

/// One statement that was actually sent to the server.
#[derive(Debug, Clone)]
pub struct ExecutedStatement {
    pub sql: String,
    pub description: String,
    pub affected_rows: u64,
}

/// A statement the executor declined to run because it was destructive and
/// `allow_destructive` was `false`.
#[derive(Debug, Clone)]
pub struct SkippedStatement {
    pub sql: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub executed: Vec<ExecutedStatement>,
    pub skipped: Vec<SkippedStatement>,
}

pub struct Executor<'a> {
    adapter: &'a mut dyn DatabaseAdapter,
    allow_destructive: bool,
    /// When set, a server that reports no atomic-DDL support fails the run
    /// up front with [`CapabilityError::AtomicDdlRequired`] instead of
    /// silently falling back to one-statement-at-a-time execution.
    require_atomic_ddl: bool,
}

impl<'a> Executor<'a> {
    #[must_use]
    pub fn new(adapter: &'a mut dyn DatabaseAdapter, allow_destructive: bool) -> Self {
        Self::with_options(adapter, allow_destructive, false)
    }

    #[must_use]
    pub fn with_options(adapter: &'a mut dyn DatabaseAdapter, allow_destructive: bool, require_atomic_ddl: bool) -> Self {
        Self {
            adapter,
            allow_destructive,
            require_atomic_ddl,
        }
    }

    /// Runs the selected statements in order. When the adapter supports
    /// atomic DDL, every selected statement runs inside one transaction: the
    /// first failure rolls back the whole batch, so [`ExecutionReport`]
    /// either comes back with everything executed or (on error) with an
    /// empty `executed` list. Otherwise statements run one at a time and a
    /// failure leaves the partially filled report behind in the error
    /// context, reconstructed by `sync.rs`.
    pub fn execute_plan(&mut self, statements: &[PlannedStatement]) -> Result<ExecutionReport> {
        let mut report = ExecutionReport::default();
        let mut selected = Vec::with_capacity(statements.len());

        for statement in statements {
            if statement.destructive && !self.allow_destructive {
                log::warn!("skipping destructive statement ({}): {}", statement.description, statement.sql);
                report.skipped.push(SkippedStatement {
                    sql: statement.sql.clone(),
                    description: statement.description.clone(),
                });
            } else {
                selected.push(statement);
            }
        }

        if self.adapter.supports_atomic_ddl() {
            Self::execute_transactional(self.adapter, &selected, &mut report)?;
        } else if self.require_atomic_ddl {
            return Err(Error::Capability(CapabilityError::AtomicDdlRequired));
        } else {
            Self::execute_sequential(self.adapter, &selected, &mut report)?;
        }

        Ok(report)
    }

    fn execute_sequential(adapter: &mut dyn DatabaseAdapter, selected: &[&PlannedStatement], report: &mut ExecutionReport) -> Result<()> {
        for statement in selected {
            log::debug!("executing ({}): {}", statement.description, statement.sql);
            let affected = adapter
                .execute(&statement.sql)
                .map_err(|source| Self::wrap_failure(statement, report.executed.len(), source))?;

            report.executed.push(ExecutedStatement {
                sql: statement.sql.clone(),
                description: statement.description.clone(),
                affected_rows: affected.0,
            });
        }
        Ok(())
    }

    fn execute_transactional(adapter: &mut dyn DatabaseAdapter, selected: &[&PlannedStatement], report: &mut ExecutionReport) -> Result<()> {
        let mut txn = adapter.begin()?;

        for statement in selected {
            log::debug!("executing in transaction ({}): {}", statement.description, statement.sql);
            match txn.execute(&statement.sql) {
                Ok(affected) => report.executed.push(ExecutedStatement {
                    sql: statement.sql.clone(),
                    description: statement.description.clone(),
                    affected_rows: affected.0,
                }),
                Err(source) => {
                    let failed_count = report.executed.len();
                    report.executed.clear();
                    let _ = txn.rollback();
                    return Err(Self::wrap_failure(statement, failed_count, source));
                }
            }
        }

        txn.commit()?;
        Ok(())
    }

    fn wrap_failure(statement: &PlannedStatement, executed_count: usize, source: Error) -> Error {
        Error::Integrity(format!(
            "statement {executed_count} failed ({}): {source}",
            statement.description
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semitexa_testkit::FakeAdapter;

    fn statement(sql: &str, destructive: bool) -> PlannedStatement {
        PlannedStatement {
            sql: sql.to_string(),
            destructive,
            table: "widgets".to_string(),
            description: "test statement".to_string(),
        }
    }

    #[test]
    fn without_atomic_ddl_support_statements_run_one_at_a_time() {
        let mut adapter = FakeAdapter::new();
        let statements = vec![statement("CREATE TABLE a (...)", false), statement("CREATE TABLE b (...)", false)];
        let mut executor = Executor::new(&mut adapter, true);

        let report = executor.execute_plan(&statements).unwrap();
        assert_eq!(report.executed.len(), 2);
        assert!(adapter.executed.iter().all(|s| !s.to_uppercase().contains("START TRANSACTION")));
    }

    #[test]
    fn atomic_ddl_support_wraps_the_batch_in_one_transaction() {
        let mut adapter = FakeAdapter { supports_atomic_ddl: true, ..FakeAdapter::new() };
        let statements = vec![statement("CREATE TABLE a (...)", false), statement("CREATE TABLE b (...)", false)];
        let mut executor = Executor::new(&mut adapter, true);

        let report = executor.execute_plan(&statements).unwrap();
        assert_eq!(report.executed.len(), 2);
    }

    #[test]
    fn a_failure_inside_an_atomic_batch_rolls_back_and_reports_nothing_executed() {
        let mut adapter = FakeAdapter { supports_atomic_ddl: true, ..FakeAdapter::new() }.failing_on("CREATE TABLE b");
        let statements = vec![statement("CREATE TABLE a (...)", false), statement("CREATE TABLE b (...)", false)];
        let mut executor = Executor::new(&mut adapter, true);

        let err = executor.execute_plan(&statements).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
    }

    #[test]
    fn requiring_atomic_ddl_on_an_unsupporting_adapter_fails_before_running_anything() {
        let mut adapter = FakeAdapter::new();
        let statements = vec![statement("CREATE TABLE a (...)", false)];
        let mut executor = Executor::with_options(&mut adapter, true, true);

        let err = executor.execute_plan(&statements).unwrap_err();
        assert!(matches!(err, Error::Capability(CapabilityError::AtomicDdlRequired)));
        assert!(adapter.executed.is_empty());
    }
}
