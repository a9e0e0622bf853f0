//! Orchestrates the full sync pass: collect → read live state → compare →
//! order → execute. This is the entry point `semitexa-cli`'s `diff`/`sync`
//! subcommands call into.
//!
//! Grounded on `diff/enable_drop.rs`'s `DiffOutcome`/`DiffDiagnostics`
//! shape for reporting what ran versus what was skipped, simplified since
//! `DiffOp::is_destructive` already classifies ops directly instead of
//! needing a second full-vs-emitted diff pass.

use std::collections::BTreeSet;

use crate::adapter::DatabaseAdapter;
use crate::collector;
use crate::comparator;
use crate::diff_op::DiffOp;
use crate::error::Result;
use crate::executor::{ExecutedStatement, Executor, SkippedStatement};
use crate::plan::{self, PlannedStatement};
use crate::reader::SchemaReader;
use crate::registry::SchemaRegistry;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub allow_destructive: bool,
    pub ignore_tables: BTreeSet<String>,
    /// Compute and render the plan but never touch the database.
    pub dry_run: bool,
    /// Fail with `CapabilityError::AtomicDdlRequired` instead of silently
    /// degrading to one-statement-at-a-time execution when the adapter
    /// reports no atomic-DDL support.
    pub require_atomic_ddl: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            allow_destructive: false,
            ignore_tables: BTreeSet::new(),
            dry_run: false,
            require_atomic_ddl: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    pub ops: Vec<DiffOp>,
    pub executed: Vec<ExecutedStatement>,
    pub skipped: Vec<SkippedStatement>,
}

/// Computes the ordered diff without touching the database — backs the
/// `diff` subcommand and `sync --dry-run`.
pub fn plan_diff(
    registry: &SchemaRegistry,
    reader: &mut dyn SchemaReader,
    database: &str,
    ignore_tables: &BTreeSet<String>,
) -> Result<(Vec<DiffOp>, Vec<PlannedStatement>)> {
    let collected = collector::collect(registry.descriptors());
    if let Some(error) = collected.errors.into_iter().next() {
        return Err(error.into());
    }

    let live = reader.read(database, ignore_tables)?;
    let ops = comparator::compare(&collected.schema, &live);
    let built_plan = plan::build_ddl_plan(ops.clone());
    let statements = built_plan.statements();
    Ok((ops, statements))
}

pub fn sync(
    registry: &SchemaRegistry,
    reader: &mut dyn SchemaReader,
    adapter: &mut dyn DatabaseAdapter,
    database: &str,
    options: &SyncOptions,
) -> Result<SyncOutcome> {
    let (ops, statements) = plan_diff(registry, reader, database, &options.ignore_tables)?;

    if options.dry_run {
        let skipped = statements
            .iter()
            .filter(|s| s.destructive && !options.allow_destructive)
            .map(|s| SkippedStatement {
                sql: s.sql.clone(),
                description: s.description.clone(),
            })
            .collect();
        return Ok(SyncOutcome {
            ops,
            executed: Vec::new(),
            skipped,
        });
    }

    let mut executor = Executor::with_options(adapter, options.allow_destructive, options.require_atomic_ddl);
    let report = executor.execute_plan(&statements)?;

    Ok(SyncOutcome {
        ops,
        executed: report.executed,
        skipped: report.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::DEPRECATION_SENTINEL;
    use crate::reader::{DbTableState, LiveSchemaState};
    use crate::registry::SchemaRegistry;
    use semitexa_testkit::{FakeAdapter, FakeReader, table};

    #[test]
    fn default_options_refuse_destructive_ops() {
        let options = SyncOptions::default();
        assert!(!options.allow_destructive);
        assert!(!options.dry_run);
    }

    fn empty_registry() -> SchemaRegistry {
        SchemaRegistry::builder().build()
    }

    #[test]
    fn an_undeprecated_extra_table_is_only_marked_not_dropped() {
        let registry = empty_registry();
        let mut reader = FakeReader::new(LiveSchemaState {
            tables: vec![table("legacy_widgets")],
            columns: vec![],
            indexes: vec![],
            foreign_keys: vec![],
        });
        let mut adapter = FakeAdapter::new();
        let options = SyncOptions::default();

        let outcome = sync(&registry, &mut reader, &mut adapter, "semitexa", &options).unwrap();
        assert_eq!(outcome.executed.len(), 1);
        assert!(outcome.skipped.is_empty());
        assert!(outcome.executed[0].sql.to_uppercase().contains("COMMENT"));
    }

    #[test]
    fn a_sentinel_marked_table_is_dropped_only_when_allow_destructive_is_set() {
        let registry = empty_registry();
        let live = || LiveSchemaState {
            tables: vec![DbTableState { name: "legacy_widgets".to_string(), comment: DEPRECATION_SENTINEL.to_string() }],
            columns: vec![],
            indexes: vec![],
            foreign_keys: vec![],
        };

        let mut reader = FakeReader::new(live());
        let mut adapter = FakeAdapter::new();
        let refused = sync(&registry, &mut reader, &mut adapter, "semitexa", &SyncOptions::default()).unwrap();
        assert!(refused.executed.is_empty());
        assert_eq!(refused.skipped.len(), 1);

        let mut reader = FakeReader::new(live());
        let mut adapter = FakeAdapter::new();
        let options = SyncOptions { allow_destructive: true, ..SyncOptions::default() };
        let allowed = sync(&registry, &mut reader, &mut adapter, "semitexa", &options).unwrap();
        assert_eq!(allowed.executed.len(), 1);
        assert!(allowed.skipped.is_empty());
    }

    #[test]
    fn dry_run_reports_what_would_be_skipped_without_executing_anything() {
        let registry = empty_registry();
        let mut reader = FakeReader::new(LiveSchemaState {
            tables: vec![DbTableState { name: "legacy_widgets".to_string(), comment: DEPRECATION_SENTINEL.to_string() }],
            columns: vec![],
            indexes: vec![],
            foreign_keys: vec![],
        });
        let mut adapter = FakeAdapter::new();
        let options = SyncOptions { dry_run: true, ..SyncOptions::default() };

        let outcome = sync(&registry, &mut reader, &mut adapter, "semitexa", &options).unwrap();
        assert!(outcome.executed.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert!(adapter.executed.is_empty());
    }
}
