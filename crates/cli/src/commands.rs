//! One function per subcommand. Each takes the wiring it needs explicitly
//! (registry, reader, adapter, database name) rather than reaching for
//! ambient state, so the whole module is exercised in tests against
//! `semitexa_testkit`'s fakes without a real server.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use chrono::Utc;
use semitexa_core::{
    AuditRecord, DatabaseAdapter, Result, SchemaReader, SchemaRegistry, SyncOptions, Version, collect, compare,
    plan_diff, sync,
};

use crate::seed::SeedSource;

pub struct StatusReport {
    pub server_version: Option<Version>,
    pub pool_size: usize,
    pub supports_atomic_ddl: bool,
    pub table_count: usize,
    pub column_count: usize,
    pub index_count: usize,
    pub validation_errors: Vec<String>,
    pub warnings: Vec<String>,
    pub pending_ops: usize,
}

impl std::fmt::Display for StatusReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.server_version {
            Some(v) => writeln!(f, "server version: {}.{}.{}", v.major, v.minor, v.patch)?,
            None => writeln!(f, "server version: unknown")?,
        }
        writeln!(f, "pool size: {}", self.pool_size)?;
        writeln!(f, "atomic DDL: {}", self.supports_atomic_ddl)?;
        writeln!(f, "declared tables: {}, columns: {}, indexes: {}", self.table_count, self.column_count, self.index_count)?;
        if self.validation_errors.is_empty() {
            writeln!(f, "validation errors: none")?;
        } else {
            writeln!(f, "validation errors:")?;
            for error in &self.validation_errors {
                writeln!(f, "  - {error}")?;
            }
        }
        if !self.warnings.is_empty() {
            writeln!(f, "warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "  - {warning}")?;
            }
        }
        write!(f, "pending sync operations: {}", self.pending_ops)
    }
}

pub fn run_status(
    registry: &SchemaRegistry,
    reader: &mut dyn SchemaReader,
    adapter: &dyn DatabaseAdapter,
    server_version: Option<Version>,
    pool_size: usize,
    database: &str,
    ignore_tables: &BTreeSet<String>,
) -> Result<StatusReport> {
    let collected = collect(registry.descriptors());
    let table_count = collected.schema.tables.len();
    let column_count = collected.schema.tables.iter().map(|t| t.columns.len()).sum();
    let index_count = collected.schema.tables.iter().map(|t| t.indexes.len()).sum();

    let pending_ops = if collected.is_valid() {
        let live = reader.read(database, ignore_tables)?;
        compare(&collected.schema, &live).len()
    } else {
        0
    };

    Ok(StatusReport {
        server_version,
        pool_size,
        supports_atomic_ddl: adapter.supports_atomic_ddl(),
        table_count,
        column_count,
        index_count,
        validation_errors: collected.errors.iter().map(ToString::to_string).collect(),
        warnings: collected.warnings.clone(),
        pending_ops,
    })
}

/// Renders the pending diff as one line per operation. Returns `Err` only on
/// a collector validation error, matching "returns non-zero only on
/// validation error".
pub fn run_diff(
    registry: &SchemaRegistry,
    reader: &mut dyn SchemaReader,
    database: &str,
    ignore_tables: &BTreeSet<String>,
) -> Result<String> {
    let (ops, statements) = plan_diff(registry, reader, database, ignore_tables)?;
    if ops.is_empty() {
        return Ok("no pending operations".to_string());
    }

    let lines: Vec<String> = statements
        .iter()
        .map(|s| format!("{} {} -- {}", if s.destructive { "[destructive]" } else { "[safe]      " }, s.table, s.description))
        .collect();
    Ok(lines.join("\n"))
}

pub struct SyncRun {
    pub outcome_summary: String,
    pub audit_path: Option<std::path::PathBuf>,
}

#[allow(clippy::too_many_arguments)]
pub fn run_sync(
    registry: &SchemaRegistry,
    reader: &mut dyn SchemaReader,
    adapter: &mut dyn DatabaseAdapter,
    database: &str,
    options: &SyncOptions,
    output: Option<&Path>,
    audit_root: &Path,
) -> Result<SyncRun> {
    let outcome = sync(registry, reader, adapter, database, options)?;

    let sql_script: Vec<String> = outcome.executed.iter().map(|s| format!("{};", s.sql)).collect();
    if let Some(path) = output {
        let _ = fs::write(path, sql_script.join("\n"));
    }

    let audit_path = if !options.dry_run && !outcome.executed.is_empty() {
        let (_, statements) = plan_diff(registry, reader, database, &options.ignore_tables)?;
        let executed_descriptions: BTreeSet<&str> = outcome.executed.iter().map(|s| s.description.as_str()).collect();
        let planned: Vec<_> = statements
            .into_iter()
            .filter(|s| executed_descriptions.contains(s.description.as_str()))
            .collect();
        let record = AuditRecord::from_statements(Utc::now(), &planned);
        Some(record.write_to(audit_root)?)
    } else {
        None
    };

    let summary = format!(
        "executed {} operation(s), skipped {} destructive operation(s){}",
        outcome.executed.len(),
        outcome.skipped.len(),
        if options.dry_run { " (dry run)" } else { "" }
    );

    Ok(SyncRun { outcome_summary: summary, audit_path })
}

pub struct SeedRun {
    pub per_table_counts: Vec<(String, usize)>,
}

pub fn run_seed(adapter: &mut dyn DatabaseAdapter, sources: &[Box<dyn SeedSource>]) -> Result<SeedRun> {
    let mut per_table_counts = Vec::new();
    for source in sources {
        let rows = source.rows();
        let outcome = semitexa_core::run_seed(adapter, source.table(), &rows)?;
        per_table_counts.push((source.table().to_string(), outcome.row_count));
    }
    Ok(SeedRun { per_table_counts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use semitexa_core::UpsertColumn;
    use semitexa_derive::Resource as DeriveResource;
    use semitexa_testkit::FakeAdapter;
    use tempfile::tempdir;

    #[derive(DeriveResource)]
    #[table(name = "widgets")]
    struct Widget {
        #[primary_key(strategy = "auto")]
        #[column(sql_type = "int")]
        id: i64,
        #[column(sql_type = "varchar", length = 255)]
        name: String,
    }

    fn registry() -> SchemaRegistry {
        SchemaRegistry::builder().register::<Widget>().build()
    }

    #[test]
    fn status_reports_one_declared_table_against_an_empty_live_schema() {
        let registry = registry();
        let mut reader = semitexa_testkit::FakeReader::default();
        let adapter = FakeAdapter::new();
        let report = run_status(&registry, &mut reader, &adapter, None, 4, "semitexa", &BTreeSet::new()).unwrap();
        assert_eq!(report.table_count, 1);
        assert_eq!(report.pending_ops, 1);
        assert!(report.validation_errors.is_empty());
    }

    #[test]
    fn diff_reports_a_create_table_against_an_empty_live_schema() {
        let registry = registry();
        let mut reader = semitexa_testkit::FakeReader::default();
        let report = run_diff(&registry, &mut reader, "semitexa", &BTreeSet::new()).unwrap();
        assert!(report.contains("widgets"));
    }

    #[test]
    fn sync_executes_the_create_table_and_writes_an_audit_record() {
        let registry = registry();
        let mut reader = semitexa_testkit::FakeReader::default();
        let mut adapter = FakeAdapter::new();
        let options = SyncOptions::default();
        let dir = tempdir().unwrap();
        let run = run_sync(&registry, &mut reader, &mut adapter, "semitexa", &options, None, dir.path()).unwrap();
        assert!(run.outcome_summary.starts_with("executed 1"));
        assert!(run.audit_path.is_some());
    }

    struct DummySeed;
    impl SeedSource for DummySeed {
        fn table(&self) -> &str {
            "widgets"
        }

        fn rows(&self) -> Vec<Vec<UpsertColumn<'_>>> {
            vec![vec![
                UpsertColumn { name: "id", literal: "1".to_string() },
                UpsertColumn { name: "name", literal: "'first'".to_string() },
            ]]
        }
    }

    #[test]
    fn seed_upserts_every_source() {
        let mut adapter = FakeAdapter::new();
        let sources: Vec<Box<dyn SeedSource>> = vec![Box::new(DummySeed)];
        let run = run_seed(&mut adapter, &sources).unwrap();
        assert_eq!(run.per_table_counts, vec![("widgets".to_string(), 1)]);
    }
}
