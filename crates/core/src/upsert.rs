//! Smart upsert: one `INSERT ... VALUES (...), (...), ... ON DUPLICATE KEY
//! UPDATE` per batch, so a seed run is a single atomic write instead of a
//! row-by-row loop two concurrent runs could interleave. Also hosts the
//! seed runner and the pivot-table rewrite `ManyToMany` writes use.

use crate::adapter::DatabaseAdapter;
use crate::error::Result;
use crate::tx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Affected-rows was 0: the row already existed with identical values.
    Unchanged,
    /// Affected-rows was 1: a new row was inserted.
    Inserted,
    /// Affected-rows was 2: an existing row was updated.
    Updated,
}

impl UpsertOutcome {
    #[must_use]
    pub fn from_affected_rows(affected: u64) -> Self {
        match affected {
            0 => Self::Unchanged,
            1 => Self::Inserted,
            // MySQL reports 2 for the ON DUPLICATE KEY UPDATE path. This
            // mapping only holds for a single-row statement; a batch with
            // more than one row uses `UpsertBatchOutcome` instead.
            _ => Self::Updated,
        }
    }
}

/// The result of one atomic multi-row upsert. MySQL's affected-rows total
/// for the batch (0 per unchanged row, 1 per insert, 2 per update, summed
/// across every row) can't be decomposed back into per-row
/// inserted/updated/unchanged counts without the server's `Records`/
/// `Duplicates` counters, which this adapter surface doesn't expose — so the
/// batch path reports the row count and the raw affected-rows total rather
/// than guessing a breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpsertBatchOutcome {
    pub row_count: usize,
    pub rows_affected: u64,
}

impl UpsertBatchOutcome {
    /// The unambiguous single-row classification, when the batch held
    /// exactly one row.
    #[must_use]
    pub fn single_row_outcome(self) -> Option<UpsertOutcome> {
        (self.row_count == 1).then(|| UpsertOutcome::from_affected_rows(self.rows_affected))
    }
}

/// One column's name paired with its already-escaped SQL literal. Built by
/// the caller from a hydrated value (see `hydrate.rs`); this module stays
/// free of per-type formatting rules.
pub struct UpsertColumn<'a> {
    pub name: &'a str,
    pub literal: String,
}

/// Upserts a single row. Prefer [`upsert_batch`] for more than one row — it
/// is the form that actually satisfies the atomic-write-per-batch property.
pub fn upsert(
    adapter: &mut dyn DatabaseAdapter,
    table: &str,
    columns: &[UpsertColumn<'_>],
) -> Result<UpsertOutcome> {
    let sql = render_upsert(table, columns);
    let affected = adapter.execute(&sql)?;
    Ok(UpsertOutcome::from_affected_rows(affected.0))
}

/// Upserts every row in one statement: a single `INSERT ... VALUES
/// (...), (...), ... ON DUPLICATE KEY UPDATE`, so the whole batch either
/// lands or fails together instead of interleaving row by row with a
/// concurrent seed run.
pub fn upsert_batch(
    adapter: &mut dyn DatabaseAdapter,
    table: &str,
    rows: &[Vec<UpsertColumn<'_>>],
) -> Result<UpsertBatchOutcome> {
    if rows.is_empty() {
        return Ok(UpsertBatchOutcome::default());
    }

    let sql = render_upsert_batch(table, rows);
    let affected = adapter.execute(&sql)?;
    Ok(UpsertBatchOutcome {
        row_count: rows.len(),
        rows_affected: affected.0,
    })
}

fn column_list(columns: &[UpsertColumn<'_>]) -> String {
    columns.iter().map(|c| format!("`{}`", c.name)).collect::<Vec<_>>().join(", ")
}

fn update_list(columns: &[UpsertColumn<'_>]) -> String {
    columns.iter().map(|c| format!("`{0}` = VALUES(`{0}`)", c.name)).collect::<Vec<_>>().join(", ")
}

fn render_upsert(table: &str, columns: &[UpsertColumn<'_>]) -> String {
    let value_list = columns.iter().map(|c| c.literal.clone()).collect::<Vec<_>>().join(", ");

    format!(
        "INSERT INTO `{table}` ({}) VALUES ({value_list}) ON DUPLICATE KEY UPDATE {}",
        column_list(columns),
        update_list(columns),
    )
}

/// Every row is assumed to carry the same column set, in the same order —
/// true of every seed source, which renders one fixed set of columns per
/// table (see `cli::seed::SeedSource`).
fn render_upsert_batch(table: &str, rows: &[Vec<UpsertColumn<'_>>]) -> String {
    let columns = &rows[0];
    let value_rows = rows
        .iter()
        .map(|row| format!("({})", row.iter().map(|c| c.literal.clone()).collect::<Vec<_>>().join(", ")))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO `{table}` ({}) VALUES {value_rows} ON DUPLICATE KEY UPDATE {}",
        column_list(columns),
        update_list(columns),
    )
}

/// Rewrites a `ManyToMany` pivot's rows for one owner: delete then re-insert
/// inside a transaction, so a concurrent reader never observes a partially
/// updated set of associations.
pub fn replace_pivot_rows(
    adapter: &mut dyn DatabaseAdapter,
    pivot_table: &str,
    owner_column: &str,
    owner_id: &str,
    related_column: &str,
    related_ids: &[String],
) -> Result<()> {
    tx::run(adapter, |txn| {
        txn.execute(&format!(
            "DELETE FROM `{pivot_table}` WHERE `{owner_column}` = '{}'",
            owner_id.replace('\'', "''")
        ))?;

        for related_id in related_ids {
            txn.execute(&format!(
                "INSERT INTO `{pivot_table}` (`{owner_column}`, `{related_column}`) VALUES ('{}', '{}')",
                owner_id.replace('\'', "''"),
                related_id.replace('\'', "''"),
            ))?;
        }

        Ok(())
    })
}

/// Runs a whole seed set through one atomic [`upsert_batch`] call, so a
/// concurrent seed run can never observe it half-applied.
pub fn run_seed(
    adapter: &mut dyn DatabaseAdapter,
    table: &str,
    rows: &[Vec<UpsertColumn<'_>>],
) -> Result<UpsertBatchOutcome> {
    upsert_batch(adapter, table, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use semitexa_testkit::FakeAdapter;

    #[test]
    fn affected_rows_map_to_the_documented_outcomes() {
        assert_eq!(UpsertOutcome::from_affected_rows(0), UpsertOutcome::Unchanged);
        assert_eq!(UpsertOutcome::from_affected_rows(1), UpsertOutcome::Inserted);
        assert_eq!(UpsertOutcome::from_affected_rows(2), UpsertOutcome::Updated);
    }

    #[test]
    fn render_upsert_emits_values_references_for_every_column() {
        let columns = vec![
            UpsertColumn { name: "id", literal: "1".to_string() },
            UpsertColumn { name: "email", literal: "'a@example.com'".to_string() },
        ];
        let sql = render_upsert("users", &columns);
        assert!(sql.contains("ON DUPLICATE KEY UPDATE `id` = VALUES(`id`), `email` = VALUES(`email`)"));
    }

    fn row(id: &str, email: &str) -> Vec<UpsertColumn<'static>> {
        vec![
            UpsertColumn { name: "id", literal: id.to_string() },
            UpsertColumn { name: "email", literal: format!("'{email}'") },
        ]
    }

    #[test]
    fn render_upsert_batch_emits_one_statement_with_a_values_tuple_per_row() {
        let rows = vec![row("1", "a@example.com"), row("2", "b@example.com")];
        let sql = render_upsert_batch("users", &rows);

        assert_eq!(sql.matches("INSERT INTO").count(), 1);
        assert!(sql.contains("VALUES (1, 'a@example.com'), (2, 'b@example.com')"));
        assert!(sql.contains("ON DUPLICATE KEY UPDATE `id` = VALUES(`id`), `email` = VALUES(`email`)"));
    }

    #[test]
    fn upsert_batch_runs_the_whole_set_as_a_single_adapter_call() {
        let mut adapter = FakeAdapter::new();
        let rows = vec![row("1", "a@example.com"), row("2", "b@example.com"), row("3", "c@example.com")];

        let outcome = upsert_batch(&mut adapter, "users", &rows).unwrap();
        assert_eq!(adapter.executed.len(), 1);
        assert_eq!(outcome.row_count, 3);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let mut adapter = FakeAdapter::new();
        let outcome = upsert_batch(&mut adapter, "users", &[]).unwrap();
        assert_eq!(outcome, UpsertBatchOutcome::default());
        assert!(adapter.executed.is_empty());
    }

    #[test]
    fn single_row_batch_outcome_recovers_the_unambiguous_classification() {
        let mut adapter = FakeAdapter::new();
        let outcome = upsert_batch(&mut adapter, "users", &[row("1", "a@example.com")]).unwrap();
        assert_eq!(outcome.single_row_outcome(), Some(UpsertOutcome::Inserted));
    }

    #[test]
    fn multi_row_batch_outcome_has_no_single_row_classification() {
        let mut adapter = FakeAdapter::new();
        let rows = vec![row("1", "a@example.com"), row("2", "b@example.com")];
        let outcome = upsert_batch(&mut adapter, "users", &rows).unwrap();
        assert_eq!(outcome.single_row_outcome(), None);
    }
}
