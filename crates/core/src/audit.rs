//! Persists every sync run as a timestamped JSON record (plus the raw SQL
//! text) under `{root}/var/migrations/history/`, so a destructive run can be
//! reconstructed after the fact even though MySQL itself has no DDL
//! transaction log to fall back on.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::plan::PlannedStatement;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditedOperation {
    #[serde(rename = "type")]
    pub kind: String,
    pub table: String,
    pub destructive: bool,
    pub description: String,
    pub sql: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub operations_count: usize,
    pub operations: Vec<AuditedOperation>,
}

impl AuditRecord {
    #[must_use]
    pub fn from_statements(timestamp: DateTime<Utc>, statements: &[PlannedStatement]) -> Self {
        let operations = statements
            .iter()
            .map(|statement| AuditedOperation {
                kind: operation_kind(&statement.sql),
                table: statement.table.clone(),
                destructive: statement.destructive,
                description: statement.description.clone(),
                sql: statement.sql.clone(),
            })
            .collect::<Vec<_>>();

        Self {
            timestamp,
            operations_count: operations.len(),
            operations,
        }
    }

    /// Writes `{root}/var/migrations/history/{timestamp}.json` and the
    /// sibling `.sql` file with one statement per line, in order.
    pub fn write_to(&self, root: &Path) -> Result<PathBuf> {
        let history_dir = root.join("var").join("migrations").join("history");
        fs::create_dir_all(&history_dir)
            .map_err(|e| Error::Integrity(format!("could not create {}: {e}", history_dir.display())))?;

        let stamp = self.timestamp.format("%Y%m%d%H%M%S");
        let json_path = history_dir.join(format!("{stamp}.json"));
        let sql_path = history_dir.join(format!("{stamp}.sql"));

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Integrity(format!("could not serialize audit record: {e}")))?;
        fs::write(&json_path, json)
            .map_err(|e| Error::Integrity(format!("could not write {}: {e}", json_path.display())))?;

        let sql_text = self
            .operations
            .iter()
            .map(|op| format!("{};", op.sql))
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(&sql_path, sql_text)
            .map_err(|e| Error::Integrity(format!("could not write {}: {e}", sql_path.display())))?;

        Ok(json_path)
    }
}

fn operation_kind(sql: &str) -> String {
    sql.split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_kind_extracts_leading_verb_pair() {
        assert_eq!(operation_kind("CREATE TABLE `users` (...)"), "CREATE TABLE");
        assert_eq!(operation_kind("DROP TABLE `legacy`"), "DROP TABLE");
    }
}
