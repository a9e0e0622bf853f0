//! Diffs the declared schema against live state into an unordered
//! `Vec<DiffOp>`. Ordering into an `ExecutionPlan` is `ordering`/`plan`'s job.
//!
//! Table/column/index/foreign-key comparison only — no renames, check
//! constraints, or partitioning, none of which this crate's scope covers.

use std::collections::BTreeSet;

use crate::collector::DEPRECATION_SENTINEL;
use crate::ddl::{normalize_column_type, normalized_default_value, render_column_type};
use crate::diff_op::{ColumnChange, DiffOp};
use crate::reader::{DbColumnState, DbForeignKeyState, DbIndexState, DbTableState, LiveSchemaState};
use crate::schema::{ColumnDefinition, DeclaredSchema, ForeignKeyDefinition, Ident, IndexDefinition, TableDefinition};

#[must_use]
pub fn compare(declared: &DeclaredSchema, live: &LiveSchemaState) -> Vec<DiffOp> {
    let mut ops = Vec::new();
    let mut matched_live: BTreeSet<String> = BTreeSet::new();

    for table in &declared.tables {
        match live.table(table.name.as_str()) {
            Some(live_table) => {
                matched_live.insert(live_table.name.clone());
                compare_table(table, live, &mut ops);
            }
            None => ops.push(DiffOp::CreateTable(table.clone())),
        }
    }

    for live_table in &live.tables {
        if matched_live.contains(&live_table.name) {
            continue;
        }
        ops.push(drop_table_op(live_table));
    }

    ops
}

fn drop_table_op(live_table: &DbTableState) -> DiffOp {
    let table_ident = Ident::new(live_table.name.clone()).unwrap_or_else(|_| fallback_ident(&live_table.name));
    if live_table.comment == DEPRECATION_SENTINEL {
        DiffOp::DropTable {
            table: table_ident,
            state: live_table.clone(),
        }
    } else {
        DiffOp::MarkTableDeprecated { table: table_ident }
    }
}

fn compare_table(table: &TableDefinition, live: &LiveSchemaState, ops: &mut Vec<DiffOp>) {
    compare_columns(table, live, ops);
    compare_indexes(table, live, ops);
    compare_foreign_keys(table, live, ops);
}

fn compare_columns(table: &TableDefinition, live: &LiveSchemaState, ops: &mut Vec<DiffOp>) {
    let live_columns: Vec<&DbColumnState> = live.columns_for(table.name.as_str()).collect();
    let mut matched = BTreeSet::new();

    for column in &table.columns {
        match live_columns.iter().find(|c| c.name == column.name.as_str()) {
            Some(live_column) => {
                matched.insert(live_column.name.clone());
                let changes = column_changes(column, live_column);
                if !changes.is_empty() {
                    ops.push(DiffOp::AlterColumn {
                        table: table.name.clone(),
                        column: Box::new(column.clone()),
                        changes,
                    });
                }
            }
            None => ops.push(DiffOp::AddColumn {
                table: table.name.clone(),
                column: Box::new(column.clone()),
            }),
        }
    }

    for live_column in live_columns {
        if matched.contains(&live_column.name) {
            continue;
        }
        let column_ident =
            Ident::new(live_column.name.clone()).unwrap_or_else(|_| fallback_ident(&live_column.name));
        if live_column.comment == DEPRECATION_SENTINEL {
            ops.push(DiffOp::DropColumn {
                table: table.name.clone(),
                column: column_ident,
            });
        } else {
            ops.push(DiffOp::MarkColumnDeprecated {
                table: table.name.clone(),
                column: column_ident,
                state: live_column.clone(),
            });
        }
    }
}

fn column_changes(declared: &ColumnDefinition, live: &DbColumnState) -> Vec<ColumnChange> {
    let mut changes = Vec::new();

    let declared_type = normalize_column_type(&render_column_type(declared));
    let live_type = normalize_column_type(&live.column_type);
    if declared_type != live_type {
        changes.push(ColumnChange::SetType {
            to: declared.column_type,
            widening: is_widening_change(&live.column_type, declared),
        });
    }

    if declared.nullable != live.nullable {
        changes.push(ColumnChange::SetNullable(declared.nullable));
    }

    if declared.is_auto_increment() != live.auto_increment {
        changes.push(ColumnChange::SetAutoIncrement(declared.is_auto_increment()));
    }

    let declared_default = normalized_default_value(declared.default.as_ref());
    if declared_default != live.default {
        changes.push(ColumnChange::SetDefault(declared_default));
    }

    changes
}

fn parse_sql_type(raw: &str) -> (String, Option<u32>) {
    let raw = raw.trim().to_lowercase();
    let base: String = raw.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let rest = &raw[base.len()..];
    let len = rest
        .trim_start()
        .strip_prefix('(')
        .and_then(|r| r.split_once(')'))
        .and_then(|(digits, _)| digits.split(',').next())
        .and_then(|digits| digits.trim().parse().ok());
    (base, len)
}

const INTEGER_RANKS: [&str; 4] = ["tinyint", "smallint", "int", "bigint"];

fn integer_rank(base: &str) -> Option<usize> {
    INTEGER_RANKS.iter().position(|k| *k == base)
}

fn is_widening_change(live_raw: &str, declared: &ColumnDefinition) -> bool {
    let (live_base, live_len) = parse_sql_type(live_raw);
    let declared_rendered = render_column_type(declared);
    let (declared_base, declared_len) = parse_sql_type(&declared_rendered);

    match (live_base.as_str(), declared_base.as_str()) {
        ("varchar", "varchar") | ("char", "char") => declared_len.unwrap_or(0) >= live_len.unwrap_or(0),
        ("varchar", "text" | "mediumtext" | "longtext") => true,
        ("char", "varchar") => true,
        ("text", "mediumtext" | "longtext") => true,
        ("mediumtext", "longtext") => true,
        ("float", "double") => true,
        (a, b) => match (integer_rank(a), integer_rank(b)) {
            (Some(from), Some(to)) => to >= from,
            _ => false,
        },
    }
}

fn compare_indexes(table: &TableDefinition, live: &LiveSchemaState, ops: &mut Vec<DiffOp>) {
    let live_indexes: Vec<&DbIndexState> = live.indexes_for(table.name.as_str()).collect();
    let mut matched = BTreeSet::new();

    for index in &table.indexes {
        match live_indexes.iter().find(|i| i.name == index.name.as_str()) {
            Some(live_index) => {
                matched.insert(live_index.name.clone());
                if !index_matches(index, live_index) {
                    ops.push(DiffOp::DropIndex {
                        table: table.name.clone(),
                        name: index.name.clone(),
                    });
                    ops.push(DiffOp::AddIndex {
                        table: table.name.clone(),
                        index: index.clone(),
                    });
                }
            }
            None => ops.push(DiffOp::AddIndex {
                table: table.name.clone(),
                index: index.clone(),
            }),
        }
    }

    for live_index in live_indexes {
        if matched.contains(&live_index.name) {
            continue;
        }
        ops.push(DiffOp::DropIndex {
            table: table.name.clone(),
            name: Ident::new(live_index.name.clone()).unwrap_or_else(|_| fallback_ident(&live_index.name)),
        });
    }
}

fn index_matches(declared: &IndexDefinition, live: &DbIndexState) -> bool {
    declared.unique == live.unique
        && declared.columns.iter().map(Ident::as_str).eq(live.columns.iter().map(String::as_str))
}

fn compare_foreign_keys(table: &TableDefinition, live: &LiveSchemaState, ops: &mut Vec<DiffOp>) {
    let live_fks: Vec<&DbForeignKeyState> = live.foreign_keys_for(table.name.as_str()).collect();
    let mut matched = BTreeSet::new();

    for fk in &table.foreign_keys {
        match live_fks.iter().find(|f| f.name == fk.name.as_str()) {
            Some(live_fk) => {
                matched.insert(live_fk.name.clone());
                if !fk_matches(fk, live_fk) {
                    ops.push(DiffOp::DropForeignKey {
                        table: table.name.clone(),
                        name: fk.name.clone(),
                    });
                    ops.push(DiffOp::AddForeignKey {
                        table: table.name.clone(),
                        fk: fk.clone(),
                    });
                }
            }
            None => ops.push(DiffOp::AddForeignKey {
                table: table.name.clone(),
                fk: fk.clone(),
            }),
        }
    }

    for live_fk in live_fks {
        if matched.contains(&live_fk.name) {
            continue;
        }
        ops.push(DiffOp::DropForeignKey {
            table: table.name.clone(),
            name: Ident::new(live_fk.name.clone()).unwrap_or_else(|_| fallback_ident(&live_fk.name)),
        });
    }
}

fn fk_matches(declared: &ForeignKeyDefinition, live: &DbForeignKeyState) -> bool {
    declared.referenced_table.as_str() == live.referenced_table
        && declared.referenced_column.as_str() == live.referenced_column
        && declared.on_delete == live.on_delete
        && declared.on_update == live.on_update
}

/// Live-state identifiers are assumed valid (they round-tripped through
/// MySQL already); this only guards against a malformed row reaching the
/// comparator instead of being rejected as `SchemaStateError` upstream.
fn fallback_ident(raw: &str) -> Ident {
    Ident::new(raw.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_').collect::<String>())
        .unwrap_or_else(|_| Ident::new("invalid_identifier").expect("static literal is valid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_varchar_is_safe_narrowing_is_destructive() {
        let declared = ColumnDefinition {
            name: Ident::new("email").unwrap(),
            property_name: "email".to_string(),
            column_type: crate::schema::ColumnType::Varchar,
            source_type: "string".to_string(),
            nullable: false,
            length: Some(200),
            precision: None,
            scale: None,
            default: None,
            is_primary_key: false,
            pk_strategy: None,
            is_deprecated: false,
        };
        assert!(is_widening_change("varchar(100)", &declared));

        let mut narrowing = declared.clone();
        narrowing.length = Some(50);
        assert!(!is_widening_change("varchar(200)", &narrowing));
    }

    #[test]
    fn integer_rank_widening_order_is_respected() {
        assert!(integer_rank("bigint") > integer_rank("int"));
        assert!(integer_rank("int") > integer_rank("smallint"));
        assert!(integer_rank("smallint") > integer_rank("tinyint"));
    }
}
