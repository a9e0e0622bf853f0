//! `SchemaReader` over `INFORMATION_SCHEMA`, grounded on the dialect's own
//! `export_queries.rs` + `adapter.rs` export-schema walk, narrowed from
//! "dump a dialect's full DDL" down to the table/column/index/foreign-key
//! shapes the comparator needs.

use std::collections::BTreeSet;

use mysql::Row as MysqlRow;
use mysql::prelude::Queryable;

use semitexa_core::{
    DbColumnState, DbForeignKeyState, DbIndexState, DbTableState, Error, ForeignKeyAction, LiveSchemaState,
    Result, SchemaReader,
};

use crate::connection::MysqlConnection;
use crate::export_queries;

impl SchemaReader for MysqlConnection {
    fn read(&mut self, database: &str, ignore_tables: &BTreeSet<String>) -> Result<LiveSchemaState> {
        let mut tables = read_tables(&mut self.conn, database)?;
        tables.retain(|t| !ignore_tables.contains(&t.name));

        let mut columns = read_columns(&mut self.conn, database)?;
        columns.retain(|c| !ignore_tables.contains(&c.table));

        let mut indexes = read_indexes(&mut self.conn, database)?;
        indexes.retain(|i| !ignore_tables.contains(&i.table));

        let mut foreign_keys = read_foreign_keys(&mut self.conn, database)?;
        foreign_keys.retain(|fk| !ignore_tables.contains(&fk.table));

        Ok(LiveSchemaState {
            tables,
            columns,
            indexes,
            foreign_keys,
        })
    }
}

fn read_tables(conn: &mut mysql::Conn, database: &str) -> Result<Vec<DbTableState>> {
    let rows: Vec<MysqlRow> = conn
        .exec(export_queries::TABLES_QUERY, (database,))
        .map_err(|source| query_error(export_queries::TABLES_QUERY, source))?;

    rows.iter()
        .map(|row| {
            Ok(DbTableState {
                name: column_string(row, export_queries::TABLES_QUERY, 0)?,
                comment: column_string(row, export_queries::TABLES_QUERY, 1)?,
            })
        })
        .collect()
}

fn read_columns(conn: &mut mysql::Conn, database: &str) -> Result<Vec<DbColumnState>> {
    let rows: Vec<MysqlRow> = conn
        .exec(export_queries::COLUMNS_QUERY, (database,))
        .map_err(|source| query_error(export_queries::COLUMNS_QUERY, source))?;

    rows.iter()
        .map(|row| {
            let query = export_queries::COLUMNS_QUERY;
            let is_nullable = column_string(row, query, 3)?;
            let extra = column_string(row, query, 6)?;
            let column_key = column_string(row, query, 5)?;
            Ok(DbColumnState {
                table: column_string(row, query, 0)?,
                name: column_string(row, query, 1)?,
                column_type: column_string(row, query, 2)?,
                nullable: is_nullable.eq_ignore_ascii_case("YES"),
                default: row.get_opt::<Option<String>, _>(4).and_then(std::result::Result::ok).flatten(),
                is_primary_key: column_key.eq_ignore_ascii_case("PRI"),
                auto_increment: extra.to_ascii_lowercase().contains("auto_increment"),
                comment: column_string(row, query, 7)?,
            })
        })
        .collect()
}

fn read_indexes(conn: &mut mysql::Conn, database: &str) -> Result<Vec<DbIndexState>> {
    let rows: Vec<MysqlRow> = conn
        .exec(export_queries::INDEXES_QUERY, (database,))
        .map_err(|source| query_error(export_queries::INDEXES_QUERY, source))?;

    let query = export_queries::INDEXES_QUERY;
    let mut indexes: Vec<DbIndexState> = Vec::new();
    for row in &rows {
        let table = column_string(row, query, 0)?;
        let name = column_string(row, query, 1)?;
        let column = column_string(row, query, 2)?;
        let non_unique: i64 = row.get(3).unwrap_or(1);

        if let Some(existing) = indexes.iter_mut().find(|i| i.table == table && i.name == name) {
            existing.columns.push(column);
        } else {
            indexes.push(DbIndexState {
                table,
                name,
                columns: vec![column],
                unique: non_unique == 0,
            });
        }
    }
    Ok(indexes)
}

fn read_foreign_keys(conn: &mut mysql::Conn, database: &str) -> Result<Vec<DbForeignKeyState>> {
    let rows: Vec<MysqlRow> = conn
        .exec(export_queries::FOREIGN_KEYS_QUERY, (database,))
        .map_err(|source| query_error(export_queries::FOREIGN_KEYS_QUERY, source))?;

    let query = export_queries::FOREIGN_KEYS_QUERY;
    rows.iter()
        .map(|row| {
            Ok(DbForeignKeyState {
                table: column_string(row, query, 0)?,
                column: column_string(row, query, 1)?,
                name: column_string(row, query, 2)?,
                referenced_table: column_string(row, query, 3)?,
                referenced_column: column_string(row, query, 4)?,
                on_delete: ForeignKeyAction::parse(&column_string(row, query, 5)?),
                on_update: ForeignKeyAction::parse(&column_string(row, query, 6)?),
            })
        })
        .collect()
}

fn column_string(row: &MysqlRow, query: &str, index: usize) -> Result<String> {
    row.get::<String, _>(index).ok_or_else(|| {
        Error::SchemaState(semitexa_core::SchemaStateError::MalformedRow {
            table: "information_schema".to_string(),
            reason: format!("column {index} of `{query}` was not a string"),
        })
    })
}

fn query_error(query: &str, source: mysql::Error) -> Error {
    Error::ConnectionLost(format!("{source} (query: {query})"))
}
