//! MySQL DDL rendering shared by the comparator (to build the "expected"
//! side of a type/default comparison) and the sync engine (to build the SQL
//! text of each [`DiffOp`](crate::diff_op::DiffOp)). Single-dialect, so this
//! is free functions rather than a trait object.

use crate::schema::{ColumnDefinition, ColumnType, ForeignKeyDefinition, IndexDefinition, Literal, TableDefinition};

pub const TABLE_OPTIONS: &str = "ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci";

#[must_use]
pub fn render_column_type(column: &ColumnDefinition) -> String {
    match column.column_type {
        ColumnType::Varchar => format!("varchar({})", column.length.unwrap_or(255)),
        ColumnType::Char => format!("char({})", column.length.unwrap_or(1)),
        ColumnType::Text => "text".to_string(),
        ColumnType::MediumText => "mediumtext".to_string(),
        ColumnType::LongText => "longtext".to_string(),
        ColumnType::TinyInt | ColumnType::Boolean => "tinyint".to_string(),
        ColumnType::SmallInt => "smallint".to_string(),
        ColumnType::Int => "int".to_string(),
        ColumnType::BigInt => "bigint".to_string(),
        ColumnType::Float => "float".to_string(),
        ColumnType::Double => "double".to_string(),
        ColumnType::Decimal => format!(
            "decimal({},{})",
            column.precision.unwrap_or(10),
            column.scale.unwrap_or(0)
        ),
        ColumnType::DateTime => "datetime".to_string(),
        ColumnType::Timestamp => "timestamp".to_string(),
        ColumnType::Date => "date".to_string(),
        ColumnType::Time => "time".to_string(),
        ColumnType::Year => "year".to_string(),
        ColumnType::Json => "json".to_string(),
        ColumnType::Blob => "blob".to_string(),
        ColumnType::Binary => format!("binary({})", column.length.unwrap_or(1)),
    }
}

/// Normalizes a raw `COLUMN_TYPE` (or our own rendered type) by lowercasing,
/// trimming, and stripping integer display widths, so `"int(11)"` and
/// `"int"` compare equal.
#[must_use]
pub fn normalize_column_type(raw: &str) -> String {
    let raw = raw.trim().to_lowercase();
    const INTEGER_KEYWORDS: [&str; 6] = ["tinyint", "smallint", "mediumint", "int", "bigint", "year"];

    for keyword in INTEGER_KEYWORDS {
        if let Some(rest) = raw.strip_prefix(keyword) {
            let rest = rest.trim_start();
            if let Some(after_paren) = rest.strip_prefix('(').and_then(|r| r.split_once(')')) {
                return format!("{keyword}{}", after_paren.1).trim().to_string();
            }
            return raw.clone();
        }
    }

    raw
}

/// The literal value MySQL stores in `COLUMN_DEFAULT` for a declared
/// default, or `None` when no default is declared.
#[must_use]
pub fn normalized_default_value(default: Option<&Literal>) -> Option<String> {
    match default {
        None => None,
        Some(Literal::Bool(v)) => Some(if *v { "1" } else { "0" }.to_string()),
        Some(Literal::Int(v)) => Some(v.to_string()),
        Some(Literal::Float(v)) => Some(v.to_string()),
        Some(Literal::Str(v)) => Some(v.clone()),
    }
}

/// Renders the ` DEFAULT ...` clause (including leading space), or an empty
/// string when no clause should be emitted.
#[must_use]
pub fn render_default_clause(column: &ColumnDefinition) -> String {
    match &column.default {
        None if column.nullable => " DEFAULT NULL".to_string(),
        None => String::new(),
        Some(Literal::Bool(v)) => format!(" DEFAULT {}", i32::from(*v)),
        Some(Literal::Int(v)) => format!(" DEFAULT {v}"),
        Some(Literal::Float(v)) => format!(" DEFAULT {v}"),
        Some(Literal::Str(v)) => format!(" DEFAULT '{}'", v.replace('\'', "''")),
    }
}

#[must_use]
pub fn render_column_definition(column: &ColumnDefinition) -> String {
    let mut sql = format!("{} {}", column.name.quoted(), render_column_type(column));
    if !column.nullable {
        sql.push_str(" NOT NULL");
    } else {
        sql.push_str(" NULL");
    }
    sql.push_str(&render_default_clause(column));
    if column.is_auto_increment() {
        sql.push_str(" AUTO_INCREMENT");
    }
    sql
}

/// Columns, primary key, and indexes only. Foreign keys never render inline
/// here — `ordering::order_create_tables` always strips them into separate
/// `ADD FOREIGN KEY` statements that run once every table exists.
#[must_use]
pub fn render_create_table(table: &TableDefinition) -> String {
    let mut parts: Vec<String> = table.columns.iter().map(render_column_definition).collect();

    if let Some(pk) = table.primary_key() {
        parts.push(format!("PRIMARY KEY ({})", pk.name.quoted()));
    }

    for index in &table.indexes {
        let cols = index
            .columns
            .iter()
            .map(|c| c.quoted())
            .collect::<Vec<_>>()
            .join(", ");
        let kind = if index.unique { "UNIQUE KEY" } else { "KEY" };
        parts.push(format!("{kind} {} ({cols})", index.name.quoted()));
    }

    format!(
        "CREATE TABLE {} (\n  {}\n) {TABLE_OPTIONS}",
        table.name.quoted(),
        parts.join(",\n  ")
    )
}

#[must_use]
pub fn render_add_column(table: &str, column: &ColumnDefinition) -> String {
    format!(
        "ALTER TABLE `{table}` ADD COLUMN {}",
        render_column_definition(column)
    )
}

#[must_use]
pub fn render_modify_column(table: &str, column: &ColumnDefinition) -> String {
    format!(
        "ALTER TABLE `{table}` MODIFY COLUMN {}",
        render_column_definition(column)
    )
}

#[must_use]
pub fn render_add_index(table: &str, index: &IndexDefinition) -> String {
    let cols = index
        .columns
        .iter()
        .map(|c| c.quoted())
        .collect::<Vec<_>>()
        .join(", ");
    let kind = if index.unique { "UNIQUE INDEX" } else { "INDEX" };
    format!("ALTER TABLE `{table}` ADD {kind} {} ({cols})", index.name.quoted())
}

#[must_use]
pub fn render_drop_index(table: &str, name: &str) -> String {
    format!("ALTER TABLE `{table}` DROP INDEX `{name}`")
}

#[must_use]
pub fn render_add_foreign_key(table: &str, fk: &ForeignKeyDefinition) -> String {
    format!(
        "ALTER TABLE `{table}` ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {} ON UPDATE {}",
        fk.name.quoted(),
        fk.column.quoted(),
        fk.referenced_table.quoted(),
        fk.referenced_column.quoted(),
        fk.on_delete.to_sql(),
        fk.on_update.to_sql(),
    )
}

#[must_use]
pub fn render_drop_foreign_key(table: &str, name: &str) -> String {
    format!("ALTER TABLE `{table}` DROP FOREIGN KEY `{name}`")
}

#[must_use]
pub fn render_drop_column(table: &str, column: &str) -> String {
    format!("ALTER TABLE `{table}` DROP COLUMN `{column}`")
}

#[must_use]
pub fn render_mark_table_deprecated(table: &str) -> String {
    format!("ALTER TABLE `{table}` COMMENT = '{}'", crate::collector::DEPRECATION_SENTINEL)
}

#[must_use]
pub fn render_drop_table(table: &str) -> String {
    format!("DROP TABLE `{table}`")
}

/// Phase 1 of a two-phase column drop: restate the live column's definition
/// verbatim, adding only the deprecation sentinel as its comment.
#[must_use]
pub fn render_mark_column_deprecated(table: &str, state: &crate::reader::DbColumnState) -> String {
    let mut sql = format!(
        "ALTER TABLE `{table}` MODIFY COLUMN `{}` {}",
        state.name, state.column_type
    );
    sql.push_str(if state.nullable { " NULL" } else { " NOT NULL" });
    if let Some(default) = &state.default {
        sql.push_str(&format!(" DEFAULT '{}'", default.replace('\'', "''")));
    }
    if state.auto_increment {
        sql.push_str(" AUTO_INCREMENT");
    }
    sql.push_str(&format!(" COMMENT '{}'", crate::collector::DEPRECATION_SENTINEL));
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_integer_display_width() {
        assert_eq!(normalize_column_type("int(11)"), "int");
        assert_eq!(normalize_column_type("INT(10) UNSIGNED"), "int unsigned");
        assert_eq!(normalize_column_type("varchar(255)"), "varchar(255)");
    }

    #[test]
    fn default_clause_matches_documented_rendering() {
        let mut column = ColumnDefinition {
            name: crate::schema::Ident::new("active").unwrap(),
            property_name: "active".to_string(),
            column_type: ColumnType::Boolean,
            source_type: "boolean".to_string(),
            nullable: false,
            length: None,
            precision: None,
            scale: None,
            default: Some(Literal::Bool(true)),
            is_primary_key: false,
            pk_strategy: None,
            is_deprecated: false,
        };
        assert_eq!(render_default_clause(&column), " DEFAULT 1");

        column.default = None;
        assert_eq!(render_default_clause(&column), "");

        column.nullable = true;
        assert_eq!(render_default_clause(&column), " DEFAULT NULL");
    }
}
