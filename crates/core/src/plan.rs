//! Turns a comparator `Vec<DiffOp>` into an ordered, renderable execution
//! plan. Generation and planning are collapsed into one stage here since
//! there is only one dialect to render against.

use crate::ddl;
use crate::diff_op::DiffOp;
pub use crate::ordering::sort_diff_ops;

#[derive(Debug, Clone, PartialEq)]
pub struct DdlPlan {
    ordered_ops: Vec<DiffOp>,
}

impl DdlPlan {
    #[must_use]
    pub fn new(ordered_ops: Vec<DiffOp>) -> Self {
        Self { ordered_ops }
    }

    #[must_use]
    pub fn ops(&self) -> &[DiffOp] {
        &self.ordered_ops
    }

    #[must_use]
    pub fn into_ops(self) -> Vec<DiffOp> {
        self.ordered_ops
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered_ops.is_empty()
    }

    /// Renders every op into the SQL text the executor will run, in order.
    #[must_use]
    pub fn statements(&self) -> Vec<PlannedStatement> {
        self.ordered_ops.iter().map(render_statement).collect()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DdlPlanner;

impl DdlPlanner {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn build(&self, ops: Vec<DiffOp>) -> DdlPlan {
        DdlPlan::new(sort_diff_ops(ops))
    }
}

#[must_use]
pub fn build_ddl_plan(ops: Vec<DiffOp>) -> DdlPlan {
    DdlPlanner::new().build(ops)
}

/// One rendered statement, carrying enough of the originating op to drive
/// audit logging and destructive-op diagnostics without re-deriving it from
/// SQL text.
#[derive(Debug, Clone)]
pub struct PlannedStatement {
    pub sql: String,
    pub destructive: bool,
    pub table: String,
    pub description: String,
}

fn render_statement(op: &DiffOp) -> PlannedStatement {
    let destructive = op.is_destructive();
    let table = op.table_name().to_string();

    let (sql, description) = match op {
        DiffOp::CreateTable(definition) => (
            ddl::render_create_table(definition),
            format!("create table `{}`", definition.name),
        ),
        DiffOp::MarkTableDeprecated { table } => (
            ddl::render_mark_table_deprecated(table.as_str()),
            format!("mark table `{table}` deprecated"),
        ),
        DiffOp::DropTable { table, .. } => (
            ddl::render_drop_table(table.as_str()),
            format!("drop table `{table}`"),
        ),
        DiffOp::AddColumn { table, column } => (
            ddl::render_add_column(table.as_str(), column),
            format!("add column `{}`.`{}`", table, column.name),
        ),
        DiffOp::AlterColumn { table, column, .. } => (
            ddl::render_modify_column(table.as_str(), column),
            format!("alter column `{}`.`{}`", table, column.name),
        ),
        DiffOp::MarkColumnDeprecated { table, state, .. } => (
            ddl::render_mark_column_deprecated(table.as_str(), state),
            format!("mark column `{}`.`{}` deprecated", table, state.name),
        ),
        DiffOp::DropColumn { table, column } => (
            ddl::render_drop_column(table.as_str(), column.as_str()),
            format!("drop column `{table}`.`{column}`"),
        ),
        DiffOp::AddIndex { table, index } => (
            ddl::render_add_index(table.as_str(), index),
            format!("add index `{}` on `{table}`", index.name),
        ),
        DiffOp::DropIndex { table, name } => (
            ddl::render_drop_index(table.as_str(), name.as_str()),
            format!("drop index `{name}` on `{table}`"),
        ),
        DiffOp::AddForeignKey { table, fk } => (
            ddl::render_add_foreign_key(table.as_str(), fk),
            format!("add foreign key `{}` on `{table}`", fk.name),
        ),
        DiffOp::DropForeignKey { table, name } => (
            ddl::render_drop_foreign_key(table.as_str(), name.as_str()),
            format!("drop foreign key `{name}` on `{table}`"),
        ),
    };

    PlannedStatement {
        sql,
        destructive,
        table,
        description,
    }
}
