//! The operation vocabulary the comparator emits and the sync engine orders
//! and executes: table/column/index/FK operations only.

use crate::reader::{DbColumnState, DbTableState};
use crate::schema::{ColumnType, ForeignKeyDefinition, Ident, IndexDefinition, TableDefinition};

#[derive(Debug, Clone, PartialEq)]
pub enum DiffOp {
    CreateTable(TableDefinition),
    /// Phase 1 of a two-phase drop: mark the live table with the
    /// deprecation sentinel comment. Safe.
    MarkTableDeprecated { table: Ident },
    /// Phase 2: the table's comment is already the sentinel. Destructive.
    DropTable { table: Ident, state: DbTableState },

    AddColumn {
        table: Ident,
        column: Box<crate::schema::ColumnDefinition>,
    },
    AlterColumn {
        table: Ident,
        /// The full declared definition, so the executor can render a
        /// complete `MODIFY COLUMN` rather than patching individual clauses.
        column: Box<crate::schema::ColumnDefinition>,
        changes: Vec<ColumnChange>,
    },
    /// Phase 1 of a two-phase column drop: rebuild the live definition
    /// verbatim and append the sentinel comment. Safe.
    MarkColumnDeprecated {
        table: Ident,
        column: Ident,
        state: DbColumnState,
    },
    /// Phase 2: the live column comment is already the sentinel. Destructive.
    DropColumn { table: Ident, column: Ident },

    AddIndex {
        table: Ident,
        index: IndexDefinition,
    },
    DropIndex { table: Ident, name: Ident },

    AddForeignKey {
        table: Ident,
        fk: ForeignKeyDefinition,
    },
    DropForeignKey { table: Ident, name: Ident },
}

impl DiffOp {
    /// True iff the operation drops data or narrows a type — gated behind
    /// `allowDestructive` by the sync engine.
    #[must_use]
    pub fn is_destructive(&self) -> bool {
        match self {
            Self::CreateTable(_)
            | Self::MarkTableDeprecated { .. }
            | Self::AddColumn { .. }
            | Self::MarkColumnDeprecated { .. }
            | Self::AddIndex { .. }
            | Self::AddForeignKey { .. } => false,
            Self::DropTable { .. } | Self::DropColumn { .. } | Self::DropIndex { .. } | Self::DropForeignKey { .. } => {
                true
            }
            Self::AlterColumn { changes, .. } => !changes.iter().all(ColumnChange::is_safe),
        }
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::CreateTable(table) => table.name.as_str(),
            Self::MarkTableDeprecated { table } | Self::DropTable { table, .. } => table.as_str(),
            Self::AddColumn { table, .. }
            | Self::AlterColumn { table, .. }
            | Self::MarkColumnDeprecated { table, .. }
            | Self::DropColumn { table, .. }
            | Self::AddIndex { table, .. }
            | Self::DropIndex { table, .. }
            | Self::AddForeignKey { table, .. }
            | Self::DropForeignKey { table, .. } => table.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnChange {
    /// A type change, tagged with whether it is a documented widening.
    SetType { to: ColumnType, widening: bool },
    SetNullable(bool),
    SetAutoIncrement(bool),
    /// `None` means "no default" (`default: 'x' -> none` must be classified
    /// as a default change, never folded into `SetType`).
    SetDefault(Option<String>),
}

impl ColumnChange {
    #[must_use]
    pub const fn is_safe(&self) -> bool {
        match self {
            Self::SetType { widening, .. } => *widening,
            Self::SetNullable(_) | Self::SetAutoIncrement(_) | Self::SetDefault(_) => true,
        }
    }
}
