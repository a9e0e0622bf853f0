use super::ident::Ident;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    Restrict,
    Cascade,
    SetNull,
    NoAction,
}

impl ForeignKeyAction {
    #[must_use]
    pub const fn to_sql(self) -> &'static str {
        match self {
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::NoAction => "NO ACTION",
        }
    }

    /// Parses `INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS`'s `DELETE_RULE`/
    /// `UPDATE_RULE` values. Unrecognized values fall back to `NoAction`
    /// rather than erroring — the comparator treats that as "differs from
    /// declared" like any other mismatch, not a reader failure.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "RESTRICT" => Self::Restrict,
            "CASCADE" => Self::Cascade,
            "SET NULL" => Self::SetNull,
            _ => Self::NoAction,
        }
    }
}

/// A single foreign key constraint, always named deterministically as
/// `fk_{table}_{column}` by the collector.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyDefinition {
    pub name: Ident,
    pub table: Ident,
    pub column: Ident,
    pub referenced_table: Ident,
    pub referenced_column: Ident,
    pub on_delete: ForeignKeyAction,
    pub on_update: ForeignKeyAction,
}

impl ForeignKeyDefinition {
    #[must_use]
    pub fn generate_name(table: &str, column: &str) -> String {
        format!("fk_{table}_{column}")
    }
}
