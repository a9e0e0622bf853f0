use super::ident::Ident;

/// Closed enumeration of the MySQL physical column types this crate maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnType {
    Varchar,
    Char,
    Text,
    MediumText,
    LongText,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    Boolean,
    DateTime,
    Timestamp,
    Date,
    Time,
    Year,
    Json,
    Blob,
    Binary,
}

impl ColumnType {
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::TinyInt | Self::SmallInt | Self::Int | Self::BigInt | Self::Year
        )
    }

    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(
            self,
            Self::Varchar | Self::Char | Self::Text | Self::MediumText | Self::LongText
        )
    }

    /// Integer rank used to decide widening ALTERs (`TINYINT < SMALLINT < INT < BIGINT`).
    #[must_use]
    pub const fn integer_rank(self) -> Option<u8> {
        match self {
            Self::TinyInt => Some(0),
            Self::SmallInt => Some(1),
            Self::Int => Some(2),
            Self::BigInt => Some(3),
            _ => None,
        }
    }
}

/// How the primary key value is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkStrategy {
    Auto,
    Uuid,
    Manual,
}

/// A literal default value, taken verbatim from an annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// Immutable record produced by the collector for a single table column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: Ident,
    pub property_name: String,
    pub column_type: ColumnType,
    pub source_type: String,
    pub nullable: bool,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub default: Option<Literal>,
    pub is_primary_key: bool,
    pub pk_strategy: Option<PkStrategy>,
    pub is_deprecated: bool,
}

impl ColumnDefinition {
    #[must_use]
    pub const fn is_auto_increment(&self) -> bool {
        self.is_primary_key && matches!(self.pk_strategy, Some(PkStrategy::Auto))
    }
}
