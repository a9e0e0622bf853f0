use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error kind. Callers distinguish by variant, never by message —
/// each carries only a short human-readable description.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    SchemaState(#[from] SchemaStateError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// `pop(timeout)` exceeded `timeout` waiting for a free connection.
    #[error("timed out after {0:?} waiting for a pooled connection")]
    PoolTimeout(Duration),

    /// A statement failed with a connection-reset condition after the
    /// stale-connection reconnect in the pool had already been attempted once.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// Server-reported constraint violation, surfaced unchanged from the driver.
    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("`{property}` is not a declared relation on `{table}`")]
    UnknownRelation { table: String, property: String },

    #[error("`{property}` is not a filterable column on `{table}`")]
    NotFilterable { table: String, property: String },

    #[error(transparent)]
    BadQuery(#[from] BadQueryError),
}

/// Collector-detected contradictions. Fatal for `sync`; accumulated and
/// surfaced verbatim rather than aborting on the first one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("`{value}` is not a valid identifier (must match ^[A-Za-z_][A-Za-z0-9_]*$)")]
    InvalidIdentifier { value: String },

    #[error(
        "column `{table}.{column}` declares source type `{source_type}` which is incompatible with SQL type `{sql_type}`"
    )]
    IncompatibleType {
        table: String,
        column: String,
        source_type: String,
        sql_type: String,
    },

    #[error("column `{table}.{column}` is a string-typed primary key with implicit `auto` strategy")]
    StringPkAutoStrategy { table: String, column: String },

    #[error(
        "column `{table}.{column}` has pk_strategy=uuid but its SQL type is neither `binary` nor `varchar`"
    )]
    UuidPkInvalidColumnType { table: String, column: String },

    #[error("column `{table}.{column}` is declared more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("`mapTo` is set on `{table}` but the type does not implement the domain-mapping capability")]
    MissingDomainMapping { table: String },

    #[error("{0}")]
    Other(String),
}

/// `INFORMATION_SCHEMA` returned malformed rows, or the server is below 8.0.0.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaStateError {
    #[error("malformed INFORMATION_SCHEMA row for `{table}`: {reason}")]
    MalformedRow { table: String, reason: String },

    #[error("server reports MySQL {major}.{minor}.{patch}, which is below the minimum supported 8.0.0")]
    UnsupportedServerVersion { major: u16, minor: u16, patch: u16 },
}

/// A caller demanded transactional DDL on a server that cannot provide it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("atomic DDL was required but the server does not support it")]
    AtomicDdlRequired,
}

/// Expected query-builder failures: never panics, always returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BadQueryError {
    #[error("`{0}` is not a supported filter operator")]
    InvalidOperator(String),

    #[error("page/perPage must be >= 1, got {0}")]
    InvalidPage(i64),

    #[error("refusing to build a DELETE with no WHERE clause")]
    UnconditionalDelete,
}
