//! MySQL 8.0+ bindings for `semitexa-core`: a pooled `DatabaseAdapter`, a
//! `SchemaReader` over `INFORMATION_SCHEMA`, and the raw connection type
//! both are built on.

mod adapter;
mod connection;
mod export_queries;
mod reader;

pub use adapter::MysqlAdapter;
pub use connection::MysqlConnection;
