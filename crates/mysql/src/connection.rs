//! The concrete connection type handed to `semitexa_core::Pool`. Wraps a raw
//! `mysql::Conn` rather than `mysql::Pool`'s own pooling — `semitexa_core`'s
//! pool (CAS slot counter, `Condvar` timeout) is the one pool this crate
//! uses; the driver only supplies the wire protocol.

use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder};

use semitexa_core::{ConnectionConfig, Error, PooledConnection, Result, Version};

use crate::export_queries;

const VALIDATION_QUERY: &str = "SELECT 1";

pub struct MysqlConnection {
    pub(crate) conn: Conn,
}

impl MysqlConnection {
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(config.host.clone()))
            .tcp_port(config.port)
            .user(Some(config.username.clone()))
            .pass(Some(config.password.clone()))
            .db_name(Some(config.database.clone()));

        let conn = Conn::new(opts).map_err(|source| connection_error(source.to_string()))?;
        Ok(Self { conn })
    }

    /// `SELECT VERSION()`, parsed and checked against the minimum supported
    /// server version. Called once at startup by `status`/`sync`.
    pub fn server_version(&mut self) -> Result<Version> {
        let raw: String = self
            .conn
            .query_first(export_queries::SHOW_SERVER_VERSION_QUERY)
            .map_err(|source| connection_error(source.to_string()))?
            .ok_or_else(|| connection_error("SELECT VERSION() returned no rows".to_string()))?;

        let version = Version::parse(&raw)
            .ok_or_else(|| connection_error(format!("could not parse server version `{raw}`")))?;

        if !version.is_supported() {
            return Err(Error::SchemaState(semitexa_core::SchemaStateError::UnsupportedServerVersion {
                major: version.major,
                minor: version.minor,
                patch: version.patch,
            }));
        }

        Ok(version)
    }
}

impl PooledConnection for MysqlConnection {
    fn is_alive(&mut self) -> bool {
        self.conn.query_drop(VALIDATION_QUERY).is_ok()
    }
}

pub(crate) fn connection_error(message: String) -> Error {
    Error::ConnectionLost(message)
}
