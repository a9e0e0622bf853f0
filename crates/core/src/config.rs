use std::collections::BTreeSet;
use std::env;

/// A parsed `major.minor.patch` server version, as reported by `SELECT VERSION()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl Version {
    pub const MINIMUM_SUPPORTED: Self = Self {
        major: 8,
        minor: 0,
        patch: 0,
    };

    #[must_use]
    pub const fn is_supported(self) -> bool {
        self.major as u32 * 1_000_000 + self.minor as u32 * 1_000 + self.patch as u32
            >= Self::MINIMUM_SUPPORTED.major as u32 * 1_000_000
                + Self::MINIMUM_SUPPORTED.minor as u32 * 1_000
                + Self::MINIMUM_SUPPORTED.patch as u32
    }

    /// Parses the leading `N.N.N` of a `SELECT VERSION()` string, tolerating
    /// vendor suffixes like `8.0.35-log` or `8.0.35-0ubuntu0.22.04.1`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let head = raw.split(|c: char| !c.is_ascii_digit() && c != '.').next()?;
        let mut parts = head.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().unwrap_or("0").parse().ok()?;
        let patch = parts.next().unwrap_or("0").parse().ok()?;
        Some(Self { major, minor, patch })
    }
}

/// Connection parameters, resolved from the `DB_*` environment keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub charset: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            database: "semitexa".to_string(),
            username: "root".to_string(),
            password: String::new(),
            charset: "utf8mb4".to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Reads `DB_HOST`/`DB_PORT`/`DB_DATABASE`/`DB_USERNAME`/`DB_PASSWORD`/`DB_CHARSET`,
    /// falling back to `DB_CLI_HOST`/`DB_CLI_PORT` when running outside a
    /// container (`container` is passed in rather than sniffed, so callers
    /// that already know their execution context don't pay for a second check).
    #[must_use]
    pub fn from_env(in_container: bool) -> Self {
        let defaults = Self::default();
        let host = if !in_container {
            env::var("DB_CLI_HOST").ok()
        } else {
            None
        }
        .or_else(|| env::var("DB_HOST").ok())
        .unwrap_or(defaults.host);

        let port = if !in_container {
            env::var("DB_CLI_PORT").ok()
        } else {
            None
        }
        .or_else(|| env::var("DB_PORT").ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(defaults.port);

        Self {
            host,
            port,
            database: env::var("DB_DATABASE").unwrap_or(defaults.database),
            username: env::var("DB_USERNAME").unwrap_or(defaults.username),
            password: env::var("DB_PASSWORD").unwrap_or(defaults.password),
            charset: env::var("DB_CHARSET").unwrap_or(defaults.charset),
        }
    }
}

/// Pool and sync behavior, resolved from `DB_POOL_SIZE`/`ORM_IGNORE_TABLES`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrmSettings {
    pub pool_size: usize,
    pub ignore_tables: BTreeSet<String>,
}

impl Default for OrmSettings {
    fn default() -> Self {
        Self {
            pool_size: 10,
            ignore_tables: BTreeSet::new(),
        }
    }
}

impl OrmSettings {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let pool_size = env::var("DB_POOL_SIZE")
            .ok()
            .and_then(|value| value.parse().ok())
            .filter(|size| *size > 0)
            .unwrap_or(defaults.pool_size);

        let ignore_tables = env::var("ORM_IGNORE_TABLES")
            .ok()
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.ignore_tables);

        Self {
            pool_size,
            ignore_tables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parse_strips_vendor_suffix() {
        let version = Version::parse("8.0.35-log").unwrap();
        assert_eq!(
            version,
            Version {
                major: 8,
                minor: 0,
                patch: 35
            }
        );
        assert!(version.is_supported());
    }

    #[test]
    fn version_below_8_is_unsupported() {
        assert!(!Version::parse("5.7.42").unwrap().is_supported());
    }

    #[test]
    fn connection_config_defaults() {
        let config = ConnectionConfig {
            host: "unset-marker".to_string(),
            ..ConnectionConfig::default()
        };
        assert_eq!(config.port, 3306);
        assert_eq!(config.database, "semitexa");
    }
}
