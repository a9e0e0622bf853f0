//! `INFORMATION_SCHEMA` queries the reader issues. Kept as named constants,
//! one statement per concern, in the same style as the dialect's own
//! `export_queries.rs`.

pub(crate) const SHOW_SERVER_VERSION_QUERY: &str = "SELECT VERSION()";

pub(crate) const TABLES_QUERY: &str = r"
SELECT TABLE_NAME, IFNULL(TABLE_COMMENT, '')
FROM INFORMATION_SCHEMA.TABLES
WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
ORDER BY TABLE_NAME ASC;
";

pub(crate) const COLUMNS_QUERY: &str = r"
SELECT TABLE_NAME, COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE, COLUMN_DEFAULT,
       COLUMN_KEY, EXTRA, IFNULL(COLUMN_COMMENT, '')
FROM INFORMATION_SCHEMA.COLUMNS
WHERE TABLE_SCHEMA = ?
ORDER BY TABLE_NAME ASC, ORDINAL_POSITION ASC;
";

pub(crate) const INDEXES_QUERY: &str = r"
SELECT TABLE_NAME, INDEX_NAME, COLUMN_NAME, NON_UNIQUE
FROM INFORMATION_SCHEMA.STATISTICS
WHERE TABLE_SCHEMA = ? AND INDEX_NAME != 'PRIMARY'
ORDER BY TABLE_NAME ASC, INDEX_NAME ASC, SEQ_IN_INDEX ASC;
";

pub(crate) const FOREIGN_KEYS_QUERY: &str = r"
SELECT
    kcu.TABLE_NAME,
    kcu.COLUMN_NAME,
    kcu.CONSTRAINT_NAME,
    kcu.REFERENCED_TABLE_NAME,
    kcu.REFERENCED_COLUMN_NAME,
    rc.DELETE_RULE,
    rc.UPDATE_RULE
FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu
JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS rc
  ON rc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA AND rc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME
WHERE kcu.TABLE_SCHEMA = ? AND kcu.REFERENCED_TABLE_NAME IS NOT NULL
ORDER BY kcu.TABLE_NAME ASC, kcu.CONSTRAINT_NAME ASC;
";
