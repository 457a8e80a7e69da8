//! SQL migration definitions for the docset index.
//!
//! Migrations are applied in order on open. The `searchIndex` table and its
//! `anchor` index are the names the docset browser expects; do not rename them.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "searchIndex table with unique (name, type, path)",
        sql: r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS searchIndex (
    id   INTEGER PRIMARY KEY,
    name TEXT,
    type TEXT,
    path TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS anchor ON searchIndex (name, type, path);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
