//! Database schema.
//!
//! Tables are created idempotently on open. Sub-navigation rows reference
//! their parent with `ON DELETE CASCADE`, so deleting a navigation entry
//! removes its children.

use sqlx::SqlitePool;

/// Schema statements, executed in order.
const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS navigation (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        link TEXT NOT NULL,
        position INTEGER NOT NULL,
        active INTEGER NOT NULL DEFAULT 1
    )",
    "CREATE TABLE IF NOT EXISTS sub_navigation (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        navigation_id INTEGER NOT NULL REFERENCES navigation(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        link TEXT NOT NULL,
        position INTEGER NOT NULL,
        active INTEGER NOT NULL DEFAULT 1
    )",
    "CREATE INDEX IF NOT EXISTS idx_sub_navigation_navigation_id
        ON sub_navigation(navigation_id)",
    "CREATE TABLE IF NOT EXISTS pages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        permalink TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        imports TEXT,
        content TEXT NOT NULL,
        pub_date TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 1
    )",
    "CREATE TABLE IF NOT EXISTS footers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        pub_date TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 1
    )",
    "CREATE TABLE IF NOT EXISTS banners (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        pub_date TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 1
    )",
    "CREATE TABLE IF NOT EXISTS static_files (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL UNIQUE,
        file TEXT NOT NULL
    )",
];

/// Create all tables and indexes that don't exist yet.
pub(crate) async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::debug!(statements = STATEMENTS.len(), "Schema up to date");
    Ok(())
}
