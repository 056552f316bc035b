//! Queue schema creation and additive migrations.
//!
//! The `jobs` table predates some of its columns. [`migrate`] creates the
//! table when it is missing and adds any absent column to an existing one, so
//! it can run on every start.

use sqlx::{Row, SqlitePool};
use tracing::info;

use descry_core::{Error, Result};

const CREATE_JOBS_TABLE: &str = "CREATE TABLE IF NOT EXISTS jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    correlation_id INTEGER NOT NULL,
    input_path TEXT NOT NULL,
    model_selector TEXT NOT NULL,
    retry_count INTEGER NOT NULL DEFAULT 0,
    enqueued_at TEXT
)";

/// Columns added after the first release, with their `ADD COLUMN` definitions.
const ADDITIVE_COLUMNS: &[(&str, &str)] = &[
    ("retry_count", "INTEGER NOT NULL DEFAULT 0"),
    ("enqueued_at", "TEXT"),
];

/// Bring the queue schema up to date. Safe to call repeatedly.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::query(CREATE_JOBS_TABLE)
        .execute(pool)
        .await
        .map_err(Error::Database)?;

    let existing = column_names(pool).await?;
    for (name, definition) in ADDITIVE_COLUMNS {
        if existing.iter().any(|c| c == name) {
            continue;
        }
        sqlx::query(&format!("ALTER TABLE jobs ADD COLUMN {name} {definition}"))
            .execute(pool)
            .await
            .map_err(Error::Database)?;
        info!(
            subsystem = "db",
            component = "schema",
            op = "add_column",
            column = *name,
            "Added missing column to jobs table"
        );
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_correlation_id ON jobs (correlation_id)")
        .execute(pool)
        .await
        .map_err(Error::Database)?;

    Ok(())
}

/// Names of the columns currently on the `jobs` table.
pub async fn column_names(pool: &SqlitePool) -> Result<Vec<String>> {
    let rows = sqlx::query("PRAGMA table_info(jobs)")
        .fetch_all(pool)
        .await
        .map_err(Error::Database)?;

    rows.iter()
        .map(|row| row.try_get::<String, _>("name").map_err(Error::Database))
        .collect()
}
