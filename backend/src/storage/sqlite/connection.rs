use anyhow::{Context, Result};
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// DbConnection manages the pool of the structured store
#[derive(Clone)]
pub struct DbConnection {
    pool: SqlitePool,
}

impl DbConnection {
    /// Connect using a sqlx URL such as `sqlite://concierge.db`
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {}", url))?
            .create_if_missing(true);
        Self::with_options(options, 5).await
    }

    /// Open (or create) a database file
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::with_options(options, 5).await
    }

    /// Initialize a private in-memory database
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // A single connection that never expires, otherwise the database
        // disappears with the connection that holds it
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::setup_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn with_options(options: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        Self::setup_schema(&pool).await?;
        info!("Database ready");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool. Every later query fails.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Set up the required database schema
    ///
    /// `child_id` columns carry no foreign key: records may be created for a
    /// child id that is not stored, and deleting a child unlinks its records
    /// in the service layer instead.
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS children (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                birth_date TEXT,
                school TEXT,
                grade TEXT,
                notes TEXT,
                avatar_url TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                child_id TEXT,
                title TEXT NOT NULL,
                description TEXT,
                event_type TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                start_time TEXT,
                end_time TEXT,
                location TEXT,
                is_recurring INTEGER NOT NULL DEFAULT 0,
                recurrence_pattern TEXT,
                priority TEXT NOT NULL DEFAULT 'medium',
                status TEXT NOT NULL DEFAULT 'upcoming',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                child_id TEXT,
                title TEXT NOT NULL,
                description TEXT,
                due_date TEXT,
                priority TEXT NOT NULL DEFAULT 'medium',
                is_completed INTEGER NOT NULL DEFAULT 0,
                category TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                child_id TEXT,
                title TEXT NOT NULL,
                file_url TEXT NOT NULL,
                file_type TEXT,
                category TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                child_id TEXT,
                title TEXT,
                content TEXT NOT NULL,
                tags TEXT, -- JSON array as string
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        for table in ["children", "events", "tasks", "documents", "notes"] {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_user_id ON {table}(user_id);"
            ))
            .execute(pool)
            .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_schema_creates_all_tables() {
        let db = DbConnection::in_memory().await.expect("Failed to create test database");

        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(db.pool())
            .await
            .unwrap();
        let tables: Vec<String> = rows.iter().map(|r| r.get("name")).collect();
        assert_eq!(tables, vec!["children", "documents", "events", "notes", "tasks"]);
    }

    #[tokio::test]
    async fn test_open_creates_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("concierge.db");

        let db = DbConnection::open(&path).await.unwrap();
        assert!(path.exists());
        db.close().await;

        // Schema setup is idempotent
        let reopened = DbConnection::open(&path).await.unwrap();
        reopened.close().await;
    }

    #[tokio::test]
    async fn test_closed_pool_rejects_queries() {
        let db = DbConnection::in_memory().await.unwrap();
        db.close().await;

        let result = sqlx::query("SELECT 1").execute(db.pool()).await;
        assert!(result.is_err());
    }
}
