use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use std::path::Path;
use std::str::FromStr;

use crate::utils::get_data_dir;

const DB_FILE_NAME: &str = "flashgen.db";

#[derive(Clone)]
pub struct DB {
    pub(super) pool: SqlitePool,
}

impl DB {
    pub async fn new() -> Result<Self> {
        let data_dir = get_data_dir()?;
        Self::open(&data_dir.join(DB_FILE_NAME)).await
    }

    pub async fn open(db_path: &Path) -> Result<Self> {
        let options =
            SqliteConnectOptions::from_str(&db_path.to_string_lossy())?.create_if_missing(true);

        Self::connect(options, 5)
            .await
            .with_context(|| format!("Failed to open database at {}", db_path.display()))
    }

    async fn connect(options: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
impl DB {
    /// Every connection to `sqlite::memory:` is its own database, so the pool
    /// is pinned to one connection.
    pub async fn new_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        Self::connect(options, 1).await
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn opens_and_migrates_file_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join(DB_FILE_NAME);

        let db = DB::open(&db_path).await.unwrap();
        db.close().await;
        assert!(db_path.exists());

        // Re-opening runs migrations again without error.
        DB::open(&db_path).await.unwrap().close().await;
    }
}
