pub mod error;
pub mod lemma_repository;
pub mod memory_store;
pub mod models;
pub mod sentence_pool;
pub mod version;

use std::str::FromStr;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tracing::info;

pub use error::{Result, StorageError};

/// Current schema version this crate expects, used for the compatibility
/// check against the database's `schema_version` table.
pub const APP_SCHEMA_VERSION: &str = "1.0.0";

/// Shared SQLite-backed adapter implementing `LemmaRepository`, `MemoryStore`
/// and `SentencePool` against a single scheduler database (spec §6).
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pub(crate) pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if absent) the SQLite database at `db_path`, runs
    /// pending migrations, and checks schema compatibility.
    pub async fn connect(db_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(db_path)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let db_version = version::get_schema_version(&pool).await?;
        if !version::is_compatible(&db_version, APP_SCHEMA_VERSION) {
            return Err(StorageError::IncompatibleSchema {
                db_version,
                app_version: APP_SCHEMA_VERSION.to_string(),
                message: "database schema is newer than this build supports".into(),
            });
        }
        info!(db_version = %db_version, app_version = APP_SCHEMA_VERSION, "opened alif store");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
