//! Connection pool construction and migration runner.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::{DataError, DataResult};

/// Embedded migration set, applied by [`Store::connect`].
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// A connected pool plus the narrow repository methods implemented across
/// this crate's other modules (`torrents`, `package_files`, `errors`).
///
/// One `Store` per process, per SPEC_FULL.md §4.10 ("one connection pool per
/// process").
#[derive(Debug, Clone)]
pub struct Store {
    pub(crate) pool: PgPool,
}

impl Store {
    /// Connect to `database_url`, run pending migrations, and return a
    /// ready-to-use store.
    pub async fn connect(database_url: &str, max_connections: u32) -> DataResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|source| DataError::query("connect", source))?;

        MIGRATOR
            .run(&pool)
            .await
            .map_err(|source| DataError::MigrationFailed { source })?;

        tracing::info!(max_connections, "connected to persistence store");
        Ok(Self { pool })
    }

    /// Wrap an already-connected pool without running migrations again.
    /// Used by tests that manage migration timing themselves.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for callers that need direct access (tests).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}
