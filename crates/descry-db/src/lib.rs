//! # descry-db
//!
//! SQLite storage for the descry job queue.
//!
//! This crate provides:
//! - Connection pool management (WAL journal, synchronous commits)
//! - Additive schema migrations for the `jobs` table
//! - [`SqliteJobQueue`], the durable FIFO store behind the worker
//!
//! ## Example
//!
//! ```rust,ignore
//! use descry_db::Database;
//! use descry_core::{JobQueue, ModelSelector, NewJob};
//!
//! let db = Database::connect("sqlite://descry_queue.db").await?;
//! db.migrate().await?;
//! db.queue.enqueue(NewJob::new(7, "/memes/cat.png", ModelSelector::Test)).await?;
//! ```

pub mod pool;
pub mod queue;
pub mod schema;

pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use queue::SqliteJobQueue;
pub use schema::migrate;

use descry_core::Result;

/// Combined database context.
#[derive(Debug, Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::SqlitePool,
    /// Pending job queue.
    pub queue: SqliteJobQueue,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self {
            queue: SqliteJobQueue::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Apply schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        migrate(&self.pool).await
    }
}
