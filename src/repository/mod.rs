//! Repository layer: durable storage of books and members in SQLite.
//!
//! Every repository method runs on a caller-supplied connection, so the
//! catalog engine can compose several of them inside one transaction.

pub mod books;
pub mod loans;
pub mod members;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};

use crate::{config::DatabaseConfig, error::AppResult};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Sqlite>,
    pub books: books::BooksRepository,
    pub members: members::MembersRepository,
    pub loans: loans::LoansRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            books: books::BooksRepository,
            members: members::MembersRepository,
            loans: loans::LoansRepository,
            pool,
        }
    }

    /// Open (creating if needed) the database and bring its schema up to date
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let in_memory = config.is_in_memory();
        if !in_memory {
            ensure_parent_dir(&config.url)?;
        }

        let mut options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Every connection to `:memory:` is a separate database, so keep exactly one alive.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await?;
        tracing::info!("Connected to database {}", config.url);

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations completed");

        Ok(Self::new(pool))
    }

    /// Start a transaction; dropped without commit means rolled back
    pub async fn begin(&self) -> AppResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Connection for read-only work
    pub async fn acquire(&self) -> AppResult<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }
}

fn ensure_parent_dir(url: &str) -> AppResult<()> {
    let path = url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
