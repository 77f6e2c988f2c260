use std::time::Duration;

use anyhow::Context;
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use thiserror::Error;

/// Failure talking to the relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database not configured")]
    NotConfigured,
    #[error("database unreachable")]
    Unreachable(#[source] sqlx::Error),
    #[error("database query failed")]
    Query(#[source] sqlx::Error),
}

impl StoreError {
    /// True when the store could not be reached at all, as opposed to a query
    /// that reached it and failed.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::NotConfigured | StoreError::Unreachable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unreachable(e),
            other => StoreError::Query(other),
        }
    }
}

/// Lazily connected MySQL handle. Without a `DATABASE_URL` every repository
/// call returns [`StoreError::NotConfigured`].
#[derive(Clone, Default)]
pub struct Db {
    pool: Option<MySqlPool>,
}

impl Db {
    pub fn connect_lazy(database_url: Option<&str>) -> anyhow::Result<Self> {
        let Some(url) = database_url else {
            tracing::warn!("DATABASE_URL not set; running without a database");
            return Ok(Self { pool: None });
        };
        let pool = MySqlPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(url)
            .context("parse DATABASE_URL")?;
        Ok(Self { pool: Some(pool) })
    }

    pub fn pool(&self) -> Result<&MySqlPool, StoreError> {
        self.pool.as_ref().ok_or(StoreError::NotConfigured)
    }

    pub async fn migrate(&self) {
        let Some(pool) = &self.pool else {
            return;
        };
        if let Err(e) = sqlx::migrate!("./migrations").run(pool).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }
    }
}
