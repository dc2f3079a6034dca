//! 数据库健康探针

use std::sync::Arc;

use application::{ApplicationError, DatabaseProbe, PoolStats};
use async_trait::async_trait;
use sqlx::Connection;

use crate::{error::DbError, pool::ConnectionPool};

const PROBE_QUERY: &str = "SELECT 1";

/// 单次尝试、不重试；连接只在探测期间持有
pub struct MySqlHealthProbe {
    pool: Arc<ConnectionPool>,
}

impl MySqlHealthProbe {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    async fn run(&self, ping_first: bool) -> Result<(), DbError> {
        let mut conn = self.pool.acquire().await?;
        let timeout = self.pool.config().query_timeout();

        let outcome = tokio::time::timeout(timeout, async {
            if ping_first {
                conn.ping().await?;
            }
            sqlx::query(PROBE_QUERY).execute(&mut *conn).await?;
            Ok::<_, sqlx::Error>(())
        })
        .await;

        match outcome {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => {
                conn.discard();
                Err(DbError::QueryTimeout(timeout))
            }
        }
    }
}

fn probe_error(err: DbError) -> ApplicationError {
    ApplicationError::infrastructure(err.to_string())
}

#[async_trait]
impl DatabaseProbe for MySqlHealthProbe {
    async fn probe(&self) -> Result<(), ApplicationError> {
        self.run(false).await.map_err(probe_error)
    }

    async fn verify_connectivity(&self) -> Result<(), ApplicationError> {
        self.run(true).await.map_err(probe_error)
    }

    fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}
