//! 带重试与超时的查询执行器
//!
//! 这是唯一定义重试策略的地方，仓储和处理器都不应自行重试。
//! 每次尝试都会重新获取连接，并在结束时归还。

use std::{future::Future, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use sqlx::MySqlConnection;
use tokio::time::Instant;

use crate::{
    error::DbError,
    pool::{ConnectionPool, PooledConnection},
    retry::{retry_async, RetryPolicy},
};

/// 单次尝试持有的连接；drop 时归还连接和准入许可
pub(crate) trait Lease<C: ?Sized>: Send {
    fn conn(&mut self) -> &mut C;

    /// 连接状态不可信时调用，连接不再放回池中
    fn discard(&mut self);
}

impl Lease<MySqlConnection> for PooledConnection {
    fn conn(&mut self) -> &mut MySqlConnection {
        &mut **self
    }

    fn discard(&mut self) {
        PooledConnection::discard(self);
    }
}

#[derive(Debug, Clone, Copy)]
struct QueryLimits {
    timeout: Duration,
    slow_threshold: Duration,
}

pub struct QueryExecutor {
    pool: Arc<ConnectionPool>,
    policy: RetryPolicy,
    limits: QueryLimits,
}

impl QueryExecutor {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        let config = pool.config().clone();
        Self {
            pool,
            policy: RetryPolicy::from_config(&config),
            limits: QueryLimits {
                timeout: config.query_timeout(),
                slow_threshold: config.slow_query_threshold(),
            },
        }
    }

    /// 执行一次逻辑操作；`op` 在每次尝试时都会被重新调用
    pub async fn run<T, F>(&self, label: &str, op: F) -> Result<T, DbError>
    where
        F: for<'c> Fn(&'c mut MySqlConnection) -> BoxFuture<'c, Result<T, sqlx::Error>>
            + Send
            + Sync,
        T: Send,
    {
        let pool = &self.pool;
        run_with::<MySqlConnection, _, _, _, _, _>(
            &self.policy,
            self.limits,
            label,
            move || pool.acquire(),
            &op,
        )
        .await
    }
}

async fn run_with<C, L, A, AFut, T, F>(
    policy: &RetryPolicy,
    limits: QueryLimits,
    label: &str,
    acquire: A,
    op: &F,
) -> Result<T, DbError>
where
    C: ?Sized,
    L: Lease<C>,
    A: Fn() -> AFut,
    AFut: Future<Output = Result<L, DbError>>,
    F: for<'c> Fn(&'c mut C) -> BoxFuture<'c, Result<T, sqlx::Error>>,
{
    let acquire = &acquire;
    retry_async(policy, label, move || async move {
        let lease = acquire().await?;
        attempt(lease, limits, label, op).await
    })
    .await
}

async fn attempt<C, L, T, F>(
    mut lease: L,
    limits: QueryLimits,
    label: &str,
    op: &F,
) -> Result<T, DbError>
where
    C: ?Sized,
    L: Lease<C>,
    F: for<'c> Fn(&'c mut C) -> BoxFuture<'c, Result<T, sqlx::Error>>,
{
    let started = Instant::now();
    let outcome = tokio::time::timeout(limits.timeout, op(lease.conn())).await;
    let elapsed = started.elapsed();

    if elapsed >= limits.slow_threshold {
        tracing::warn!(
            label,
            elapsed_ms = elapsed.as_millis() as u64,
            threshold_ms = limits.slow_threshold.as_millis() as u64,
            "slow query"
        );
    }

    match outcome {
        Ok(result) => result.map_err(DbError::from),
        Err(_) => {
            tracing::error!(
                label,
                timeout_ms = limits.timeout.as_millis() as u64,
                "query timed out, discarding connection"
            );
            lease.discard();
            Err(DbError::QueryTimeout(limits.timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use tokio::sync::OwnedSemaphorePermit;

    use crate::{pool::AdmissionGate, retry::Backoff};

    struct TestLease {
        conn: (),
        discarded: Arc<AtomicBool>,
        _permit: OwnedSemaphorePermit,
    }

    impl Lease<()> for TestLease {
        fn conn(&mut self) -> &mut () {
            &mut self.conn
        }

        fn discard(&mut self) {
            self.discarded.store(true, Ordering::SeqCst);
        }
    }

    fn stalled_query(_conn: &mut ()) -> BoxFuture<'_, Result<u32, sqlx::Error>> {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(1)
        })
    }

    fn reset_connection(_conn: &mut ()) -> BoxFuture<'_, Result<u32, sqlx::Error>> {
        Box::pin(async {
            Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )))
        })
    }

    fn quick_query(_conn: &mut ()) -> BoxFuture<'_, Result<u32, sqlx::Error>> {
        Box::pin(async { Ok(7) })
    }

    struct Harness {
        gate: AdmissionGate,
        acquired: AtomicU32,
        discarded: Arc<AtomicBool>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                gate: AdmissionGate::new(1, 0, Duration::from_secs(1)),
                acquired: AtomicU32::new(0),
                discarded: Arc::new(AtomicBool::new(false)),
            }
        }

        async fn run<F>(&self, op: &F) -> Result<u32, DbError>
        where
            F: for<'c> Fn(&'c mut ()) -> BoxFuture<'c, Result<u32, sqlx::Error>>,
        {
            let policy = RetryPolicy {
                max_attempts: 3,
                backoff: Backoff::fixed(Duration::from_millis(1)),
            };
            let limits = QueryLimits {
                timeout: Duration::from_millis(20),
                slow_threshold: Duration::from_secs(10),
            };
            let acquire = move || async move {
                self.acquired.fetch_add(1, Ordering::SeqCst);
                let permit = self.gate.admit().await?;
                Ok::<_, DbError>(TestLease {
                    conn: (),
                    discarded: self.discarded.clone(),
                    _permit: permit,
                })
            };
            run_with::<(), _, _, _, _, _>(&policy, limits, "test", acquire, op).await
        }
    }

    #[tokio::test]
    async fn test_timed_out_query_is_discarded_and_not_retried() {
        let harness = Harness::new();

        let result = harness.run(&stalled_query).await;

        assert!(matches!(result, Err(DbError::QueryTimeout(_))));
        assert_eq!(harness.acquired.load(Ordering::SeqCst), 1);
        assert!(harness.discarded.load(Ordering::SeqCst));
        assert_eq!(harness.gate.in_use(), 0);
    }

    #[tokio::test]
    async fn test_transient_failure_retries_and_releases_each_permit() {
        let harness = Harness::new();

        let result = harness.run(&reset_connection).await;

        assert!(matches!(result, Err(DbError::Sqlx(sqlx::Error::Io(_)))));
        // 许可未归还时，第二次尝试会在 1 个连接的准入门上超时
        assert_eq!(harness.acquired.load(Ordering::SeqCst), 3);
        assert!(!harness.discarded.load(Ordering::SeqCst));
        assert_eq!(harness.gate.in_use(), 0);
    }

    #[tokio::test]
    async fn test_successful_query_returns_value() {
        let harness = Harness::new();

        assert_eq!(harness.run(&quick_query).await.unwrap(), 7);
        assert_eq!(harness.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(harness.gate.in_use(), 0);
    }
}
