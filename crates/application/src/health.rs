//! 健康检查
//!
//! 执行一次轻量探测查询，在查询超时内成功即为 `healthy`，否则为 `unhealthy`。
//! 探测只做一次尝试，不经过重试。

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use crate::{clock::Clock, error::ApplicationError};

/// 连接池使用情况快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub max_connections: u32,
    pub total_connections: u32,
    pub idle_connections: u32,
    pub active_connections: u32,
    pub queued_waiters: usize,
}

/// 数据库探针
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    /// 执行探测查询（`SELECT 1`）
    async fn probe(&self) -> Result<(), ApplicationError>;

    /// 强制验证连通性：获取连接、ping 并执行探测查询
    async fn verify_connectivity(&self) -> Result<(), ApplicationError>;

    fn pool_stats(&self) -> PoolStats;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthOptions {
    /// 附带连接池统计
    pub detailed: bool,
    /// 使用完整的连通性验证代替探测查询
    pub forced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub status: HealthStatus,
    pub response_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub database: DatabaseHealth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_stats: Option<PoolStats>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.database.status == HealthStatus::Healthy
    }
}

pub struct HealthReporter {
    probe: Arc<dyn DatabaseProbe>,
    clock: Arc<dyn Clock>,
    service: String,
    timeout: Duration,
}

impl HealthReporter {
    pub fn new(
        probe: Arc<dyn DatabaseProbe>,
        clock: Arc<dyn Clock>,
        service: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            probe,
            clock,
            service: service.into(),
            timeout,
        }
    }

    pub async fn check(&self, options: HealthOptions) -> HealthReport {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, async {
            if options.forced {
                self.probe.verify_connectivity().await
            } else {
                self.probe.probe().await
            }
        })
        .await;
        let elapsed = started.elapsed();

        let status = match outcome {
            Ok(Ok(())) => HealthStatus::Healthy,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, forced = options.forced, "database probe failed");
                HealthStatus::Unhealthy
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "database probe timed out"
                );
                HealthStatus::Unhealthy
            }
        };

        HealthReport {
            timestamp: self.clock.now(),
            service: self.service.clone(),
            database: DatabaseHealth {
                status,
                response_time_ms: elapsed.as_millis() as u64,
            },
            pool_stats: options.detailed.then(|| self.probe.pool_stats()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        }
    }

    struct SlowProbe;

    #[async_trait]
    impl DatabaseProbe for SlowProbe {
        async fn probe(&self) -> Result<(), ApplicationError> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(())
        }

        async fn verify_connectivity(&self) -> Result<(), ApplicationError> {
            self.probe().await
        }

        fn pool_stats(&self) -> PoolStats {
            PoolStats::default()
        }
    }

    fn stats() -> PoolStats {
        PoolStats {
            max_connections: 10,
            total_connections: 3,
            idle_connections: 2,
            active_connections: 1,
            queued_waiters: 0,
        }
    }

    fn reporter(probe: impl DatabaseProbe + 'static, timeout: Duration) -> HealthReporter {
        HealthReporter::new(Arc::new(probe), Arc::new(FixedClock), "backoffice-api", timeout)
    }

    #[tokio::test]
    async fn test_successful_probe_is_healthy() {
        let mut probe = MockDatabaseProbe::new();
        probe.expect_probe().times(1).returning(|| Ok(()));
        probe.expect_verify_connectivity().never();
        probe.expect_pool_stats().never();

        let report = reporter(probe, Duration::from_secs(1))
            .check(HealthOptions::default())
            .await;

        assert!(report.is_healthy());
        assert_eq!(report.service, "backoffice-api");
        assert_eq!(report.pool_stats, None);
    }

    #[tokio::test]
    async fn test_failed_probe_is_unhealthy() {
        let mut probe = MockDatabaseProbe::new();
        probe
            .expect_probe()
            .returning(|| Err(ApplicationError::infrastructure("connection refused")));

        let report = reporter(probe, Duration::from_secs(1))
            .check(HealthOptions::default())
            .await;

        assert_eq!(report.database.status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_slow_probe_is_unhealthy() {
        let report = reporter(SlowProbe, Duration::from_millis(20))
            .check(HealthOptions::default())
            .await;

        assert_eq!(report.database.status, HealthStatus::Unhealthy);
        assert!(report.database.response_time_ms < 500);
    }

    #[tokio::test]
    async fn test_forced_check_verifies_connectivity() {
        let mut probe = MockDatabaseProbe::new();
        probe.expect_probe().never();
        probe.expect_verify_connectivity().times(1).returning(|| Ok(()));

        let report = reporter(probe, Duration::from_secs(1))
            .check(HealthOptions {
                detailed: false,
                forced: true,
            })
            .await;

        assert!(report.is_healthy());
    }

    #[tokio::test]
    async fn test_detailed_report_includes_pool_stats() {
        let mut probe = MockDatabaseProbe::new();
        probe.expect_probe().returning(|| Ok(()));
        probe.expect_pool_stats().times(1).returning(stats);

        let report = reporter(probe, Duration::from_secs(1))
            .check(HealthOptions {
                detailed: true,
                forced: false,
            })
            .await;

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["database"]["status"], "healthy");
        assert_eq!(json["poolStats"]["activeConnections"], 1);
        assert_eq!(json["poolStats"]["maxConnections"], 10);
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00Z");
    }
}
