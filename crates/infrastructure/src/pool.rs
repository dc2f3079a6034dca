//! Database connection pool (Core DB Layer)
//!
//! 并发连接数由 `AdmissionGate` 限制在 `max_connections` 以内，超出的请求进入有界等待队列；
//! 队列已满时立即返回 `DbError::PoolExhausted`。

use std::{
    ops::{Deref, DerefMut},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use application::PoolStats;
use config::{DatabaseConfig, PoolConfig};
use sqlx::{
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
    pool::PoolConnection,
    MySql, MySqlConnection, MySqlPool,
};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::error::DbError;

/// 连接准入控制：信号量许可 + 等待者计数
pub struct AdmissionGate {
    permits: Arc<Semaphore>,
    waiting: AtomicUsize,
    max_connections: u32,
    /// 0 表示不限制
    queue_limit: usize,
    acquire_timeout: Duration,
}

struct WaitingGuard<'a>(&'a AtomicUsize);

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AdmissionGate {
    pub fn new(max_connections: u32, queue_limit: u32, acquire_timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_connections as usize)),
            waiting: AtomicUsize::new(0),
            max_connections,
            queue_limit: queue_limit as usize,
            acquire_timeout,
        }
    }

    pub fn from_config(config: &PoolConfig) -> Self {
        Self::new(
            config.max_connections,
            config.queue_limit,
            config.acquire_timeout(),
        )
    }

    /// 获取一个连接许可，许可在 drop 时归还
    pub async fn admit(&self) -> Result<OwnedSemaphorePermit, DbError> {
        match self.permits.clone().try_acquire_owned() {
            Ok(permit) => return Ok(permit),
            Err(TryAcquireError::Closed) => return Err(DbError::PoolClosed),
            Err(TryAcquireError::NoPermits) => {}
        }

        let queued = self.waiting.fetch_add(1, Ordering::SeqCst);
        let _guard = WaitingGuard(&self.waiting);
        if self.queue_limit > 0 && queued >= self.queue_limit {
            tracing::warn!(
                queued,
                queue_limit = self.queue_limit,
                "connection queue is full, rejecting request"
            );
            return Err(DbError::PoolExhausted {
                queued,
                limit: self.queue_limit,
            });
        }

        match tokio::time::timeout(self.acquire_timeout, self.permits.clone().acquire_owned())
            .await
        {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(DbError::PoolClosed),
            Err(_) => Err(DbError::AcquireTimeout(self.acquire_timeout)),
        }
    }

    /// 正在排队等待连接的请求数
    pub fn queued(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// 已发放的许可数
    pub fn in_use(&self) -> u32 {
        self.max_connections
            .saturating_sub(self.permits.available_permits() as u32)
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    pub fn close(&self) {
        self.permits.close();
    }
}

/// 池化连接，drop 时同时归还许可和连接
pub struct PooledConnection {
    conn: PoolConnection<MySql>,
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    /// 连接状态不可信（例如查询被超时中断）时，关闭而不是放回池中
    pub fn discard(&mut self) {
        self.conn.close_on_drop();
    }
}

impl Deref for PooledConnection {
    type Target = MySqlConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

/// 进程级连接池句柄，启动时创建，关闭时显式释放
pub struct ConnectionPool {
    pool: MySqlPool,
    gate: AdmissionGate,
    config: PoolConfig,
}

impl ConnectionPool {
    /// 延迟建立连接：服务可以在数据库不可用时启动，并由健康检查报告状态
    pub fn connect(database: &DatabaseConfig, config: &PoolConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&database.host)
            .port(database.port)
            .username(&database.user)
            .password(&database.password)
            .database(&database.name);

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(0)
            .idle_timeout(Some(config.idle_timeout()))
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy_with(options);

        tracing::info!(
            host = %database.host,
            port = database.port,
            database = %database.name,
            max_connections = config.max_connections,
            queue_limit = config.queue_limit,
            "MySQL connection pool configured"
        );

        Self {
            pool,
            gate: AdmissionGate::from_config(config),
            config: config.clone(),
        }
    }

    pub async fn acquire(&self) -> Result<PooledConnection, DbError> {
        let permit = self.gate.admit().await?;
        let conn = self.pool.acquire().await?;
        Ok(PooledConnection {
            conn,
            _permit: permit,
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn stats(&self) -> PoolStats {
        let total = self.pool.size();
        let idle = self.pool.num_idle() as u32;
        PoolStats {
            max_connections: self.gate.max_connections(),
            total_connections: total,
            idle_connections: idle,
            active_connections: total.saturating_sub(idle),
            queued_waiters: self.gate.queued(),
        }
    }

    pub async fn close(&self) {
        self.gate.close();
        self.pool.close().await;
        tracing::info!("MySQL connection pool closed");
    }
}
