use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use config::{BackoffKind, PoolConfig};
use tokio::time::sleep;

/// 区分可重试（瞬时）错误和应立即失败的错误
pub trait Transient {
    fn is_transient(&self) -> bool;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    Exponential { base: Duration },
}

impl Backoff {
    pub fn fixed(delay: Duration) -> Self {
        Backoff::Fixed(delay)
    }

    pub fn exponential(base: Duration) -> Self {
        Backoff::Exponential { base }
    }

    /// 第 `attempt` 次失败后的等待时间（从 1 开始）
    pub fn delay_at(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential { base } => {
                let exp = std::cmp::min(attempt.saturating_sub(1), 20);
                let factor = 1u32 << exp;
                base.saturating_mul(factor)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 总尝试次数（含首次）
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn from_config(config: &PoolConfig) -> Self {
        let backoff = match config.retry_backoff {
            BackoffKind::Fixed => Backoff::fixed(config.retry_delay()),
            BackoffKind::Exponential => Backoff::exponential(config.retry_delay()),
        };
        Self {
            max_attempts: config.retry_count.max(1),
            backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::fixed(Duration::from_secs(1)),
        }
    }
}

/// 按策略执行 `op`，只有瞬时错误才会重试；耗尽后返回最后一次的错误
pub async fn retry_async<F, Fut, T, E>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempt >= policy.max_attempts || !e.is_transient() {
                    return Err(e);
                }
                let delay = policy.backoff.delay_at(attempt);
                tracing::warn!(
                    label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient database error, retrying"
                );
                sleep(delay).await;
            }
        }
    }
}
