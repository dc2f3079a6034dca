//! 应用层实现。
//!
//! 提供健康检查用例，以及对外部适配器（数据库探针、时钟）的抽象。

pub mod clock;
pub mod error;
pub mod health;

pub use clock::{Clock, SystemClock};
pub use error::ApplicationError;
pub use health::{
    DatabaseHealth, DatabaseProbe, HealthOptions, HealthReport, HealthReporter, HealthStatus,
    PoolStats,
};
