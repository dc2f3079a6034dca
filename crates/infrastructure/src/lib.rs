//! 基础设施层实现。
//!
//! 提供 MySQL 连接池、带重试的查询执行器、数据库健康探针和实体仓储，
//! 实现应用/领域层定义的接口。

pub mod builder;
pub mod error;
pub mod executor;
pub mod health;
pub mod pool;
pub mod repository;
pub mod resources;
pub mod retry;

pub use builder::Infrastructure;
pub use error::DbError;
pub use executor::QueryExecutor;
pub use health::MySqlHealthProbe;
pub use pool::{AdmissionGate, ConnectionPool, PooledConnection};
pub use repository::{MySqlRepository, SqlResource};
pub use retry::{retry_async, Backoff, RetryPolicy, Transient};
