use std::time::Duration;

use domain::RepositoryError;
use sqlx::mysql::MySqlDatabaseError;
use thiserror::Error;

use crate::retry::Transient;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("connection pool exhausted: {queued} requests already waiting (limit {limit})")]
    PoolExhausted { queued: usize, limit: usize },
    #[error("timed out after {0:?} waiting for a connection")]
    AcquireTimeout(Duration),
    #[error("query exceeded timeout of {0:?}")]
    QueryTimeout(Duration),
    #[error("connection pool is closed")]
    PoolClosed,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// 值得重试的 MySQL 错误号
///
/// 1205 锁等待超时, 1213 死锁, 1040 连接数过多, 1053 服务器关闭中,
/// 1927 连接被终止, 2006 服务器已断开, 2013 查询中连接丢失
const TRANSIENT_MYSQL_ERRORS: [u16; 7] = [1205, 1213, 1040, 1053, 1927, 2006, 2013];

pub(crate) fn is_transient_mysql_error(number: u16) -> bool {
    TRANSIENT_MYSQL_ERRORS.contains(&number)
}

impl Transient for DbError {
    fn is_transient(&self) -> bool {
        match self {
            DbError::Sqlx(sqlx::Error::Io(_)) => true,
            DbError::Sqlx(sqlx::Error::Database(db_err)) => {
                let by_number = db_err
                    .try_downcast_ref::<MySqlDatabaseError>()
                    .is_some_and(|err| is_transient_mysql_error(err.number()));
                // SQLSTATE 40001: serialization failure
                by_number || db_err.code().as_deref() == Some("40001")
            }
            _ => false,
        }
    }
}

impl From<DbError> for RepositoryError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::PoolExhausted { .. }
            | DbError::AcquireTimeout(_)
            | DbError::PoolClosed
            | DbError::Sqlx(sqlx::Error::PoolTimedOut)
            | DbError::Sqlx(sqlx::Error::PoolClosed) => RepositoryError::unavailable(err.to_string()),
            other => RepositoryError::storage(other.to_string()),
        }
    }
}
