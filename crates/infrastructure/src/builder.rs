use std::sync::Arc;

use application::DatabaseProbe;
use config::AppConfig;
use domain::EntityRepository;

use crate::{
    executor::QueryExecutor,
    health::MySqlHealthProbe,
    pool::ConnectionPool,
    repository::{MySqlRepository, SqlResource},
};

/// 基础设施装配：一个连接池，一个执行器，按需创建仓储
#[derive(Clone)]
pub struct Infrastructure {
    pub pool: Arc<ConnectionPool>,
    pub executor: Arc<QueryExecutor>,
}

impl Infrastructure {
    pub fn connect(config: &AppConfig) -> Self {
        let pool = Arc::new(ConnectionPool::connect(&config.database, &config.pool));
        let executor = Arc::new(QueryExecutor::new(pool.clone()));
        Self { pool, executor }
    }

    pub fn repository<E: SqlResource>(&self) -> Arc<dyn EntityRepository<E>> {
        Arc::new(MySqlRepository::<E>::new(self.executor.clone()))
    }

    pub fn health_probe(&self) -> Arc<dyn DatabaseProbe> {
        Arc::new(MySqlHealthProbe::new(self.pool.clone()))
    }

    pub async fn shutdown(&self) {
        self.pool.close().await;
    }
}
