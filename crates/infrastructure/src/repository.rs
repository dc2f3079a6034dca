//! MySQL 实体仓储
//!
//! 所有查询都经由 `QueryExecutor` 执行；行在边界处由 `SqlResource::from_record` 校验并转换为实体。

use std::{marker::PhantomData, sync::Arc};

use domain::{
    Entity, EntityId, EntityRepository, Page, RepositoryError, RepositoryFuture,
};
use sqlx::{mysql::MySqlRow, FromRow, MySql, QueryBuilder};

use crate::executor::QueryExecutor;

/// 实体到表的映射
pub trait SqlResource: Entity {
    type Record: for<'r> FromRow<'r, MySqlRow> + Send + Unpin + 'static;

    const TABLE: &'static str;
    /// SELECT 列表，列名与 `Record` 字段一致
    const COLUMNS: &'static str;

    fn from_record(record: Self::Record) -> Result<Self, RepositoryError>;

    /// 追加 `col = ?, col = ?` 形式的赋值
    fn push_assignments(qb: &mut QueryBuilder<'_, MySql>, changes: &Self::Changes);

    /// 追加 ` AND ...` 条件，调用前语句已包含 `WHERE 1 = 1`
    fn push_filter(qb: &mut QueryBuilder<'_, MySql>, filter: &Self::Filter);
}

/// 转义 LIKE 通配符，得到 `%needle%`
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

pub(crate) fn invalid_id(err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::invalid_data(err.to_string())
}

pub struct MySqlRepository<E> {
    executor: Arc<QueryExecutor>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> MySqlRepository<E> {
    pub fn new(executor: Arc<QueryExecutor>) -> Self {
        Self {
            executor,
            _entity: PhantomData,
        }
    }
}

fn select_sql<E: SqlResource>() -> String {
    format!("SELECT {} FROM {} WHERE 1 = 1", E::COLUMNS, E::TABLE)
}

impl<E: SqlResource> EntityRepository<E> for MySqlRepository<E> {
    fn find_by_id(&self, id: EntityId) -> RepositoryFuture<Option<E>> {
        let executor = self.executor.clone();
        Box::pin(async move {
            let label = format!("{}.find_by_id", E::RESOURCE);
            let sql = format!("SELECT {} FROM {} WHERE id = ?", E::COLUMNS, E::TABLE);
            let record = executor
                .run(&label, |conn| {
                    let sql = sql.clone();
                    Box::pin(async move {
                        sqlx::query_as::<_, E::Record>(&sql)
                            .bind(id.get())
                            .fetch_optional(conn)
                            .await
                    })
                })
                .await?;

            record.map(E::from_record).transpose()
        })
    }

    fn update(&self, id: EntityId, changes: E::Changes) -> RepositoryFuture<bool> {
        let executor = self.executor.clone();
        Box::pin(async move {
            let label = format!("{}.update", E::RESOURCE);
            let found = executor
                .run(&label, |conn| {
                    let changes = changes.clone();
                    Box::pin(async move {
                        let mut qb =
                            QueryBuilder::<MySql>::new(format!("UPDATE {} SET ", E::TABLE));
                        E::push_assignments(&mut qb, &changes);
                        qb.push(" WHERE id = ").push_bind(id.get());
                        let result = qb.build().execute(&mut *conn).await?;
                        if result.rows_affected() > 0 {
                            return Ok::<_, sqlx::Error>(true);
                        }

                        // 值未变化时 MySQL 也报告 0 行，需要区分"不存在"
                        let existing = sqlx::query_scalar::<_, i64>(&format!(
                            "SELECT 1 FROM {} WHERE id = ?",
                            E::TABLE
                        ))
                        .bind(id.get())
                        .fetch_optional(&mut *conn)
                        .await?;
                        Ok(existing.is_some())
                    })
                })
                .await?;

            Ok::<_, RepositoryError>(found)
        })
    }

    fn search(&self, filter: E::Filter, page: Page) -> RepositoryFuture<Vec<E>> {
        let executor = self.executor.clone();
        Box::pin(async move {
            let label = format!("{}.search", E::RESOURCE);
            let records = executor
                .run(&label, |conn| {
                    let filter = filter.clone();
                    Box::pin(async move {
                        let mut qb = QueryBuilder::<MySql>::new(select_sql::<E>());
                        E::push_filter(&mut qb, &filter);
                        qb.push(" ORDER BY id LIMIT ")
                            .push_bind(page.limit())
                            .push(" OFFSET ")
                            .push_bind(page.offset());
                        qb.build_query_as::<E::Record>().fetch_all(conn).await
                    })
                })
                .await?;

            records
                .into_iter()
                .map(E::from_record)
                .collect::<Result<Vec<_>, _>>()
        })
    }

    fn exists(&self, filter: E::Filter) -> RepositoryFuture<bool> {
        let executor = self.executor.clone();
        Box::pin(async move {
            let label = format!("{}.exists", E::RESOURCE);
            let found = executor
                .run(&label, |conn| {
                    let filter = filter.clone();
                    Box::pin(async move {
                        let mut qb = QueryBuilder::<MySql>::new(format!(
                            "SELECT 1 FROM {} WHERE 1 = 1",
                            E::TABLE
                        ));
                        E::push_filter(&mut qb, &filter);
                        qb.push(" LIMIT 1");
                        qb.build_query_scalar::<i64>().fetch_optional(conn).await
                    })
                })
                .await?;

            Ok::<_, RepositoryError>(found.is_some())
        })
    }
}
