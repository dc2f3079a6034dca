//! Repository接口定义
//!
//! 定义数据访问层的抽象接口，内层定义接口，外层实现接口。
//! 返回 `'static` 的 boxed future，方便在 axum 处理器和测试替身之间共享。

use futures::future::BoxFuture;

use crate::{
    entities::Entity,
    errors::RepositoryError,
    value_objects::{EntityId, Page},
};

pub type RepositoryResult<T> = Result<T, RepositoryError>;
pub type RepositoryFuture<T> = BoxFuture<'static, RepositoryResult<T>>;

/// 单个实体资源的数据访问
pub trait EntityRepository<E: Entity>: Send + Sync {
    /// 按主键读取，不存在时返回 `None`
    fn find_by_id(&self, id: EntityId) -> RepositoryFuture<Option<E>>;

    /// 覆盖可编辑字段，行不存在时返回 `false`
    fn update(&self, id: EntityId, changes: E::Changes) -> RepositoryFuture<bool>;

    /// 条件查询，无结果时返回空列表
    fn search(&self, filter: E::Filter, page: Page) -> RepositoryFuture<Vec<E>>;

    /// 是否存在满足条件的行
    fn exists(&self, filter: E::Filter) -> RepositoryFuture<bool>;
}
