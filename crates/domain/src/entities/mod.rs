//! 领域实体定义
//!
//! 每个实体对应一个 REST 资源，附带 PUT 使用的 `Changes` 和列表查询使用的 `Filter`。

pub mod caixa;
pub mod cliente;
pub mod fornecedor;
pub mod horario;
pub mod lancamento;
pub mod turma;

use serde::{de::DeserializeOwned, Serialize};
use validator::Validate;

use crate::value_objects::EntityId;

pub use caixa::{Caixa, CaixaChanges, CaixaFilter};
pub use cliente::{Cliente, ClienteChanges, ClienteFilter};
pub use fornecedor::{Fornecedor, FornecedorChanges, FornecedorFilter};
pub use horario::{Horario, HorarioChanges, HorarioFilter};
pub use lancamento::{Lancamento, LancamentoChanges, LancamentoFilter, LancamentoTipo};
pub use turma::{Turma, TurmaChanges, TurmaFilter};

/// 可通过通用 REST 接口访问的实体
pub trait Entity: Serialize + Clone + Send + Sync + 'static {
    /// PUT 请求体：全部可编辑字段
    type Changes: DeserializeOwned + Validate + Clone + Send + Sync + 'static;
    /// 列表/存在性查询条件，字段均为可选
    type Filter: DeserializeOwned + Default + Clone + Send + Sync + 'static;

    /// 资源路径段，例如 `caixa`
    const RESOURCE: &'static str;

    fn id(&self) -> EntityId;

    /// 用新值覆盖可编辑字段
    fn apply(&mut self, changes: Self::Changes);

    /// 实体是否满足查询条件
    fn matches(&self, filter: &Self::Filter) -> bool;
}

/// 名称类字段按子串匹配，不区分大小写
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub(crate) fn optional_contains(value: Option<&str>, needle: &Option<String>) -> bool {
    match needle {
        Some(needle) => value.is_some_and(|v| contains_ignore_case(v, needle)),
        None => true,
    }
}

pub(crate) fn optional_eq<T: PartialEq>(value: &T, expected: &Option<T>) -> bool {
    expected.as_ref().is_none_or(|e| e == value)
}
