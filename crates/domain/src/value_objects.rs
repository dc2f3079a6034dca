use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// 实体主键（数据库自增 ID，从 1 开始）
///
/// 反序列化同样经过 `TryFrom<u64>`，请求体和查询参数中的 0 会被拒绝。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct EntityId(u64);

impl EntityId {
    /// 解析路径参数中的 ID，只接受正整数
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let value: u64 = raw
            .trim()
            .parse()
            .map_err(|_| DomainError::validation_error("id", "must be a positive integer"))?;
        Self::try_from(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for EntityId {
    type Error = DomainError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(DomainError::validation_error(
                "id",
                "must be a positive integer",
            ));
        }
        Ok(Self(value))
    }
}

/// 数据库行中的有符号整数列
impl TryFrom<i64> for EntityId {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let value = u64::try_from(value)
            .map_err(|_| DomainError::validation_error("id", "must be a positive integer"))?;
        Self::try_from(value)
    }
}

impl From<EntityId> for u64 {
    fn from(value: EntityId) -> Self {
        value.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 列表查询的分页参数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 50;
    pub const MAX_LIMIT: u32 = 200;

    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}
