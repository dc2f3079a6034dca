//! 领域模型错误定义
//!
//! 定义了系统中所有可能的错误类型，提供清晰的错误上下文。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 验证错误
    #[error("验证失败: {field}: {message}")]
    ValidationError { field: String, message: String },
}

impl DomainError {
    /// 创建验证错误
    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// 仓储错误
///
/// `message` 只用于服务端日志，不应返回给调用方。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    /// 连接池耗尽或获取连接超时
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },

    /// 查询失败（含重试耗尽）
    #[error("storage error: {message}")]
    Storage { message: String },

    /// 数据库中的行无法映射为实体
    #[error("invalid stored data: {message}")]
    InvalidData { message: String },
}

impl RepositoryError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}
