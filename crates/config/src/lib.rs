//! 统一配置中心
//!
//! 提供应用的全局配置管理，包括：
//! - 数据库连接与连接池策略
//! - 会话令牌校验
//! - 路由权限表
//! - 服务设置
//!
//! 加载顺序：默认值 -> 可选配置文件（APP_CONFIG_FILE）-> 兼容的 `DB_*` 环境变量 -> `APP_*` 环境变量。
//! 配置只在进程启动时读取一次，之后只读。

use std::{env, fmt, time::Duration};

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 健康检查中上报的服务名
    pub service_name: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub pool: PoolConfig,
    pub auth: AuthConfig,
    /// 路由权限表，按声明顺序匹配
    #[serde(default)]
    pub permissions: Vec<RoutePermissionConfig>,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 数据库配置
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .finish()
    }
}

/// 重试退避方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Fixed,
    Exponential,
}

/// 连接池与查询策略
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// 最大并发连接数
    pub max_connections: u32,
    /// 等待队列上限，默认为 `max_connections` 的 4 倍；显式配置为 0 表示不限制
    pub queue_limit: u32,
    pub idle_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
    /// 单次查询的最大尝试次数（含首次）
    pub retry_count: u32,
    pub retry_delay_ms: u64,
    pub retry_backoff: BackoffKind,
    pub query_timeout_secs: u64,
    pub slow_query_threshold_ms: u64,
}

impl PoolConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn slow_query_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_query_threshold_ms)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            queue_limit: 40,
            idle_timeout_secs: 60,
            acquire_timeout_secs: 10,
            retry_count: 3,
            retry_delay_ms: 1000,
            retry_backoff: BackoffKind::Fixed,
            query_timeout_secs: 30,
            slow_query_threshold_ms: 1000,
        }
    }
}

/// 会话令牌配置
///
/// 令牌由外部认证服务签发，这里只负责校验。
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub cookie_name: String,
    pub login_path: String,
    pub access_denied_path: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("cookie_name", &self.cookie_name)
            .field("login_path", &self.login_path)
            .field("access_denied_path", &self.access_denied_path)
            .finish()
    }
}

/// 路由权限表的一项
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoutePermissionConfig {
    pub prefix: String,
    pub roles: Vec<String>,
}

impl RoutePermissionConfig {
    fn new(prefix: &str, roles: &[&str]) -> Self {
        Self {
            prefix: prefix.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// 默认权限表
pub fn default_permissions() -> Vec<RoutePermissionConfig> {
    vec![
        RoutePermissionConfig::new("/configuracoes", &["admin"]),
        RoutePermissionConfig::new("/caixa", &["admin", "financeiro"]),
        RoutePermissionConfig::new("/lancamento", &["admin", "financeiro"]),
        RoutePermissionConfig::new("/fornecedor", &["admin", "financeiro"]),
        RoutePermissionConfig::new("/cliente", &["admin", "financeiro", "secretaria"]),
        RoutePermissionConfig::new("/turma", &["admin", "secretaria", "professor"]),
        RoutePermissionConfig::new("/horario", &["admin", "secretaria", "professor"]),
    ]
}

impl Default for AppConfig {
    /// 默认配置仅适用于开发环境，其中的 JWT 密钥无法通过 `validate`
    fn default() -> Self {
        Self {
            service_name: "backoffice-api".to_string(),
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                host: "127.0.0.1".to_string(),
                port: 3306,
                user: "root".to_string(),
                password: String::new(),
                name: "backoffice".to_string(),
            },
            pool: PoolConfig::default(),
            auth: AuthConfig {
                jwt_secret: "dev-secret-key-not-for-production-use-minimum-32-chars".to_string(),
                cookie_name: "session-token".to_string(),
                login_path: "/login".to_string(),
                access_denied_path: "/acesso-negado".to_string(),
            },
            permissions: default_permissions(),
        }
    }
}

const DEV_SECRET_MARKERS: [&str; 3] = ["dev-secret", "not-for-production", "please-change"];

const LEGACY_DB_KEYS: [&str; 5] = ["host", "port", "user", "password", "name"];

impl AppConfig {
    /// 构建配置来源链
    pub fn figment() -> Figment {
        let mut fig = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Ok(path) = env::var("APP_CONFIG_FILE") {
            if path.ends_with(".yml") || path.ends_with(".yaml") {
                fig = fig.merge(Yaml::file(path));
            } else if path.ends_with(".json") {
                fig = fig.merge(Json::file(path));
            } else {
                fig = fig.merge(Toml::file(path));
            }
        }
        fig.merge(
            Env::prefixed("DB_")
                .only(&LEGACY_DB_KEYS)
                .map(|key| format!("database.{}", key).into()),
        )
        .merge(Env::prefixed("APP_").split("__"))
    }

    /// 从环境加载并校验配置
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment
            .extract()
            .map_err(|err| ConfigError::Load(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.host.trim().is_empty() {
            return Err(ConfigError::InvalidDatabaseConfig(
                "database host cannot be empty".to_string(),
            ));
        }
        if self.database.name.trim().is_empty() {
            return Err(ConfigError::InvalidDatabaseConfig(
                "database name cannot be empty".to_string(),
            ));
        }

        if self.pool.max_connections == 0 {
            return Err(ConfigError::InvalidPoolConfig(
                "max connections must be greater than 0".to_string(),
            ));
        }
        if self.pool.retry_count == 0 {
            return Err(ConfigError::InvalidPoolConfig(
                "retry count must be at least 1".to_string(),
            ));
        }
        if self.pool.query_timeout_secs == 0 || self.pool.acquire_timeout_secs == 0 {
            return Err(ConfigError::InvalidPoolConfig(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        // HS256 密钥至少 256 位
        if self.auth.jwt_secret.len() < 32 {
            return Err(ConfigError::InvalidAuthConfig(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }
        // 开发密钥写在源码里，任何人都能用它签发令牌
        if DEV_SECRET_MARKERS
            .iter()
            .any(|marker| self.auth.jwt_secret.contains(marker))
        {
            return Err(ConfigError::InvalidAuthConfig(
                "development JWT secret is not allowed, set APP_AUTH__JWT_SECRET".to_string(),
            ));
        }
        for path in [&self.auth.login_path, &self.auth.access_denied_path] {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidAuthConfig(format!(
                    "redirect path must be absolute: {}",
                    path
                )));
            }
        }

        for entry in &self.permissions {
            if !entry.prefix.starts_with('/') {
                return Err(ConfigError::InvalidPermission(format!(
                    "prefix must start with '/': {}",
                    entry.prefix
                )));
            }
            if entry.roles.is_empty() {
                return Err(ConfigError::InvalidPermission(format!(
                    "prefix {} has no allowed roles",
                    entry.prefix
                )));
            }
        }

        Ok(())
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),
    #[error("Invalid database configuration: {0}")]
    InvalidDatabaseConfig(String),
    #[error("Invalid pool configuration: {0}")]
    InvalidPoolConfig(String),
    #[error("Invalid auth configuration: {0}")]
    InvalidAuthConfig(String),
    #[error("Invalid route permission: {0}")]
    InvalidPermission(String),
}
