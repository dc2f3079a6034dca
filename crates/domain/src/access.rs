//! 基于角色的路由访问控制
//!
//! 每个请求的状态转换：
//! - 无令牌 / 令牌无效或过期 -> `Unauthenticated`
//! - 令牌有效但没有系统访问权限 -> `NoSystemAccess`
//! - 路径命中权限表且角色不在允许集合内 -> `Forbidden`
//! - 其余情况 -> `Authorized`
//!
//! 权限表是有序列表，按声明顺序匹配，第一个命中的条目生效。

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

/// 用户角色，统一为小写
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Role(String);

impl Role {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 外部认证服务签发的会话令牌声明
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(rename = "systemAccess", default)]
    pub system_access: bool,
    /// 过期时间 (Unix timestamp)
    pub exp: i64,
}

/// 访问判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Unauthenticated,
    NoSystemAccess,
    Forbidden,
    Authorized,
}

/// 权限表中的一项：路径前缀及允许的角色
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePermission {
    prefix: String,
    roles: HashSet<Role>,
}

impl RoutePermission {
    pub fn new<I, R>(prefix: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        let mut prefix = prefix.into();
        while prefix.len() > 1 && prefix.ends_with('/') {
            prefix.pop();
        }
        Self {
            prefix,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn allows(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// 按路径段匹配：`/caixa` 命中 `/caixa` 和 `/caixa/1`，不命中 `/caixas`
    pub fn matches(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// 有序的路由权限表，启动时构建，之后只读
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePermissionTable {
    entries: Vec<RoutePermission>,
}

impl RoutePermissionTable {
    pub fn new(entries: Vec<RoutePermission>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RoutePermission] {
        &self.entries
    }

    /// 第一个命中的条目
    pub fn rule_for(&self, path: &str) -> Option<&RoutePermission> {
        self.entries.iter().find(|entry| entry.matches(path))
    }

    /// 判定请求能否访问路径，`claims` 为 `None` 表示没有有效令牌
    pub fn evaluate(&self, claims: Option<&Claims>, path: &str) -> AccessDecision {
        let Some(claims) = claims else {
            return AccessDecision::Unauthenticated;
        };
        if !claims.system_access {
            return AccessDecision::NoSystemAccess;
        }

        match self.rule_for(path) {
            Some(rule) => match &claims.role {
                Some(role) if rule.allows(role) => AccessDecision::Authorized,
                _ => AccessDecision::Forbidden,
            },
            None => AccessDecision::Authorized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Option<&str>, system_access: bool) -> Claims {
        Claims {
            sub: "42".to_string(),
            role: role.map(Role::from),
            system_access,
            exp: i64::MAX,
        }
    }

    fn table() -> RoutePermissionTable {
        RoutePermissionTable::new(vec![
            RoutePermission::new("/financeiro/relatorios", ["admin"]),
            RoutePermission::new("/financeiro", ["admin", "financeiro"]),
            RoutePermission::new("/caixa", ["admin", "financeiro"]),
        ])
    }

    #[test]
    fn test_missing_claims_is_unauthenticated() {
        assert_eq!(
            table().evaluate(None, "/caixa/1"),
            AccessDecision::Unauthenticated
        );
    }

    #[test]
    fn test_system_access_checked_before_role() {
        let claims = claims(Some("admin"), false);
        assert_eq!(
            table().evaluate(Some(&claims), "/caixa/1"),
            AccessDecision::NoSystemAccess
        );
    }

    #[test]
    fn test_role_in_allowed_set() {
        let claims = claims(Some("financeiro"), true);
        assert_eq!(
            table().evaluate(Some(&claims), "/caixa/1"),
            AccessDecision::Authorized
        );
    }

    #[test]
    fn test_role_not_in_allowed_set() {
        let claims = claims(Some("professor"), true);
        assert_eq!(
            table().evaluate(Some(&claims), "/caixa"),
            AccessDecision::Forbidden
        );
    }

    #[test]
    fn test_missing_role_is_forbidden_on_protected_path() {
        let claims = claims(None, true);
        assert_eq!(
            table().evaluate(Some(&claims), "/caixa"),
            AccessDecision::Forbidden
        );
        assert_eq!(
            table().evaluate(Some(&claims), "/turma"),
            AccessDecision::Authorized
        );
    }

    #[test]
    fn test_first_declared_match_wins() {
        let financeiro = claims(Some("financeiro"), true);
        assert_eq!(
            table().evaluate(Some(&financeiro), "/financeiro/relatorios/2024"),
            AccessDecision::Forbidden
        );
        assert_eq!(
            table().evaluate(Some(&financeiro), "/financeiro/contas"),
            AccessDecision::Authorized
        );

        // 顺序颠倒后，较短的前缀先命中
        let reversed = RoutePermissionTable::new(vec![
            RoutePermission::new("/financeiro", ["admin", "financeiro"]),
            RoutePermission::new("/financeiro/relatorios", ["admin"]),
        ]);
        assert_eq!(
            reversed.evaluate(Some(&financeiro), "/financeiro/relatorios/2024"),
            AccessDecision::Authorized
        );
        assert_eq!(
            reversed.rule_for("/financeiro/relatorios").unwrap().prefix(),
            "/financeiro"
        );
    }

    #[test]
    fn test_prefix_matches_whole_segments() {
        let rule = RoutePermission::new("/caixa/", ["admin"]);
        assert_eq!(rule.prefix(), "/caixa");
        assert!(rule.matches("/caixa"));
        assert!(rule.matches("/caixa/1"));
        assert!(!rule.matches("/caixas"));
        assert!(!rule.matches("/cai"));
    }

    #[test]
    fn test_root_prefix_matches_everything() {
        let rule = RoutePermission::new("/", ["admin"]);
        assert!(rule.matches("/"));
        assert!(rule.matches("/cliente/3"));
    }

    #[test]
    fn test_roles_are_case_insensitive() {
        let claims = claims(Some("Financeiro"), true);
        assert_eq!(
            table().evaluate(Some(&claims), "/caixa"),
            AccessDecision::Authorized
        );
    }

    #[test]
    fn test_claims_deserialize_from_provider_payload() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": "7",
            "role": "ADMIN",
            "systemAccess": true,
            "exp": 1_700_000_000
        }))
        .unwrap();
        assert_eq!(claims.role, Some(Role::new("admin")));
        assert!(claims.system_access);

        let claims: Claims =
            serde_json::from_value(serde_json::json!({"sub": "7", "exp": 1})).unwrap();
        assert_eq!(claims.role, None);
        assert!(!claims.system_access);
    }
}
