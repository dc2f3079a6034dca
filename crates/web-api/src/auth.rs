//! 会话令牌校验与路由访问控制
//!
//! 令牌由外部认证服务签发（HS256，共享密钥），这里只负责验证。
//! 优先读取会话 cookie，其次读取 `Authorization: Bearer`。

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use config::{AuthConfig, RoutePermissionConfig};
use domain::{AccessDecision, Claims, RoutePermission, RoutePermissionTable};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

/// JWT Token 服务
#[derive(Clone)]
pub struct JwtService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// 验证并解析 JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
    }
}

/// 路由访问控制：令牌校验 + 有序权限表
pub struct AccessGate {
    jwt: JwtService,
    table: RoutePermissionTable,
    cookie_name: String,
    login_path: String,
    access_denied_path: String,
}

impl AccessGate {
    pub fn new(jwt: JwtService, table: RoutePermissionTable, auth: &AuthConfig) -> Self {
        Self {
            jwt,
            table,
            cookie_name: auth.cookie_name.clone(),
            login_path: auth.login_path.clone(),
            access_denied_path: auth.access_denied_path.clone(),
        }
    }

    pub fn from_config(auth: &AuthConfig, permissions: &[RoutePermissionConfig]) -> Self {
        let table = RoutePermissionTable::new(
            permissions
                .iter()
                .map(|entry| {
                    RoutePermission::new(entry.prefix.clone(), entry.roles.iter().map(String::as_str))
                })
                .collect(),
        );
        Self::new(JwtService::new(&auth.jwt_secret), table, auth)
    }

    pub fn table(&self) -> &RoutePermissionTable {
        &self.table
    }

    /// 从 cookie 或 Bearer 头中取出令牌
    pub fn extract_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        let from_cookie = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value)
            .filter(|value| !value.is_empty());

        from_cookie.or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|value| !value.is_empty())
        })
    }

    /// 有效令牌的声明；缺失、签名错误或过期时为 `None`
    pub fn claims(&self, headers: &HeaderMap) -> Option<Claims> {
        let token = self.extract_token(headers)?;
        match self.jwt.verify_token(token) {
            Ok(claims) => Some(claims),
            Err(err) => {
                tracing::debug!(error = %err, "rejected session token");
                None
            }
        }
    }

    pub fn decide(&self, headers: &HeaderMap, path: &str) -> (AccessDecision, Option<Claims>) {
        let claims = self.claims(headers);
        let decision = self.table.evaluate(claims.as_ref(), path);
        (decision, claims)
    }
}

/// 访问控制中间件，通过后将 `Claims` 放入请求扩展
pub async fn authorize(
    State(gate): State<Arc<AccessGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let (decision, claims) = gate.decide(request.headers(), &path);

    match decision {
        AccessDecision::Authorized => {
            if let Some(claims) = claims {
                request.extensions_mut().insert(claims);
            }
            next.run(request).await
        }
        AccessDecision::Unauthenticated => {
            tracing::debug!(path = %path, "unauthenticated request, redirecting to login");
            Redirect::temporary(&gate.login_path).into_response()
        }
        AccessDecision::NoSystemAccess | AccessDecision::Forbidden => {
            tracing::info!(
                path = %path,
                user = claims.as_ref().map(|c| c.sub.as_str()).unwrap_or_default(),
                decision = ?decision,
                "access denied"
            );
            Redirect::temporary(&gate.access_denied_path).into_response()
        }
    }
}
