#![allow(dead_code)]

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use application::{ApplicationError, DatabaseProbe, HealthReporter, PoolStats, SystemClock};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use config::{AppConfig, RoutePermissionConfig};
use domain::{
    Caixa, Cliente, Entity, EntityId, EntityRepository, Fornecedor, Horario, Lancamento, Page,
    RepositoryError, RepositoryFuture, Turma,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower::ServiceExt;
use web_api::{router, AccessGate, AppState, Repositories};

/// 以 `Entity::matches` / `Entity::apply` 实现的内存仓储
pub struct InMemoryRepository<E> {
    rows: Arc<RwLock<BTreeMap<EntityId, E>>>,
    failure: Option<RepositoryError>,
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new(rows: Vec<E>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows.into_iter().map(|e| (e.id(), e)).collect())),
            failure: None,
        }
    }

    pub fn failing(error: RepositoryError) -> Self {
        Self {
            rows: Arc::default(),
            failure: Some(error),
        }
    }

    fn check(&self) -> Result<(), RepositoryError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl<E: Entity> EntityRepository<E> for InMemoryRepository<E> {
    fn find_by_id(&self, id: EntityId) -> RepositoryFuture<Option<E>> {
        let rows = self.rows.clone();
        let check = self.check();
        Box::pin(async move {
            check?;
            Ok(rows.read().await.get(&id).cloned())
        })
    }

    fn update(&self, id: EntityId, changes: E::Changes) -> RepositoryFuture<bool> {
        let rows = self.rows.clone();
        let check = self.check();
        Box::pin(async move {
            check?;
            let mut guard = rows.write().await;
            match guard.get_mut(&id) {
                Some(row) => {
                    row.apply(changes);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn search(&self, filter: E::Filter, page: Page) -> RepositoryFuture<Vec<E>> {
        let rows = self.rows.clone();
        let check = self.check();
        Box::pin(async move {
            check?;
            let guard = rows.read().await;
            Ok(guard
                .values()
                .filter(|row| row.matches(&filter))
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .cloned()
                .collect())
        })
    }

    fn exists(&self, filter: E::Filter) -> RepositoryFuture<bool> {
        let rows = self.rows.clone();
        let check = self.check();
        Box::pin(async move {
            check?;
            Ok(rows.read().await.values().any(|row| row.matches(&filter)))
        })
    }
}

/// 可配置结果与延迟的数据库探针
#[derive(Clone)]
pub struct FakeProbe {
    pub healthy: bool,
    pub delay: Duration,
}

impl FakeProbe {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            delay: Duration::ZERO,
        }
    }

    pub fn failing() -> Self {
        Self {
            healthy: false,
            delay: Duration::ZERO,
        }
    }

    async fn run(&self) -> Result<(), ApplicationError> {
        tokio::time::sleep(self.delay).await;
        if self.healthy {
            Ok(())
        } else {
            Err(ApplicationError::infrastructure("connection refused"))
        }
    }
}

#[async_trait]
impl DatabaseProbe for FakeProbe {
    async fn probe(&self) -> Result<(), ApplicationError> {
        self.run().await
    }

    async fn verify_connectivity(&self) -> Result<(), ApplicationError> {
        self.run().await
    }

    fn pool_stats(&self) -> PoolStats {
        PoolStats {
            max_connections: 10,
            total_connections: 2,
            idle_connections: 1,
            active_connections: 1,
            queued_waiters: 0,
        }
    }
}

pub fn caixa_a() -> Caixa {
    Caixa {
        id: EntityId::try_from(1u64).unwrap(),
        nome: "Caixa A".to_string(),
        tipo: "Tipo A".to_string(),
        saldo: 100.0,
    }
}

pub fn caixa_b() -> Caixa {
    Caixa {
        id: EntityId::try_from(2u64).unwrap(),
        nome: "Caixa Reserva".to_string(),
        tipo: "Tipo B".to_string(),
        saldo: 50.0,
    }
}

pub struct TestApp {
    pub caixa: Arc<dyn EntityRepository<Caixa>>,
    pub probe: FakeProbe,
    pub permissions: Vec<RoutePermissionConfig>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self {
            caixa: Arc::new(InMemoryRepository::new(vec![caixa_a(), caixa_b()])),
            probe: FakeProbe::healthy(),
            permissions: AppConfig::default().permissions,
        }
    }
}

impl TestApp {
    pub fn router(self) -> Router {
        let config = AppConfig::default();
        let repositories = Repositories {
            caixa: self.caixa,
            cliente: Arc::new(InMemoryRepository::<Cliente>::new(Vec::new())),
            fornecedor: Arc::new(InMemoryRepository::<Fornecedor>::new(Vec::new())),
            turma: Arc::new(InMemoryRepository::<Turma>::new(Vec::new())),
            lancamento: Arc::new(InMemoryRepository::<Lancamento>::new(Vec::new())),
            horario: Arc::new(InMemoryRepository::<Horario>::new(Vec::new())),
        };
        let health = Arc::new(HealthReporter::new(
            Arc::new(self.probe),
            Arc::new(SystemClock),
            config.service_name.clone(),
            Duration::from_millis(200),
        ));
        let gate = Arc::new(AccessGate::from_config(&config.auth, &self.permissions));
        router(AppState::new(repositories, health, gate))
    }
}

pub fn test_router() -> Router {
    TestApp::default().router()
}

/// 使用开发环境密钥签发令牌
pub fn token(role: Option<&str>, system_access: bool) -> String {
    token_with_exp(role, system_access, chrono::Utc::now().timestamp() + 3600)
}

pub fn token_with_exp(role: Option<&str>, system_access: bool, exp: i64) -> String {
    let secret = AppConfig::default().auth.jwt_secret;
    let mut claims = json!({
        "sub": "user-1",
        "systemAccess": system_access,
        "exp": exp,
    });
    if let Some(role) = role {
        claims["role"] = json!(role);
    }
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("encode token")
}

pub fn admin_token() -> String {
    token(Some("admin"), true)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("request")
}

pub fn put_json(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("request");
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));
    (status, body)
}

/// 返回状态码和 `Location` 头
pub async fn send_for_redirect(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>) {
    let response = app.clone().oneshot(request).await.expect("request");
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    (response.status(), location)
}
