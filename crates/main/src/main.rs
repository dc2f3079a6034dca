//! 主应用程序入口
//!
//! 加载配置、创建连接池并启动 Axum Web API 服务。

use std::sync::Arc;

use application::{HealthReporter, SystemClock};
use config::AppConfig;
use domain::{Caixa, Cliente, Fornecedor, Horario, Lancamento, Turma};
use infrastructure::Infrastructure;
use tracing_subscriber::EnvFilter;
use web_api::{router, AccessGate, AppState, Repositories};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        service = %config.service_name,
        database = %config.database.name,
        "configuration loaded"
    );

    let infrastructure = Infrastructure::connect(&config);

    let repositories = Repositories {
        caixa: infrastructure.repository::<Caixa>(),
        cliente: infrastructure.repository::<Cliente>(),
        fornecedor: infrastructure.repository::<Fornecedor>(),
        turma: infrastructure.repository::<Turma>(),
        lancamento: infrastructure.repository::<Lancamento>(),
        horario: infrastructure.repository::<Horario>(),
    };
    let health = Arc::new(HealthReporter::new(
        infrastructure.health_probe(),
        Arc::new(SystemClock),
        config.service_name.clone(),
        config.pool.query_timeout(),
    ));
    let gate = Arc::new(AccessGate::from_config(&config.auth, &config.permissions));

    let app = router(AppState::new(repositories, health, gate));
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!("后台管理服务启动在 http://{}", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    infrastructure.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
