use std::sync::Arc;

use application::HealthReporter;
use domain::{Caixa, Cliente, EntityRepository, Fornecedor, Horario, Lancamento, Turma};

use crate::auth::AccessGate;

/// 各实体资源的仓储
#[derive(Clone)]
pub struct Repositories {
    pub caixa: Arc<dyn EntityRepository<Caixa>>,
    pub cliente: Arc<dyn EntityRepository<Cliente>>,
    pub fornecedor: Arc<dyn EntityRepository<Fornecedor>>,
    pub turma: Arc<dyn EntityRepository<Turma>>,
    pub lancamento: Arc<dyn EntityRepository<Lancamento>>,
    pub horario: Arc<dyn EntityRepository<Horario>>,
}

#[derive(Clone)]
pub struct AppState {
    pub repositories: Repositories,
    pub health: Arc<HealthReporter>,
    pub gate: Arc<AccessGate>,
}

impl AppState {
    pub fn new(
        repositories: Repositories,
        health: Arc<HealthReporter>,
        gate: Arc<AccessGate>,
    ) -> Self {
        Self {
            repositories,
            health,
            gate,
        }
    }
}
