//! 财务流水

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{optional_eq, Entity};
use crate::{errors::DomainError, value_objects::EntityId};

/// 流水方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LancamentoTipo {
    Receita,
    Despesa,
}

impl LancamentoTipo {
    pub fn as_str(&self) -> &'static str {
        match self {
            LancamentoTipo::Receita => "receita",
            LancamentoTipo::Despesa => "despesa",
        }
    }
}

impl fmt::Display for LancamentoTipo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LancamentoTipo {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "receita" => Ok(LancamentoTipo::Receita),
            "despesa" => Ok(LancamentoTipo::Despesa),
            other => Err(DomainError::validation_error(
                "tipo",
                format!("unknown entry type: {}", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lancamento {
    pub id: EntityId,
    pub descricao: String,
    pub valor: f64,
    pub tipo: LancamentoTipo,
    pub data: NaiveDate,
    pub caixa_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct LancamentoChanges {
    #[validate(length(min = 1, max = 255))]
    pub descricao: String,
    #[validate(range(exclusive_min = 0.0))]
    pub valor: f64,
    pub tipo: LancamentoTipo,
    pub data: NaiveDate,
    pub caixa_id: Option<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LancamentoFilter {
    pub caixa_id: Option<EntityId>,
    pub tipo: Option<LancamentoTipo>,
    /// 起始日期（含）
    pub data_inicio: Option<NaiveDate>,
    /// 结束日期（含）
    pub data_fim: Option<NaiveDate>,
}

impl Entity for Lancamento {
    type Changes = LancamentoChanges;
    type Filter = LancamentoFilter;

    const RESOURCE: &'static str = "lancamento";

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, changes: LancamentoChanges) {
        self.descricao = changes.descricao;
        self.valor = changes.valor;
        self.tipo = changes.tipo;
        self.data = changes.data;
        self.caixa_id = changes.caixa_id;
    }

    fn matches(&self, filter: &LancamentoFilter) -> bool {
        let caixa_matches = filter
            .caixa_id
            .is_none_or(|caixa| self.caixa_id == Some(caixa));

        caixa_matches
            && optional_eq(&self.tipo, &filter.tipo)
            && filter.data_inicio.is_none_or(|inicio| self.data >= inicio)
            && filter.data_fim.is_none_or(|fim| self.data <= fim)
    }
}
