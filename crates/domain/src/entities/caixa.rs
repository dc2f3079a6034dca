//! 收银台（现金账户）

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{contains_ignore_case, optional_eq, Entity};
use crate::value_objects::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caixa {
    pub id: EntityId,
    pub nome: String,
    pub tipo: String,
    pub saldo: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct CaixaChanges {
    #[validate(length(min = 1, max = 100))]
    pub nome: String,
    #[validate(length(min = 1, max = 50))]
    pub tipo: String,
    pub saldo: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CaixaFilter {
    pub nome: Option<String>,
    pub tipo: Option<String>,
}

impl Entity for Caixa {
    type Changes = CaixaChanges;
    type Filter = CaixaFilter;

    const RESOURCE: &'static str = "caixa";

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, changes: CaixaChanges) {
        self.nome = changes.nome;
        self.tipo = changes.tipo;
        self.saldo = changes.saldo;
    }

    fn matches(&self, filter: &CaixaFilter) -> bool {
        filter
            .nome
            .as_deref()
            .is_none_or(|nome| contains_ignore_case(&self.nome, nome))
            && optional_eq(&self.tipo, &filter.tipo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caixa() -> Caixa {
        Caixa {
            id: EntityId::try_from(1u64).unwrap(),
            nome: "Caixa A".to_string(),
            tipo: "Tipo A".to_string(),
            saldo: 100.0,
        }
    }

    #[test]
    fn test_serializes_as_flat_row() {
        let json = serde_json::to_value(caixa()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 1, "nome": "Caixa A", "tipo": "Tipo A", "saldo": 100.0})
        );
    }

    #[test]
    fn test_filter_by_name_is_case_insensitive() {
        let filter = CaixaFilter {
            nome: Some("caixa".to_string()),
            tipo: None,
        };
        assert!(caixa().matches(&filter));

        let filter = CaixaFilter {
            nome: None,
            tipo: Some("Tipo B".to_string()),
        };
        assert!(!caixa().matches(&filter));
        assert!(caixa().matches(&CaixaFilter::default()));
    }

    #[test]
    fn test_changes_require_name() {
        let changes = CaixaChanges {
            nome: String::new(),
            tipo: "Tipo B".to_string(),
            saldo: 0.0,
        };
        assert!(changes.validate().is_err());
    }
}
