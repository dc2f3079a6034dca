//! 供应商

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{contains_ignore_case, Entity};
use crate::value_objects::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fornecedor {
    pub id: EntityId,
    pub nome: String,
    pub cnpj: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct FornecedorChanges {
    #[validate(length(min = 1, max = 150))]
    pub nome: String,
    #[validate(length(min = 14, max = 18))]
    pub cnpj: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub telefone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FornecedorFilter {
    pub nome: Option<String>,
    pub cnpj: Option<String>,
}

/// CNPJ 比较时忽略格式符号
fn cnpj_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

impl Entity for Fornecedor {
    type Changes = FornecedorChanges;
    type Filter = FornecedorFilter;

    const RESOURCE: &'static str = "fornecedor";

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, changes: FornecedorChanges) {
        self.nome = changes.nome;
        self.cnpj = changes.cnpj;
        self.email = changes.email;
        self.telefone = changes.telefone;
    }

    fn matches(&self, filter: &FornecedorFilter) -> bool {
        let cnpj_matches = match &filter.cnpj {
            Some(cnpj) => self
                .cnpj
                .as_deref()
                .is_some_and(|c| cnpj_digits(c) == cnpj_digits(cnpj)),
            None => true,
        };

        filter
            .nome
            .as_deref()
            .is_none_or(|nome| contains_ignore_case(&self.nome, nome))
            && cnpj_matches
    }
}
