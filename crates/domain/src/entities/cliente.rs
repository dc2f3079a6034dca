//! 客户

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{contains_ignore_case, optional_eq, Entity};
use crate::value_objects::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cliente {
    pub id: EntityId,
    pub nome: String,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub ativo: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct ClienteChanges {
    #[validate(length(min = 1, max = 150))]
    pub nome: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub telefone: Option<String>,
    pub ativo: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClienteFilter {
    pub nome: Option<String>,
    pub email: Option<String>,
    pub ativo: Option<bool>,
}

impl Entity for Cliente {
    type Changes = ClienteChanges;
    type Filter = ClienteFilter;

    const RESOURCE: &'static str = "cliente";

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, changes: ClienteChanges) {
        self.nome = changes.nome;
        self.email = changes.email;
        self.telefone = changes.telefone;
        self.ativo = changes.ativo;
    }

    fn matches(&self, filter: &ClienteFilter) -> bool {
        let email_matches = match &filter.email {
            Some(email) => self
                .email
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(email)),
            None => true,
        };

        filter
            .nome
            .as_deref()
            .is_none_or(|nome| contains_ignore_case(&self.nome, nome))
            && email_matches
            && optional_eq(&self.ativo, &filter.ativo)
    }
}
