//! 班级

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{optional_contains, Entity};
use crate::value_objects::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turma {
    pub id: EntityId,
    pub nome: String,
    pub professor: Option<String>,
    pub vagas: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct TurmaChanges {
    #[validate(length(min = 1, max = 100))]
    pub nome: String,
    #[validate(length(max = 150))]
    pub professor: Option<String>,
    #[validate(range(max = 500))]
    pub vagas: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TurmaFilter {
    pub nome: Option<String>,
    pub professor: Option<String>,
}

impl Entity for Turma {
    type Changes = TurmaChanges;
    type Filter = TurmaFilter;

    const RESOURCE: &'static str = "turma";

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, changes: TurmaChanges) {
        self.nome = changes.nome;
        self.professor = changes.professor;
        self.vagas = changes.vagas;
    }

    fn matches(&self, filter: &TurmaFilter) -> bool {
        optional_contains(Some(&self.nome), &filter.nome)
            && optional_contains(self.professor.as_deref(), &filter.professor)
    }
}
