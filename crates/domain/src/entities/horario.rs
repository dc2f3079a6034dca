//! 课表时段

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use super::{optional_eq, Entity};
use crate::value_objects::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Horario {
    pub id: EntityId,
    pub turma_id: EntityId,
    /// 0 = 周日 … 6 = 周六
    pub dia_semana: u8,
    pub hora_inicio: NaiveTime,
    pub hora_fim: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HorarioChanges {
    pub turma_id: EntityId,
    pub dia_semana: u8,
    pub hora_inicio: NaiveTime,
    pub hora_fim: NaiveTime,
}

impl Validate for HorarioChanges {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.dia_semana > 6 {
            errors.add("dia_semana", ValidationError::new("range"));
        }
        if self.hora_inicio >= self.hora_fim {
            errors.add("hora_fim", ValidationError::new("must_follow_hora_inicio"));
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HorarioFilter {
    pub turma_id: Option<EntityId>,
    pub dia_semana: Option<u8>,
}

impl Entity for Horario {
    type Changes = HorarioChanges;
    type Filter = HorarioFilter;

    const RESOURCE: &'static str = "horario";

    fn id(&self) -> EntityId {
        self.id
    }

    fn apply(&mut self, changes: HorarioChanges) {
        self.turma_id = changes.turma_id;
        self.dia_semana = changes.dia_semana;
        self.hora_inicio = changes.hora_inicio;
        self.hora_fim = changes.hora_fim;
    }

    fn matches(&self, filter: &HorarioFilter) -> bool {
        optional_eq(&self.turma_id, &filter.turma_id)
            && optional_eq(&self.dia_semana, &filter.dia_semana)
    }
}
