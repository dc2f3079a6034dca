//! 各实体的表映射与行记录

use chrono::{NaiveDate, NaiveTime};
use domain::{
    Caixa, CaixaChanges, CaixaFilter, Cliente, ClienteChanges, ClienteFilter, EntityId,
    Fornecedor, FornecedorChanges, FornecedorFilter, Horario, HorarioChanges, HorarioFilter,
    Lancamento, LancamentoChanges, LancamentoFilter, LancamentoTipo, RepositoryError, Turma,
    TurmaChanges, TurmaFilter,
};
use sqlx::{FromRow, MySql, QueryBuilder};

use crate::repository::{invalid_id, like_pattern, SqlResource};

// 整数列一律以 `CAST(... AS SIGNED)` 读出并解码为 `i64`，
// 这样 INT、BIGINT 及其 UNSIGNED 变体都能解码，范围在转换时检查。

fn entity_id(raw: i64) -> Result<EntityId, RepositoryError> {
    EntityId::try_from(raw).map_err(invalid_id)
}

fn column_value<T: TryFrom<i64>>(column: &str, raw: i64) -> Result<T, RepositoryError> {
    T::try_from(raw).map_err(|_| {
        RepositoryError::invalid_data(format!("{} out of range: {}", column, raw))
    })
}

#[derive(Debug, FromRow)]
pub struct CaixaRecord {
    id: i64,
    nome: String,
    tipo: String,
    saldo: f64,
}

impl SqlResource for Caixa {
    type Record = CaixaRecord;

    const TABLE: &'static str = "caixas";
    const COLUMNS: &'static str = "CAST(id AS SIGNED) AS id, nome, tipo, CAST(saldo AS DOUBLE) AS saldo";

    fn from_record(record: CaixaRecord) -> Result<Self, RepositoryError> {
        Ok(Caixa {
            id: entity_id(record.id)?,
            nome: record.nome,
            tipo: record.tipo,
            saldo: record.saldo,
        })
    }

    fn push_assignments(qb: &mut QueryBuilder<'_, MySql>, changes: &CaixaChanges) {
        qb.push("nome = ")
            .push_bind(changes.nome.clone())
            .push(", tipo = ")
            .push_bind(changes.tipo.clone())
            .push(", saldo = ")
            .push_bind(changes.saldo);
    }

    fn push_filter(qb: &mut QueryBuilder<'_, MySql>, filter: &CaixaFilter) {
        if let Some(nome) = &filter.nome {
            qb.push(" AND nome LIKE ").push_bind(like_pattern(nome));
        }
        if let Some(tipo) = &filter.tipo {
            qb.push(" AND tipo = ").push_bind(tipo.clone());
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ClienteRecord {
    id: i64,
    nome: String,
    email: Option<String>,
    telefone: Option<String>,
    ativo: i64,
}

impl SqlResource for Cliente {
    type Record = ClienteRecord;

    const TABLE: &'static str = "clientes";
    const COLUMNS: &'static str = "CAST(id AS SIGNED) AS id, nome, email, telefone, CAST(ativo AS SIGNED) AS ativo";

    fn from_record(record: ClienteRecord) -> Result<Self, RepositoryError> {
        Ok(Cliente {
            id: entity_id(record.id)?,
            nome: record.nome,
            email: record.email,
            telefone: record.telefone,
            ativo: record.ativo != 0,
        })
    }

    fn push_assignments(qb: &mut QueryBuilder<'_, MySql>, changes: &ClienteChanges) {
        qb.push("nome = ")
            .push_bind(changes.nome.clone())
            .push(", email = ")
            .push_bind(changes.email.clone())
            .push(", telefone = ")
            .push_bind(changes.telefone.clone())
            .push(", ativo = ")
            .push_bind(changes.ativo);
    }

    fn push_filter(qb: &mut QueryBuilder<'_, MySql>, filter: &ClienteFilter) {
        if let Some(nome) = &filter.nome {
            qb.push(" AND nome LIKE ").push_bind(like_pattern(nome));
        }
        if let Some(email) = &filter.email {
            qb.push(" AND email = ").push_bind(email.clone());
        }
        if let Some(ativo) = filter.ativo {
            qb.push(" AND ativo = ").push_bind(ativo);
        }
    }
}

#[derive(Debug, FromRow)]
pub struct FornecedorRecord {
    id: i64,
    nome: String,
    cnpj: Option<String>,
    email: Option<String>,
    telefone: Option<String>,
}

impl SqlResource for Fornecedor {
    type Record = FornecedorRecord;

    const TABLE: &'static str = "fornecedores";
    const COLUMNS: &'static str = "CAST(id AS SIGNED) AS id, nome, cnpj, email, telefone";

    fn from_record(record: FornecedorRecord) -> Result<Self, RepositoryError> {
        Ok(Fornecedor {
            id: entity_id(record.id)?,
            nome: record.nome,
            cnpj: record.cnpj,
            email: record.email,
            telefone: record.telefone,
        })
    }

    fn push_assignments(qb: &mut QueryBuilder<'_, MySql>, changes: &FornecedorChanges) {
        qb.push("nome = ")
            .push_bind(changes.nome.clone())
            .push(", cnpj = ")
            .push_bind(changes.cnpj.clone())
            .push(", email = ")
            .push_bind(changes.email.clone())
            .push(", telefone = ")
            .push_bind(changes.telefone.clone());
    }

    fn push_filter(qb: &mut QueryBuilder<'_, MySql>, filter: &FornecedorFilter) {
        if let Some(nome) = &filter.nome {
            qb.push(" AND nome LIKE ").push_bind(like_pattern(nome));
        }
        if let Some(cnpj) = &filter.cnpj {
            let digits: String = cnpj.chars().filter(char::is_ascii_digit).collect();
            qb.push(" AND REGEXP_REPLACE(cnpj, '[^0-9]', '') = ")
                .push_bind(digits);
        }
    }
}

#[derive(Debug, FromRow)]
pub struct TurmaRecord {
    id: i64,
    nome: String,
    professor: Option<String>,
    vagas: i64,
}

impl SqlResource for Turma {
    type Record = TurmaRecord;

    const TABLE: &'static str = "turmas";
    const COLUMNS: &'static str = "CAST(id AS SIGNED) AS id, nome, professor, CAST(vagas AS SIGNED) AS vagas";

    fn from_record(record: TurmaRecord) -> Result<Self, RepositoryError> {
        Ok(Turma {
            id: entity_id(record.id)?,
            nome: record.nome,
            professor: record.professor,
            vagas: column_value("vagas", record.vagas)?,
        })
    }

    fn push_assignments(qb: &mut QueryBuilder<'_, MySql>, changes: &TurmaChanges) {
        qb.push("nome = ")
            .push_bind(changes.nome.clone())
            .push(", professor = ")
            .push_bind(changes.professor.clone())
            .push(", vagas = ")
            .push_bind(changes.vagas);
    }

    fn push_filter(qb: &mut QueryBuilder<'_, MySql>, filter: &TurmaFilter) {
        if let Some(nome) = &filter.nome {
            qb.push(" AND nome LIKE ").push_bind(like_pattern(nome));
        }
        if let Some(professor) = &filter.professor {
            qb.push(" AND professor LIKE ")
                .push_bind(like_pattern(professor));
        }
    }
}

#[derive(Debug, FromRow)]
pub struct LancamentoRecord {
    id: i64,
    descricao: String,
    valor: f64,
    tipo: String,
    data: NaiveDate,
    caixa_id: Option<i64>,
}

impl SqlResource for Lancamento {
    type Record = LancamentoRecord;

    const TABLE: &'static str = "lancamentos";
    const COLUMNS: &'static str =
        "CAST(id AS SIGNED) AS id, descricao, CAST(valor AS DOUBLE) AS valor, tipo, data, \
         CAST(caixa_id AS SIGNED) AS caixa_id";

    fn from_record(record: LancamentoRecord) -> Result<Self, RepositoryError> {
        let tipo: LancamentoTipo = record
            .tipo
            .parse()
            .map_err(|err: domain::DomainError| RepositoryError::invalid_data(err.to_string()))?;

        Ok(Lancamento {
            id: entity_id(record.id)?,
            descricao: record.descricao,
            valor: record.valor,
            tipo,
            data: record.data,
            caixa_id: record.caixa_id.map(entity_id).transpose()?,
        })
    }

    fn push_assignments(qb: &mut QueryBuilder<'_, MySql>, changes: &LancamentoChanges) {
        qb.push("descricao = ")
            .push_bind(changes.descricao.clone())
            .push(", valor = ")
            .push_bind(changes.valor)
            .push(", tipo = ")
            .push_bind(changes.tipo.as_str())
            .push(", data = ")
            .push_bind(changes.data)
            .push(", caixa_id = ")
            .push_bind(changes.caixa_id.map(EntityId::get));
    }

    fn push_filter(qb: &mut QueryBuilder<'_, MySql>, filter: &LancamentoFilter) {
        if let Some(caixa_id) = filter.caixa_id {
            qb.push(" AND caixa_id = ").push_bind(caixa_id.get());
        }
        if let Some(tipo) = filter.tipo {
            qb.push(" AND tipo = ").push_bind(tipo.as_str());
        }
        if let Some(inicio) = filter.data_inicio {
            qb.push(" AND data >= ").push_bind(inicio);
        }
        if let Some(fim) = filter.data_fim {
            qb.push(" AND data <= ").push_bind(fim);
        }
    }
}

#[derive(Debug, FromRow)]
pub struct HorarioRecord {
    id: i64,
    turma_id: i64,
    dia_semana: i64,
    hora_inicio: NaiveTime,
    hora_fim: NaiveTime,
}

impl SqlResource for Horario {
    type Record = HorarioRecord;

    const TABLE: &'static str = "horarios";
    const COLUMNS: &'static str = "CAST(id AS SIGNED) AS id, CAST(turma_id AS SIGNED) AS turma_id, \
         CAST(dia_semana AS SIGNED) AS dia_semana, hora_inicio, hora_fim";

    fn from_record(record: HorarioRecord) -> Result<Self, RepositoryError> {
        let dia_semana: u8 = column_value("dia_semana", record.dia_semana)?;
        if dia_semana > 6 {
            return Err(RepositoryError::invalid_data(format!(
                "dia_semana out of range: {}",
                dia_semana
            )));
        }

        Ok(Horario {
            id: entity_id(record.id)?,
            turma_id: entity_id(record.turma_id)?,
            dia_semana,
            hora_inicio: record.hora_inicio,
            hora_fim: record.hora_fim,
        })
    }

    fn push_assignments(qb: &mut QueryBuilder<'_, MySql>, changes: &HorarioChanges) {
        qb.push("turma_id = ")
            .push_bind(changes.turma_id.get())
            .push(", dia_semana = ")
            .push_bind(changes.dia_semana)
            .push(", hora_inicio = ")
            .push_bind(changes.hora_inicio)
            .push(", hora_fim = ")
            .push_bind(changes.hora_fim);
    }

    fn push_filter(qb: &mut QueryBuilder<'_, MySql>, filter: &HorarioFilter) {
        if let Some(turma_id) = filter.turma_id {
            qb.push(" AND turma_id = ").push_bind(turma_id.get());
        }
        if let Some(dia) = filter.dia_semana {
            qb.push(" AND dia_semana = ").push_bind(dia);
        }
    }
}
