//! Wire shapes of the portal backend. Field names follow the server.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use portal_core::model::{
    Department, DepartmentId, Enrollment, EnrollmentStatus, Module, ModuleDraft, ModuleId,
    ModuleProgressRecord, ProgressSnapshot, Training, TrainingId, UserAccount, UserDraft, UserId,
    UserTrainingReport,
};

use super::TrainingWrite;

/// A list response, paginated or not.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListEnvelope<T> {
    Paged { results: Vec<T> },
    Bare(Vec<T>),
}

impl<T> ListEnvelope<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Paged { results } => results,
            Self::Bare(items) => items,
        }
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct DepartmentDto {
    id: DepartmentId,
    nome: String,
    #[serde(default)]
    treinamentos: Vec<TrainingDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrainingDto {
    id: TrainingId,
    #[serde(default)]
    codigo: Option<String>,
    nome: String,
    #[serde(default)]
    responsavel: Option<String>,
    #[serde(default)]
    ultima_atualizacao: Option<NaiveDate>,
    departamento: DepartmentId,
    #[serde(default)]
    modulos: Vec<ModuleDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModuleDto {
    id: ModuleId,
    titulo: String,
    #[serde(default)]
    descricao: Option<String>,
    #[serde(default)]
    video_iframe: Option<String>,
    treinamento: TrainingId,
}

impl From<ModuleDto> for Module {
    fn from(dto: ModuleDto) -> Self {
        Module::new(
            dto.id,
            dto.treinamento,
            dto.titulo,
            dto.descricao.unwrap_or_default(),
            dto.video_iframe.unwrap_or_default(),
        )
    }
}

impl From<TrainingDto> for Training {
    fn from(dto: TrainingDto) -> Self {
        Training::from_server(
            dto.id,
            dto.codigo.unwrap_or_default(),
            dto.nome,
            dto.responsavel.unwrap_or_default(),
            dto.ultima_atualizacao,
            dto.departamento,
            dto.modulos.into_iter().map(Module::from).collect(),
        )
    }
}

impl From<DepartmentDto> for Department {
    fn from(dto: DepartmentDto) -> Self {
        Department::new(
            dto.id,
            dto.nome,
            dto.treinamentos.into_iter().map(Training::from).collect(),
        )
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DepartmentWriteDto<'a> {
    pub nome: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TrainingWriteDto<'a> {
    codigo: &'a str,
    nome: &'a str,
    responsavel: &'a str,
    ultima_atualizacao: Option<NaiveDate>,
    departamento: DepartmentId,
}

impl<'a> From<&'a TrainingWrite> for TrainingWriteDto<'a> {
    fn from(training: &'a TrainingWrite) -> Self {
        Self {
            codigo: &training.code,
            nome: &training.name,
            responsavel: &training.owner,
            ultima_atualizacao: training.last_updated,
            departamento: training.department_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ModuleWriteDto<'a> {
    titulo: &'a str,
    descricao: &'a str,
    video_iframe: &'a str,
    treinamento: TrainingId,
}

impl<'a> ModuleWriteDto<'a> {
    pub(crate) fn new(training_id: TrainingId, module: &'a ModuleDraft) -> Self {
        Self {
            titulo: &module.title,
            descricao: &module.description,
            video_iframe: &module.video_embed_url,
            treinamento: training_id,
        }
    }
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressDto {
    #[serde(default)]
    matriculas: Vec<EnrollmentDto>,
    #[serde(default)]
    modulos: Vec<ModuleProgressDto>,
}

#[derive(Debug, Deserialize)]
struct EnrollmentDto {
    treinamento_id: TrainingId,
    status: EnrollmentStatus,
    #[serde(default)]
    percentual_conclusao: u8,
    #[serde(default)]
    iniciado_em: Option<DateTime<Utc>>,
    #[serde(default)]
    concluido_em: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ModuleProgressDto {
    modulo_id: ModuleId,
    concluido: bool,
}

impl From<ProgressDto> for ProgressSnapshot {
    fn from(dto: ProgressDto) -> Self {
        ProgressSnapshot {
            enrollments: dto
                .matriculas
                .into_iter()
                .map(|m| Enrollment {
                    training_id: m.treinamento_id,
                    status: m.status,
                    started_at: m.iniciado_em,
                    completed_at: m.concluido_em,
                    percent_complete: m.percentual_conclusao.min(100),
                })
                .collect(),
            modules: dto
                .modulos
                .into_iter()
                .map(|m| ModuleProgressRecord::new(m.modulo_id, m.concluido))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StartTrainingRequest {
    pub treinamento_id: TrainingId,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompleteModuleRequest {
    pub modulo_id: ModuleId,
    pub concluido: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct EmailLoginRequest<'a> {
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<&'a str>,
}

//
// ─── AUTH ──────────────────────────────────────────────────────────────────────
//

#[derive(Serialize)]
pub(crate) struct TokenRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub access: String,
}

//
// ─── USERS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct UserDto {
    id: UserId,
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    is_staff: bool,
    #[serde(default = "default_true")]
    is_active: bool,
}

fn default_true() -> bool {
    true
}

impl From<UserDto> for UserAccount {
    fn from(dto: UserDto) -> Self {
        UserAccount {
            id: dto.id,
            username: dto.username,
            email: dto.email,
            first_name: dto.first_name,
            last_name: dto.last_name,
            is_staff: dto.is_staff,
            is_active: dto.is_active,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct UserWriteDto<'a> {
    username: &'a str,
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    is_staff: bool,
    is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

impl<'a> UserWriteDto<'a> {
    pub(crate) fn new(user: &'a UserDraft, password: Option<&'a str>) -> Self {
        Self {
            username: user.username(),
            email: &user.email,
            first_name: &user.first_name,
            last_name: &user.last_name,
            is_staff: user.is_staff,
            is_active: user.is_active,
            password,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserTrainingDto {
    id: TrainingId,
    nome: String,
    #[serde(default)]
    iniciado_em: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    concluido_em: Option<DateTime<FixedOffset>>,
    status: EnrollmentStatus,
}

impl From<UserTrainingDto> for UserTrainingReport {
    fn from(dto: UserTrainingDto) -> Self {
        UserTrainingReport {
            training_id: dto.id,
            name: dto.nome,
            started_at: dto.iniciado_em,
            completed_at: dto.concluido_em,
            status: dto.status,
        }
    }
}
