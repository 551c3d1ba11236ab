//! User-visible status channel.
//!
//! A session carries exactly one status message; every action replaces it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    #[default]
    Neutral,
    Success,
    Error,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Neutral => "neutral",
            StatusKind::Success => "success",
            StatusKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct StatusMessage {
    #[schema(example = "PDF gerado e download iniciado.")]
    pub message: String,
    pub kind: StatusKind,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, StatusKind::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, StatusKind::Error)
    }

    /// Empty neutral status, shown after a form reset.
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }
}

pub mod messages {
    pub const REQUIRED_FIELDS: &str = "Preencha todos os campos obrigatórios.";
    pub const INVALID_IMAGE: &str = "Selecione um arquivo de imagem válido.";
    pub const IMAGE_PROCESSING_FAILED: &str = "Falha ao processar a imagem.";
    pub const SAVED: &str = "PDF gerado e download iniciado.";
    pub const SHARED: &str = "Compartilhado com sucesso.";
    pub const SHARE_CANCELLED: &str = "Compartilhamento cancelado.";
    pub const SHARE_FALLBACK: &str = "Navegador não suporta compartilhamento. Download iniciado.";
    pub const SUBMISSION_IN_FLIGHT: &str = "Já existe um envio em andamento.";
    pub const LOCATION_FAILED: &str = "Erro ao obter localização. Permita acesso à localização.";
    pub const LOCATION_FILLED: &str = "Endereço preenchido pela localização.";
}
