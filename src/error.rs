//! Error taxonomy shared by extraction, lookup, the sheet store and the sync flows.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("erro ao fazer unmarshal do XML. Verifique se o conteúdo é um XML NF-e válido: {0}")]
    MalformedDocument(String),

    #[error("chave da nota fiscal (Id) não encontrada no XML")]
    MissingKey,

    #[error("a nota fiscal com chave {0} já foi importada anteriormente")]
    DuplicateInvoice(String),

    #[error("chave de acesso inválida: '{0}'")]
    InvalidAccessKey(String),

    #[error("requisição inválida: {0}")]
    InvalidRequest(String),

    #[error("falha ao executar o programa de consulta: {reason}. Saída: {output}")]
    LookupProcessFailed { reason: String, output: String },

    #[error("o programa de consulta não gerou o arquivo XML para a chave {0}. Possível motivo: NFe não autorizada ou inexistente.")]
    ResultNotFound(String),

    #[error("erro ao comunicar com o Google Sheets: {0}")]
    StoreUnavailable(String),

    #[error("operação excedeu o tempo limite de {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Coarse classification used by the transport to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ClientInput,
    Duplicate,
    NotFound,
    Upstream,
    Timeout,
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::MalformedDocument(_)
            | SyncError::MissingKey
            | SyncError::InvalidAccessKey(_)
            | SyncError::InvalidRequest(_) => ErrorKind::ClientInput,
            SyncError::DuplicateInvoice(_) => ErrorKind::Duplicate,
            SyncError::ResultNotFound(_) => ErrorKind::NotFound,
            SyncError::LookupProcessFailed { .. } | SyncError::StoreUnavailable(_) => {
                ErrorKind::Upstream
            }
            SyncError::Timeout(_) => ErrorKind::Timeout,
        }
    }

    /// Whether the caller may reasonably retry the same request.
    pub fn retryable(&self) -> bool {
        matches!(self, SyncError::StoreUnavailable(_) | SyncError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
