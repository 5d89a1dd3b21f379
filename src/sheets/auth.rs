use crate::config::SheetsConfig;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Supplies bearer tokens for the Sheets API
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
}

/// Reads the service account key: credential file first, then `CREDENTIALS_BASE64`.
pub fn load_credentials(config: &SheetsConfig) -> Result<Vec<u8>> {
    tracing::info!("Trying credentials file: {:?}", config.credentials_file);
    if config.credentials_file.is_file() {
        let bytes = std::fs::read(&config.credentials_file).map_err(|e| {
            SyncError::StoreUnavailable(format!("erro ao ler credenciais do arquivo: {}", e))
        })?;
        tracing::info!("Credentials loaded from local file");
        return Ok(bytes);
    }

    if let Some(encoded) = config.credentials_base64.as_deref() {
        tracing::info!("Credentials loaded from environment (base64)");
        return decode_base64(encoded);
    }

    Err(SyncError::StoreUnavailable(
        "credenciais de acesso ao Google Sheets não encontradas. Verifique credentials.json ou a variável CREDENTIALS_BASE64".to_string(),
    ))
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    let trimmed = encoded.trim();
    URL_SAFE_NO_PAD
        .decode(trimmed.trim_end_matches('='))
        .or_else(|_| STANDARD.decode(trimmed))
        .map_err(|e| SyncError::StoreUnavailable(format!("erro ao decodificar Base64: {}", e)))
}

/// OAuth2 service account flow for the spreadsheets scope
pub struct ServiceAccountTokens {
    auth: yup_oauth2::authenticator::DefaultAuthenticator,
}

impl ServiceAccountTokens {
    pub async fn from_key_bytes(key: &[u8]) -> Result<Self> {
        let key = yup_oauth2::parse_service_account_key(key)
            .map_err(|e| SyncError::StoreUnavailable(format!("erro ao criar config JWT: {}", e)))?;
        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(|e| {
                SyncError::StoreUnavailable(format!("erro ao criar serviço Sheets: {}", e))
            })?;
        Ok(Self { auth })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokens {
    async fn bearer_token(&self) -> Result<String> {
        let token = self
            .auth
            .token(&[SPREADSHEETS_SCOPE])
            .await
            .map_err(|e| SyncError::StoreUnavailable(format!("falha ao obter token: {}", e)))?;
        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| SyncError::StoreUnavailable("token de acesso vazio".to_string()))
    }
}
