use crate::error::{Result, SyncError};
use crate::models::{Grid, Row};
use crate::sheets::{a1_range, SheetStore, TokenSource};
use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(Debug, Serialize)]
struct ValueRange<'a> {
    values: &'a [Row],
}

#[derive(Debug, Default, Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Grid,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Sheets v4 REST client for one spreadsheet.
///
/// Built without a token source, every operation fails with `StoreUnavailable`
/// before touching the network.
#[derive(Clone)]
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl GoogleSheetsClient {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        tokens: Option<Arc<dyn TokenSource>>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                SyncError::StoreUnavailable(format!("erro ao criar cliente HTTP: {}", e))
            })?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            tokens,
        })
    }

    /// Points the client at another API root (emulators, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    // .../v4/spreadsheets/{id}/values/{range}{suffix}, range encoded as one segment
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SyncError::StoreUnavailable(format!("URL base inválida: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SyncError::StoreUnavailable("URL base inválida".to_string()))?
            .pop_if_empty()
            .extend(&["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values"])
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let tokens = self.tokens.as_ref().ok_or_else(|| {
            SyncError::StoreUnavailable("serviço do Google Sheets não inicializado".to_string())
        })?;
        let token = tokens.bearer_token().await?;

        let mut request = self.http.request(method, url).bearer_auth(token).query(query);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::StoreUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let detail = match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(body) if !body.error.message.is_empty() => {
                format!("{} {}: {}", status.as_u16(), body.error.status, body.error.message)
            }
            _ => format!("{}: {}", status, text),
        };
        Err(SyncError::StoreUnavailable(detail))
    }
}

#[async_trait]
impl SheetStore for GoogleSheetsClient {
    async fn append(&self, sheet_name: &str, rows: &[Row]) -> Result<()> {
        let url = self.values_url(sheet_name, ":append")?;
        let body = serde_json::to_value(ValueRange { values: rows })
            .map_err(|e| SyncError::StoreUnavailable(e.to_string()))?;
        self.send(
            Method::POST,
            url,
            &[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ],
            Some(body),
        )
        .await
        .map_err(|e| {
            tracing::error!("Append to sheet '{}' failed: {}", sheet_name, e);
            e
        })?;
        tracing::debug!("Appended {} rows to '{}'", rows.len(), sheet_name);
        Ok(())
    }

    async fn read(&self, sheet_name: &str) -> Result<Grid> {
        let url = self.values_url(&a1_range(sheet_name, "A:Z"), "")?;
        let response = self.send(Method::GET, url, &[], None).await.map_err(|e| {
            tracing::error!("Read of sheet '{}' failed: {}", sheet_name, e);
            e
        })?;
        let body: ValueRangeResponse = response
            .json()
            .await
            .map_err(|e| SyncError::StoreUnavailable(format!("resposta inválida: {}", e)))?;
        Ok(body.values)
    }

    async fn update(&self, sheet_name: &str, range: &str, value: &str) -> Result<()> {
        let full_range = a1_range(sheet_name, range);
        let url = self.values_url(&full_range, "")?;
        self.send(
            Method::PUT,
            url,
            &[("valueInputOption", "USER_ENTERED")],
            Some(json!({ "values": [[value]] })),
        )
        .await
        .map_err(|e| {
            tracing::error!("Update of range {} failed: {}", full_range, e);
            e
        })?;
        Ok(())
    }

    async fn clear(&self, sheet_name: &str, range: &str) -> Result<()> {
        let full_range = a1_range(sheet_name, range);
        let url = self.values_url(&full_range, ":clear")?;
        self.send(Method::POST, url, &[], Some(json!({})))
            .await
            .map_err(|e| {
                tracing::error!("Clear of range {} failed: {}", full_range, e);
                SyncError::StoreUnavailable(format!(
                    "erro ao limpar dados no Sheets para o range {}: {}",
                    full_range,
                    match e {
                        SyncError::StoreUnavailable(cause) => cause,
                        other => other.to_string(),
                    }
                ))
            })?;
        Ok(())
    }
}
