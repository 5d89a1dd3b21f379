use crate::error::{ErrorKind, SyncError};
use crate::models::Grid;
use crate::service::SyncService;
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body: raw XML upload
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub xml_content: String,
    #[serde(default)]
    pub user_id: String,
}

/// Request body: import by access key
#[derive(Debug, Deserialize)]
pub struct ImportKeyRequest {
    #[serde(rename = "chaveAcesso")]
    pub access_key: String,
}

#[derive(Debug, Deserialize)]
pub struct SheetFetchRequest {
    pub sheet_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SheetUpdateRequest {
    pub sheet_name: String,
    /// Single cell, e.g. "A2"
    pub range: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct SheetClearRequest {
    pub sheet_name: String,
    /// e.g. "A2:Z", keeping the header row
    pub range: String,
}

/// Response body for imports and maintenance calls
#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SheetFetchResponse {
    pub data: Option<Grid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn status_for(err: &SyncError) -> StatusCode {
    match err.kind() {
        ErrorKind::ClientInput => StatusCode::BAD_REQUEST,
        ErrorKind::Duplicate => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn message(message: String) -> Response {
    (StatusCode::OK, Json(ImportResponse { message, error: None })).into_response()
}

fn failure(err: SyncError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    } else {
        tracing::warn!("Request rejected: {}", err);
    }
    let body = ImportResponse {
        message: String::new(),
        error: Some(err.to_string()),
    };
    (status, Json(body)).into_response()
}

fn decode<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, SyncError> {
    payload
        .map(|Json(req)| req)
        .map_err(|e| SyncError::InvalidRequest(e.body_text()))
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn import_xml(
    State(service): State<Arc<SyncService>>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> Response {
    let req = match decode(payload) {
        Ok(req) => req,
        Err(e) => return failure(e),
    };
    match service.ingest_content(&req.xml_content, &req.user_id).await {
        Ok(imported) => message(imported.message),
        Err(e) => failure(e),
    }
}

pub async fn import_by_key(
    State(service): State<Arc<SyncService>>,
    payload: Result<Json<ImportKeyRequest>, JsonRejection>,
) -> Response {
    let req = match decode(payload) {
        Ok(req) => req,
        Err(e) => return failure(e),
    };
    match service.ingest_by_key(req.access_key.trim()).await {
        Ok(imported) => message(imported.message),
        Err(e) => failure(e),
    }
}

pub async fn fetch_sheet_data(
    State(service): State<Arc<SyncService>>,
    payload: Result<Json<SheetFetchRequest>, JsonRejection>,
) -> Response {
    let result = match decode(payload) {
        Ok(req) => service.read_sheet(&req.sheet_name).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(grid) => (
            StatusCode::OK,
            Json(SheetFetchResponse {
                data: Some(grid),
                error: None,
            }),
        )
            .into_response(),
        Err(e) => {
            let status = status_for(&e);
            tracing::error!("Sheet fetch failed: {}", e);
            let body = SheetFetchResponse {
                data: None,
                error: Some(e.to_string()),
            };
            (status, Json(body)).into_response()
        }
    }
}

pub async fn update_sheet_data(
    State(service): State<Arc<SyncService>>,
    payload: Result<Json<SheetUpdateRequest>, JsonRejection>,
) -> Response {
    let req = match decode(payload) {
        Ok(req) => req,
        Err(e) => return failure(e),
    };
    match service
        .update_cell(&req.sheet_name, &req.range, &req.value)
        .await
    {
        Ok(msg) => message(msg),
        Err(e) => failure(e),
    }
}

pub async fn clear_sheet_data(
    State(service): State<Arc<SyncService>>,
    payload: Result<Json<SheetClearRequest>, JsonRejection>,
) -> Response {
    let req = match decode(payload) {
        Ok(req) => req,
        Err(e) => return failure(e),
    };
    match service.clear_sheet(&req.sheet_name, &req.range).await {
        Ok(msg) => message(msg),
        Err(e) => failure(e),
    }
}
