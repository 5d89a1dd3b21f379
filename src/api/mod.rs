pub mod handlers;

pub use handlers::*;

use crate::service::SyncService;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// All routes, sharing one sync service
pub fn router(service: Arc<SyncService>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/import-xml-data", post(handlers::import_xml))
        .route("/importar-xml-chave", post(handlers::import_by_key))
        .route("/fetch-sheet-data", post(handlers::fetch_sheet_data))
        .route("/update-sheet-data", post(handlers::update_sheet_data))
        .route("/clear-sheet-data", post(handlers::clear_sheet_data))
        .with_state(service)
}
