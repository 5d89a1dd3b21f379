use crate::config::TimeoutConfig;
use crate::error::{Result, SyncError};
use crate::models::Grid;
use crate::service::{extractor, DuplicateTracker, InvoiceSource};
use crate::sheets::SheetStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a successful ingestion
#[derive(Debug, Clone, PartialEq)]
pub struct Imported {
    pub key: String,
    pub rows: usize,
    pub message: String,
}

/// Ingestion and sheet maintenance flows.
///
/// Owns the duplicate tracker; the store and the invoice source are shared handles.
pub struct SyncService {
    store: Arc<dyn SheetStore>,
    source: Arc<dyn InvoiceSource>,
    tracker: DuplicateTracker,
    primary_sheet: String,
    timeouts: TimeoutConfig,
}

impl SyncService {
    pub fn new(
        store: Arc<dyn SheetStore>,
        source: Arc<dyn InvoiceSource>,
        primary_sheet: impl Into<String>,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            store,
            source,
            tracker: DuplicateTracker::new(),
            primary_sheet: primary_sheet.into(),
            timeouts,
        }
    }

    pub fn tracker(&self) -> &DuplicateTracker {
        &self.tracker
    }

    /// Extracts rows from `xml_content` and appends them to the primary sheet.
    pub async fn ingest_content(&self, xml_content: &str, user_id: &str) -> Result<Imported> {
        let mut imported = with_timeout(self.timeouts.ingest, self.import(xml_content)).await?;
        imported.message = format!("Nota Fiscal (Chave: {}) importada com sucesso!", imported.key);
        tracing::info!("Imported invoice {} for user {}", imported.key, user_id);
        Ok(imported)
    }

    /// Fetches the invoice through the lookup program, then ingests it.
    pub async fn ingest_by_key(&self, access_key: &str) -> Result<Imported> {
        let mut imported = with_timeout(self.timeouts.ingest, async {
            // 1. Fetch; any failure here stops before extraction
            let xml = self.source.fetch_by_key(access_key).await?;
            let content = std::str::from_utf8(&xml)
                .map_err(|e| SyncError::MalformedDocument(e.to_string()))?;

            // 2. Same path as a directly submitted document
            self.import(content).await
        })
        .await?;
        imported.message = format!(
            "Nota Fiscal (Chave: {}) baixada e importada com sucesso!",
            imported.key
        );
        tracing::info!("Imported invoice by access key: {}", imported.key);
        Ok(imported)
    }

    pub async fn read_sheet(&self, sheet_name: &str) -> Result<Grid> {
        with_timeout(self.timeouts.maintenance, self.store.read(sheet_name)).await
    }

    pub async fn update_cell(&self, sheet_name: &str, range: &str, value: &str) -> Result<String> {
        with_timeout(
            self.timeouts.maintenance,
            self.store.update(sheet_name, range, value),
        )
        .await?;
        Ok(format!("Célula {} atualizada com sucesso para '{}'.", range, value))
    }

    /// Clears `range` of `sheet_name`. Clearing the primary sheet also forgets
    /// every imported key, so those invoices can be imported again.
    pub async fn clear_sheet(&self, sheet_name: &str, range: &str) -> Result<String> {
        with_timeout(self.timeouts.maintenance, self.store.clear(sheet_name, range)).await?;

        if sheet_name == self.primary_sheet {
            let forgotten = self.tracker.len();
            self.tracker.reset();
            tracing::info!("Duplicate tracking reset ({} keys forgotten)", forgotten);
        }

        tracing::info!("Sheet '{}' (range: {}) cleared", sheet_name, range);
        Ok(format!("Dados da aba '{}' limpos com sucesso.", sheet_name))
    }

    async fn import(&self, xml_content: &str) -> Result<Imported> {
        // 1. Parse and reject keys already synchronized
        let extracted = extractor::extract(xml_content, &self.tracker)?;

        // 2. Reserve the key so a concurrent request for it fails here
        let reservation = self
            .tracker
            .try_claim(&extracted.key)
            .ok_or_else(|| SyncError::DuplicateInvoice(extracted.key.clone()))?;

        // 3. Append; the reservation is released if this fails or is cancelled
        self.store
            .append(&self.primary_sheet, &extracted.rows)
            .await?;

        // 4. Record, unless the primary sheet was cleared meanwhile
        if !reservation.commit() {
            tracing::info!(
                "Sheet '{}' was cleared during import of {}; key not kept",
                self.primary_sheet,
                extracted.key
            );
        }

        Ok(Imported {
            rows: extracted.rows.len(),
            key: extracted.key,
            message: String::new(),
        })
    }
}

async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Operation timed out after {:?}", limit);
            Err(SyncError::Timeout(limit))
        }
    }
}
