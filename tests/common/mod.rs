#![allow(dead_code)]

use async_trait::async_trait;
use nfe_sheets_sync::config::TimeoutConfig;
use nfe_sheets_sync::models::{CellValue, Grid, Row};
use nfe_sheets_sync::{InvoiceSource, Result, SheetStore, SyncError, SyncService};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PRIMARY: &str = "NOTA FISCAL";

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Append(String, Vec<Row>),
    Read(String),
    Update(String, String, String),
    Clear(String, String),
}

/// In-memory sheet store that records every call
#[derive(Default)]
pub struct FakeStore {
    pub calls: Mutex<Vec<StoreCall>>,
    pub sheets: Mutex<HashMap<String, Grid>>,
    pub fail_with: Mutex<Option<String>>,
    pub delay: Mutex<Option<Duration>>,
    pub hold_after_append: Mutex<Option<Duration>>,
}

impl FakeStore {
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail(&self, cause: &str) {
        *self.fail_with.lock().unwrap() = Some(cause.to_string());
    }

    pub fn recover(&self) {
        *self.fail_with.lock().unwrap() = None;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Rows land in the sheet at once, but `append` returns only after `hold`
    pub fn set_hold_after_append(&self, hold: Duration) {
        *self.hold_after_append.lock().unwrap() = Some(hold);
    }

    pub fn rows(&self, sheet: &str) -> Grid {
        self.sheets.lock().unwrap().get(sheet).cloned().unwrap_or_default()
    }

    async fn enter(&self, call: StoreCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.fail_with.lock().unwrap().clone() {
            Some(cause) => Err(SyncError::StoreUnavailable(cause)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SheetStore for FakeStore {
    async fn append(&self, sheet_name: &str, rows: &[Row]) -> Result<()> {
        self.enter(StoreCall::Append(sheet_name.to_string(), rows.to_vec()))
            .await?;
        self.sheets
            .lock()
            .unwrap()
            .entry(sheet_name.to_string())
            .or_default()
            .extend(rows.iter().cloned());
        let hold = *self.hold_after_append.lock().unwrap();
        if let Some(hold) = hold {
            tokio::time::sleep(hold).await;
        }
        Ok(())
    }

    async fn read(&self, sheet_name: &str) -> Result<Grid> {
        self.enter(StoreCall::Read(sheet_name.to_string())).await?;
        Ok(self.rows(sheet_name))
    }

    async fn update(&self, sheet_name: &str, range: &str, value: &str) -> Result<()> {
        self.enter(StoreCall::Update(
            sheet_name.to_string(),
            range.to_string(),
            value.to_string(),
        ))
        .await
    }

    async fn clear(&self, sheet_name: &str, range: &str) -> Result<()> {
        self.enter(StoreCall::Clear(sheet_name.to_string(), range.to_string()))
            .await?;
        // Header row survives, as with an "A2:Z" range
        if let Some(grid) = self.sheets.lock().unwrap().get_mut(sheet_name) {
            grid.truncate(1);
        }
        Ok(())
    }
}

/// Invoice source backed by a map of canned documents
#[derive(Default)]
pub struct FakeSource {
    pub documents: Mutex<HashMap<String, Vec<u8>>>,
    pub failing: Mutex<HashMap<String, String>>,
    pub requests: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_document(self, key: &str, xml: String) -> Self {
        self.with_bytes(key, xml.into_bytes())
    }

    pub fn with_bytes(self, key: &str, bytes: Vec<u8>) -> Self {
        self.documents.lock().unwrap().insert(key.to_string(), bytes);
        self
    }

    pub fn with_failure(self, key: &str, output: &str) -> Self {
        self.failing
            .lock()
            .unwrap()
            .insert(key.to_string(), output.to_string());
        self
    }
}

#[async_trait]
impl InvoiceSource for FakeSource {
    async fn fetch_by_key(&self, access_key: &str) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(access_key.to_string());
        if let Some(output) = self.failing.lock().unwrap().get(access_key) {
            return Err(SyncError::LookupProcessFailed {
                reason: "exit status: 1".to_string(),
                output: output.clone(),
            });
        }
        self.documents
            .lock()
            .unwrap()
            .get(access_key)
            .cloned()
            .ok_or_else(|| SyncError::ResultNotFound(access_key.to_string()))
    }
}

pub fn service(store: Arc<FakeStore>, source: Arc<FakeSource>) -> SyncService {
    SyncService::new(store, source, PRIMARY, TimeoutConfig::default())
}

pub fn service_with_timeouts(
    store: Arc<FakeStore>,
    source: Arc<FakeSource>,
    timeouts: TimeoutConfig,
) -> SyncService {
    SyncService::new(store, source, PRIMARY, timeouts)
}

/// Minimal `nfeProc` document; items are (description, barcode, quantity)
pub fn nfe_xml(id: &str, items: &[(&str, &str, &str)]) -> String {
    let dets: String = items
        .iter()
        .enumerate()
        .map(|(i, (desc, ean, qty))| {
            format!(
                r#"<det nItem="{n}"><prod><cProd>{n:03}</cProd><cEAN>{ean}</cEAN><xProd>{desc}</xProd><qCom>{qty}</qCom></prod></det>"#,
                n = i + 1
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><nfeProc xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00"><NFe><infNFe Id="{id}" versao="4.00">{dets}</infNFe></NFe></nfeProc>"#
    )
}

pub fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}
