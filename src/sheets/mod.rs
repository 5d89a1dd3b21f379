pub mod auth;
pub mod client;

pub use auth::{load_credentials, ServiceAccountTokens, TokenSource, SPREADSHEETS_SCOPE};
pub use client::GoogleSheetsClient;

use crate::error::Result;
use crate::models::{Grid, Row};
use async_trait::async_trait;

/// Remote tabular store addressed by sheet name and A1 range
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Inserts `rows` after the last row with data, never overwriting.
    async fn append(&self, sheet_name: &str, rows: &[Row]) -> Result<()>;

    /// Reads columns A:Z of `sheet_name`. An empty sheet yields an empty grid.
    async fn read(&self, sheet_name: &str) -> Result<Grid>;

    /// Writes one value to one cell, interpreted as if typed by a user.
    async fn update(&self, sheet_name: &str, range: &str, value: &str) -> Result<()>;

    /// Clears values in `range`, keeping rows, columns and formatting.
    async fn clear(&self, sheet_name: &str, range: &str) -> Result<()>;
}

/// `<sheet>!<range>`, or the bare sheet name when no range is given
pub fn a1_range(sheet_name: &str, range: &str) -> String {
    if range.is_empty() {
        sheet_name.to_string()
    } else {
        format!("{}!{}", sheet_name, range)
    }
}
