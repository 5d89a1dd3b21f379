pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod sheets;

pub use config::AppConfig;
pub use error::{ErrorKind, Result, SyncError};
pub use service::{DuplicateTracker, InvoiceSource, ProcessFetcher, SyncService};
pub use sheets::{GoogleSheetsClient, SheetStore};
