pub mod dedup;
pub mod extractor;
pub mod fetcher;
pub mod sync;

pub use dedup::{DuplicateTracker, Reservation};
pub use extractor::extract;
pub use fetcher::{InvoiceSource, ProcessFetcher};
pub use sync::{Imported, SyncService};
