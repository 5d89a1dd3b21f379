pub mod cell;
pub mod invoice;
pub mod nfe;

pub use cell::{CellValue, Grid, Row};
pub use invoice::{ExtractedInvoice, InvoiceDocument, LineItem};
pub use nfe::{Det, InfNfe, Nfe, NfeProc, Prod};
