use serde::Serialize;

/// Parsed invoice: key plus its items in document order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceDocument {
    pub key: String,
    pub items: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub item_number: String,
    pub product_code: String,
    pub description: String,
    pub barcode: String,
    pub quantity: f64,
}

/// Extraction output handed to the store
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedInvoice {
    pub key: String,
    pub rows: Vec<crate::models::Row>,
}
