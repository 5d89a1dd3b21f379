use crate::error::{Result, SyncError};
use crate::models::{CellValue, ExtractedInvoice, InvoiceDocument, LineItem, NfeProc, Row};
use crate::service::DuplicateTracker;
use quick_xml::events::Event;
use quick_xml::Reader;

const ROOT_ELEMENT: &[u8] = b"nfeProc";
const KEY_PREFIX: &str = "NFe";
pub const HEADER_PREFIX: &str = "NF Chave: ";

/// Parses an `nfeProc` document into its key and line items.
pub fn parse_document(xml_content: &str) -> Result<InvoiceDocument> {
    check_root(xml_content)?;

    let proc: NfeProc = quick_xml::de::from_str(xml_content).map_err(|e| {
        tracing::warn!("XML unmarshal error: {}", e);
        SyncError::MalformedDocument(e.to_string())
    })?;

    let inf = proc.nfe.inf_nfe;
    let id = inf.id.trim();
    let key = id.strip_prefix(KEY_PREFIX).unwrap_or(id).to_string();
    if key.is_empty() {
        return Err(SyncError::MissingKey);
    }

    let items = inf
        .det
        .into_iter()
        .map(|det| LineItem {
            quantity: parse_quantity(&det.prod.q_com),
            item_number: det.n_item,
            product_code: det.prod.c_prod,
            description: det.prod.x_prod,
            barcode: det.prod.c_ean,
        })
        .collect();

    Ok(InvoiceDocument { key, items })
}

/// Converts an invoice into sheet rows, rejecting keys the tracker already holds.
///
/// Output is one header row followed by one detail row per item, in document order.
/// The tracker is only read here; recording happens after a successful append.
pub fn extract(xml_content: &str, tracker: &DuplicateTracker) -> Result<ExtractedInvoice> {
    let doc = parse_document(xml_content)?;

    if tracker.contains(&doc.key) {
        return Err(SyncError::DuplicateInvoice(doc.key));
    }

    let rows = to_rows(&doc);
    Ok(ExtractedInvoice { key: doc.key, rows })
}

pub fn to_rows(doc: &InvoiceDocument) -> Vec<Row> {
    let mut rows = Vec::with_capacity(doc.items.len() + 1);
    rows.push(header_row(&doc.key));
    rows.extend(doc.items.iter().map(detail_row));
    rows
}

pub fn header_row(key: &str) -> Row {
    vec![
        CellValue::Text(format!("{}{}", HEADER_PREFIX, key)),
        CellValue::Text(String::new()),
        CellValue::Text(String::new()),
        CellValue::Text(String::new()),
    ]
}

// [description, quantity, barcode, item number]
fn detail_row(item: &LineItem) -> Row {
    vec![
        CellValue::Text(item.description.clone()),
        CellValue::Number(item.quantity),
        CellValue::Text(item.barcode.clone()),
        CellValue::Text(item.item_number.clone()),
    ]
}

/// Parses a commercial quantity, accepting a decimal comma. Falls back to 0.0.
pub fn parse_quantity(raw: &str) -> f64 {
    let normalized = raw.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(q) if q.is_finite() => q,
        Ok(q) => {
            tracing::warn!("Quantity '{}' is not finite ({}), using 0", raw, q);
            0.0
        }
        Err(e) => {
            tracing::warn!("Failed to convert quantity '{}' to float, using 0: {}", raw, e);
            0.0
        }
    }
}

// Verifies the root element and that every element is closed before EOF.
fn check_root(xml_content: &str) -> Result<()> {
    let mut reader = Reader::from_str(xml_content);
    let mut depth = 0usize;
    let mut seen_root = false;
    loop {
        let event = reader
            .read_event()
            .map_err(|e| SyncError::MalformedDocument(e.to_string()))?;
        let opens = matches!(event, Event::Start(_));
        match event {
            Event::Start(e) | Event::Empty(e) if !seen_root => {
                let name = e.local_name();
                if name.as_ref() != ROOT_ELEMENT {
                    return Err(SyncError::MalformedDocument(format!(
                        "expected element <nfeProc> but found <{}>",
                        String::from_utf8_lossy(name.as_ref())
                    )));
                }
                seen_root = true;
                if opens {
                    depth += 1;
                }
            }
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }
    if !seen_root {
        return Err(SyncError::MalformedDocument("empty document".to_string()));
    }
    if depth > 0 {
        return Err(SyncError::MalformedDocument("unexpected end of document".to_string()));
    }
    Ok(())
}
