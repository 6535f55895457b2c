//! Record Normalizer
//!
//! Maps raw column-keyed invoice rows into canonical [`InvoiceLine`]
//! records. Malformed rows never raise: numeric fields degrade to `0` and
//! string fields to empty values. The one exception is the invoice date:
//! a row whose date cannot be parsed is dropped (with a warning) rather
//! than being allowed to poison window comparisons and month bucketing
//! downstream.
//!
//! The unit price invariant established here holds for every record before
//! any statistic is computed:
//!
//! - source unit price, when present and `> 0`
//! - otherwise `ext_price / qty`, when `qty > 0`
//! - otherwise `0`

use crate::dates::DateParser;
use crate::models::{InvoiceLine, RawInvoiceRow};
use tracing::{debug, warn};

pub struct RecordNormalizer;

impl RecordNormalizer {
    /// Normalize one raw row. Returns `None` only when the invoice date is
    /// unparsable; every other defect degrades to a default value.
    pub fn normalize_row(row: &RawInvoiceRow) -> Option<InvoiceLine> {
        let invoice_date = match DateParser::parse(&row.invoice_date) {
            Ok(date) => date,
            Err(_) => {
                warn!(
                    invoice_number = %row.invoice_number,
                    raw_date = %row.invoice_date,
                    "Dropping row with unparsable invoice date"
                );
                return None;
            }
        };

        let qty = parse_numeric(&row.qty);
        let ext_price = parse_numeric(&row.ext_price);
        let source_unit = parse_numeric(&row.unit_price);

        let unit_price = if source_unit > 0.0 {
            source_unit
        } else if qty > 0.0 {
            ext_price / qty
        } else {
            0.0
        };

        // Prefer the product class column, fall back to the legacy
        // category column.
        let category_source = if !row.product_class.is_empty() {
            &row.product_class
        } else {
            &row.category_class
        };

        Some(InvoiceLine {
            invoice_date,
            invoice_number: row.invoice_number.clone(),
            category: category_source.trim().to_string(),
            product_description: row.product_description.clone(),
            brand: non_empty(&row.brand),
            vendor: non_empty(&row.vendor),
            unit_price,
            ext_price,
            qty,
            qty_ordered: parse_numeric(&row.qty_ordered),
            pack_size: non_empty(&row.pack_size),
            rolling_mean: None,
            rolling_std_dev: None,
            volatility: None,
            z_score: None,
            is_spike: None,
            spike_direction: None,
        })
    }

    /// Normalize a batch of rows, dropping the undateable ones.
    pub fn normalize_all(rows: &[RawInvoiceRow]) -> Vec<InvoiceLine> {
        let lines: Vec<InvoiceLine> = rows.iter().filter_map(Self::normalize_row).collect();
        let dropped = rows.len() - lines.len();
        if dropped > 0 {
            warn!(dropped, kept = lines.len(), "Dropped rows during normalization");
        } else {
            debug!(rows = lines.len(), "Normalized invoice rows");
        }
        lines
    }
}

fn parse_numeric(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(0.0)
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
