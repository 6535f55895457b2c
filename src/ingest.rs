//! Invoice CSV ingest.
//!
//! Reads column-keyed invoice exports into [`RawInvoiceRow`] values. Rows
//! the CSV reader cannot decode are skipped with a warning; everything
//! else degrades later, in the normalizer.

use crate::models::{InvoiceLine, RawInvoiceRow};
use crate::normalizer::RecordNormalizer;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// Read raw rows from an invoice CSV file.
pub fn read_invoice_csv(path: &Path) -> Result<Vec<RawInvoiceRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open invoice file: {}", path.display()))?;

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<RawInvoiceRow>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => {
                // Header row is line 1, so data row N sits on line N+1.
                warn!(line = index + 2, error = %e, "Skipping unreadable CSV row");
            }
        }
    }

    info!(rows = rows.len(), path = %path.display(), "Loaded invoice rows");
    Ok(rows)
}

/// Read and normalize in one step.
pub fn read_invoice_lines(path: &Path) -> Result<Vec<InvoiceLine>> {
    let rows = read_invoice_csv(path)?;
    Ok(RecordNormalizer::normalize_all(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    const HEADER: &str = "Invoice Date,Invoice Number,Product Class Description,Category/Class,Product Description,Brand,Manufacturer Name,Unit Price,Ext. Price,Qty Shipped,Qty Ordered,Pack Size";

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_read_and_normalize() {
        let file = write_csv(&format!(
            "{}\n2024-01-15,INV-1,Dairy,,MILK WHOLE GAL,FarmCo,ACME FOODS,4.25,25.50,6,6,6/1 GA",
            HEADER
        ));
        let lines = read_invoice_lines(file.path()).unwrap();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.category, "Dairy");
        assert_eq!(line.brand.as_deref(), Some("FarmCo"));
        assert!((line.unit_price - 4.25).abs() < 1e-9);
        assert!((line.ext_price - 25.50).abs() < 1e-9);
    }

    #[test]
    fn test_missing_columns_degrade() {
        // No unit price and no brand: the normalizer derives the price.
        let file = write_csv(&format!(
            "{}\n2024-01-15,INV-1,Dairy,,MILK,,ACME,,24.00,6,6,",
            HEADER
        ));
        let lines = read_invoice_lines(file.path()).unwrap();
        assert_eq!(lines.len(), 1);
        assert!((lines[0].unit_price - 4.0).abs() < 1e-9);
        assert_eq!(lines[0].brand, None);
        assert_eq!(lines[0].pack_size, None);
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(read_invoice_csv(Path::new("/nonexistent/invoices.csv")).is_err());
    }

    #[test]
    fn test_undateable_rows_dropped_during_normalize() {
        let file = write_csv(&format!(
            "{}\nnot-a-date,INV-1,Dairy,,MILK,,ACME,1,1,1,1,\n2024-01-15,INV-2,Dairy,,MILK,,ACME,1,1,1,1,",
            HEADER
        ));
        let lines = read_invoice_lines(file.path()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].invoice_number, "INV-2");
    }
}
