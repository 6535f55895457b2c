use anyhow::Result;
use chrono::NaiveDate;
use spendlens::models::{InvoiceLine, RawInvoiceRow};
use std::fs;
use std::path::Path;

pub const CSV_HEADER: &str = "Invoice Date,Invoice Number,Product Class Description,Category/Class,Product Description,Brand,Manufacturer Name,Unit Price,Ext. Price,Qty Shipped,Qty Ordered,Pack Size";

#[allow(dead_code)]
pub fn write_test_csv(dir: &Path, filename: &str, rows: &[&str]) -> Result<std::path::PathBuf> {
    let mut content = String::from(CSV_HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

#[allow(dead_code)]
pub fn raw_row(date: &str, category: &str, vendor: &str, price: f64, qty: f64) -> RawInvoiceRow {
    RawInvoiceRow {
        invoice_date: date.to_string(),
        invoice_number: format!("INV-{}-{}", vendor, date),
        product_class: category.to_string(),
        product_description: "WIDGET STANDARD PACK".to_string(),
        vendor: vendor.to_string(),
        unit_price: price.to_string(),
        qty: qty.to_string(),
        ext_price: (price * qty).to_string(),
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn invoice_line(
    date: (i32, u32, u32),
    category: &str,
    product: &str,
    price: f64,
    qty: f64,
) -> InvoiceLine {
    InvoiceLine {
        invoice_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        invoice_number: format!("INV-{}{}{}", date.0, date.1, date.2),
        category: category.to_string(),
        product_description: product.to_string(),
        brand: None,
        vendor: Some("ACME FOODS".to_string()),
        unit_price: price,
        ext_price: price * qty,
        qty,
        qty_ordered: qty,
        pack_size: None,
        rolling_mean: None,
        rolling_std_dev: None,
        volatility: None,
        z_score: None,
        is_spike: None,
        spike_direction: None,
    }
}
