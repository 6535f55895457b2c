//! Core Data Models
//!
//! This module defines the record types shared by every stage of the
//! analytics pipeline.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: [`RawInvoiceRow`] - One column-keyed row from an invoice CSV
//! 2. **Normalization**: [`InvoiceLine`] - The canonical record every stage operates on
//! 3. **Annotation**: rolling statistics and spike flags are attached in place
//!    as optional fields on [`InvoiceLine`]
//!
//! Stage-specific aggregate types (budget variance, concentration, forecast,
//! product and brand rollups) live next to the stage that produces them.
//!
//! ## Serialization
//!
//! All output types serialize with camelCase field names so JSON output
//! matches the field names the reporting layer expects. Annotation fields
//! are skipped while unset, so a freshly normalized record serializes
//! without analytics columns.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of an invoice CSV, keyed by the source column headers.
///
/// Every field is kept as raw text; numeric coercion and date parsing are
/// the normalizer's job. Missing columns deserialize as empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawInvoiceRow {
    #[serde(rename = "Invoice Date", default)]
    pub invoice_date: String,
    #[serde(rename = "Invoice Number", default)]
    pub invoice_number: String,
    #[serde(rename = "Product Class Description", default)]
    pub product_class: String,
    #[serde(rename = "Category/Class", default)]
    pub category_class: String,
    #[serde(rename = "Product Description", default)]
    pub product_description: String,
    #[serde(rename = "Brand", default)]
    pub brand: String,
    #[serde(rename = "Manufacturer Name", default)]
    pub vendor: String,
    #[serde(rename = "Unit Price", default)]
    pub unit_price: String,
    #[serde(rename = "Ext. Price", default)]
    pub ext_price: String,
    #[serde(rename = "Qty Shipped", default)]
    pub qty: String,
    #[serde(rename = "Qty Ordered", default)]
    pub qty_ordered: String,
    #[serde(rename = "Pack Size", default)]
    pub pack_size: String,
}

/// Direction of a detected price spike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpikeDirection {
    Up,
    Down,
}

/// The canonical normalized invoice line.
///
/// Invariant: `unit_price` equals the source unit price when that was
/// present and positive, otherwise `ext_price / qty` when `qty > 0`,
/// otherwise `0`. The normalizer establishes this before any statistic
/// is computed.
///
/// The trailing `Option` fields are attached by the rolling statistics
/// engine and the spike detector; they stay `None` on records that have
/// not been through those stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    #[serde(rename = "invoiceDate")]
    pub invoice_date: NaiveDate,
    #[serde(rename = "invoiceNumber")]
    pub invoice_number: String,
    pub category: String,
    #[serde(rename = "productDescription")]
    pub product_description: String,
    pub brand: Option<String>,
    pub vendor: Option<String>,
    #[serde(rename = "unitPrice")]
    pub unit_price: f64,
    #[serde(rename = "extPrice")]
    pub ext_price: f64,
    pub qty: f64,
    #[serde(rename = "qtyOrdered")]
    pub qty_ordered: f64,
    #[serde(rename = "packSize")]
    pub pack_size: Option<String>,

    #[serde(rename = "rollingMean", skip_serializing_if = "Option::is_none")]
    pub rolling_mean: Option<f64>,
    #[serde(rename = "rollingStdDev", skip_serializing_if = "Option::is_none")]
    pub rolling_std_dev: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility: Option<f64>,
    #[serde(rename = "zScore", skip_serializing_if = "Option::is_none")]
    pub z_score: Option<f64>,
    #[serde(rename = "isSpike", skip_serializing_if = "Option::is_none")]
    pub is_spike: Option<bool>,
    #[serde(rename = "spikeDirection", skip_serializing_if = "Option::is_none")]
    pub spike_direction: Option<SpikeDirection>,
}

impl InvoiceLine {
    /// Brand label used by brand rollups; absent brands group as "Generic".
    pub fn brand_label(&self) -> &str {
        self.brand.as_deref().unwrap_or("Generic")
    }

    /// Vendor label used by concentration analysis; absent vendors group
    /// as "Unknown".
    pub fn vendor_label(&self) -> &str {
        self.vendor.as_deref().unwrap_or("Unknown")
    }

    /// Z-score with the unset case defaulting to 0, which keeps records
    /// with no rolling window out of spike detection.
    pub fn z_score_or_zero(&self) -> f64 {
        self.z_score.unwrap_or(0.0)
    }

    /// Whether the spike detector flagged this record. Unannotated
    /// records report `false`.
    pub fn spike_flag(&self) -> bool {
        self.is_spike.unwrap_or(false)
    }

    /// Month bucket key in `YYYY-MM` form.
    pub fn month_key(&self) -> String {
        self.invoice_date.format("%Y-%m").to_string()
    }
}

/// Pipeline input: either raw CSV rows awaiting normalization or records
/// that were already normalized (e.g. the annotated output of a previous
/// run being re-filtered). The tag replaces runtime shape sniffing.
#[derive(Debug, Clone)]
pub enum RecordSet {
    Raw(Vec<RawInvoiceRow>),
    Normalized(Vec<InvoiceLine>),
}

impl RecordSet {
    pub fn len(&self) -> usize {
        match self {
            RecordSet::Raw(rows) => rows.len(),
            RecordSet::Normalized(lines) => lines.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<RawInvoiceRow>> for RecordSet {
    fn from(rows: Vec<RawInvoiceRow>) -> Self {
        RecordSet::Raw(rows)
    }
}

impl From<Vec<InvoiceLine>> for RecordSet {
    fn from(lines: Vec<InvoiceLine>) -> Self {
        RecordSet::Normalized(lines)
    }
}

/// Inclusive date span of a record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}
