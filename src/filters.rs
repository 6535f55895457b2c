//! Record filtering for drill-down analysis.

use crate::models::InvoiceLine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Filter criteria applied before the statistics stages run. Unset fields
/// match everything.
///
/// `spikes_only` tests the spike annotation, which is only present on
/// records that already went through a full analytics pass; on freshly
/// normalized input it selects nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFilter {
    #[serde(rename = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "endDate")]
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub vendor: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<f64>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<f64>,
    #[serde(rename = "spikesOnly")]
    pub spikes_only: bool,
}

impl RecordFilter {
    pub fn matches(&self, line: &InvoiceLine) -> bool {
        if let Some(start) = self.start_date {
            if line.invoice_date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if line.invoice_date > end {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if line.category != *category {
                return false;
            }
        }
        if let Some(ref vendor) = self.vendor {
            if line.vendor.as_deref() != Some(vendor.as_str()) {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if line.unit_price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if line.unit_price > max {
                return false;
            }
        }
        if self.spikes_only && !line.spike_flag() {
            return false;
        }
        true
    }

    /// Keep only the matching records.
    pub fn apply(&self, lines: Vec<InvoiceLine>) -> Vec<InvoiceLine> {
        lines.into_iter().filter(|l| self.matches(l)).collect()
    }
}
