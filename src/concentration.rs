//! Supply Concentration Analyzer
//!
//! Measures how concentrated spend is across vendors: per-vendor share of
//! total spend, the Herfindahl-Hirschman Index over all vendors, and the
//! combined share of the top 5 and top 10. Order counts are distinct
//! invoice numbers, not line counts.

use crate::models::InvoiceLine;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Qualitative concentration tier derived from HHI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcentrationRisk {
    High,
    Moderate,
    Low,
}

impl fmt::Display for ConcentrationRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcentrationRisk::High => write!(f, "High"),
            ConcentrationRisk::Moderate => write!(f, "Moderate"),
            ConcentrationRisk::Low => write!(f, "Low"),
        }
    }
}

/// One vendor's slice of total spend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorShare {
    pub vendor: String,
    pub spend: f64,
    #[serde(rename = "orderCount")]
    pub order_count: usize,
    #[serde(rename = "sharePercent")]
    pub share_percent: f64,
}

/// Aggregate concentration view over the whole record set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyConcentration {
    /// All vendors, sorted by spend descending.
    pub vendors: Vec<VendorShare>,
    #[serde(rename = "totalVendors")]
    pub total_vendors: usize,
    pub hhi: f64,
    #[serde(rename = "top5Share")]
    pub top5_share: f64,
    #[serde(rename = "top10Share")]
    pub top10_share: f64,
    #[serde(rename = "concentrationRisk")]
    pub concentration_risk: ConcentrationRisk,
}

/// Analyze vendor spend concentration. Records without a vendor group
/// under "Unknown".
pub fn analyze_supply_concentration(records: &[InvoiceLine]) -> SupplyConcentration {
    let mut spend_by_vendor: IndexMap<String, (f64, IndexSet<String>)> = IndexMap::new();

    for line in records {
        let entry = spend_by_vendor
            .entry(line.vendor_label().to_string())
            .or_insert_with(|| (0.0, IndexSet::new()));
        entry.0 += line.ext_price;
        entry.1.insert(line.invoice_number.clone());
    }

    let total_spend: f64 = spend_by_vendor.values().map(|(spend, _)| spend).sum();

    let mut vendors: Vec<VendorShare> = spend_by_vendor
        .into_iter()
        .map(|(vendor, (spend, invoices))| VendorShare {
            vendor,
            spend,
            order_count: invoices.len(),
            share_percent: if total_spend > 0.0 {
                spend / total_spend * 100.0
            } else {
                0.0
            },
        })
        .collect();
    vendors.sort_by(|a, b| b.spend.partial_cmp(&a.spend).unwrap_or(Ordering::Equal));

    // HHI runs over every vendor, not just the head of the list.
    let hhi: f64 = vendors.iter().map(|v| v.share_percent.powi(2)).sum();
    let top5_share: f64 = vendors.iter().take(5).map(|v| v.share_percent).sum();
    let top10_share: f64 = vendors.iter().take(10).map(|v| v.share_percent).sum();

    let concentration_risk = if hhi > 2500.0 {
        ConcentrationRisk::High
    } else if hhi > 1500.0 {
        ConcentrationRisk::Moderate
    } else {
        ConcentrationRisk::Low
    };

    SupplyConcentration {
        total_vendors: vendors.len(),
        vendors,
        hhi,
        top5_share,
        top10_share,
        concentration_risk,
    }
}
