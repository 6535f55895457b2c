//! Budget Variance Calculator
//!
//! Compares actual per-category spend to a projected baseline: the average
//! of the category's last three observed months, extrapolated over every
//! month present in the data. The trailing sum always divides by 3, even
//! when fewer months exist, so sparse categories project low. That is the
//! established business rule, not an accident; keep it when touching this
//! module.

use crate::models::InvoiceLine;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Actual-vs-projected spend for one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetVariance {
    pub actual: f64,
    pub projected: f64,
    pub variance: f64,
    #[serde(rename = "variancePercent")]
    pub variance_percent: f64,
}

/// Compute budget variance per category over the record set.
///
/// Categories appear in first-seen order. The map is empty for an empty
/// record set.
pub fn budget_variance(records: &[InvoiceLine]) -> IndexMap<String, BudgetVariance> {
    let mut actual_by_category: IndexMap<String, f64> = IndexMap::new();
    // month key -> category -> spend; BTreeMap keeps months sorted.
    let mut monthly: BTreeMap<String, HashMap<String, f64>> = BTreeMap::new();

    for line in records {
        *actual_by_category.entry(line.category.clone()).or_insert(0.0) += line.ext_price;
        *monthly
            .entry(line.month_key())
            .or_default()
            .entry(line.category.clone())
            .or_insert(0.0) += line.ext_price;
    }

    let months: Vec<&String> = monthly.keys().collect();
    let month_count = months.len();
    let last_three = &months[month_count.saturating_sub(3)..];

    actual_by_category
        .into_iter()
        .map(|(category, actual)| {
            let trailing_sum: f64 = last_three
                .iter()
                .map(|month| {
                    monthly
                        .get(*month)
                        .and_then(|by_cat| by_cat.get(&category))
                        .copied()
                        .unwrap_or(0.0)
                })
                .sum();
            // Divide by 3 unconditionally: missing months count as zero.
            let avg_monthly = trailing_sum / 3.0;
            let projected = avg_monthly * month_count as f64;
            let variance = actual - projected;
            let variance_percent = if projected > 0.0 {
                variance / projected * 100.0
            } else {
                0.0
            };
            (
                category,
                BudgetVariance {
                    actual,
                    projected,
                    variance,
                    variance_percent,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn line(date: (i32, u32, u32), category: &str, ext_price: f64) -> InvoiceLine {
        InvoiceLine {
            invoice_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            invoice_number: "INV-1".to_string(),
            category: category.to_string(),
            product_description: "WIDGET".to_string(),
            brand: None,
            vendor: None,
            unit_price: ext_price,
            ext_price,
            qty: 1.0,
            qty_ordered: 1.0,
            pack_size: None,
            rolling_mean: None,
            rolling_std_dev: None,
            volatility: None,
            z_score: None,
            is_spike: None,
            spike_direction: None,
        }
    }

    #[test]
    fn test_four_month_projection() {
        // Monthly spends 100, 100, 100, 400: projected is the average of
        // the last three months (200) times the four observed months.
        let records = vec![
            line((2024, 1, 10), "Meat", 100.0),
            line((2024, 2, 10), "Meat", 100.0),
            line((2024, 3, 10), "Meat", 100.0),
            line((2024, 4, 10), "Meat", 400.0),
        ];
        let variance = budget_variance(&records);
        let meat = &variance["Meat"];
        assert!((meat.actual - 700.0).abs() < 1e-9);
        assert!((meat.projected - 800.0).abs() < 1e-9);
        assert!((meat.variance - -100.0).abs() < 1e-9);
        assert!((meat.variance_percent - -12.5).abs() < 1e-9);
    }

    #[test]
    fn test_short_history_divides_by_three() {
        // A single observed month still divides the trailing sum by 3.
        let records = vec![line((2024, 1, 10), "Dairy", 300.0)];
        let variance = budget_variance(&records);
        let dairy = &variance["Dairy"];
        // avg = 300/3 = 100, projected = 100 * 1 month = 100.
        assert!((dairy.projected - 100.0).abs() < 1e-9);
        assert!((dairy.variance - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_projection_yields_zero_percent() {
        // Category active only in the earliest of many months: its last-3
        // average is zero, so the percent guard kicks in.
        let records = vec![
            line((2024, 1, 10), "Seafood", 500.0),
            line((2024, 2, 10), "Meat", 100.0),
            line((2024, 3, 10), "Meat", 100.0),
            line((2024, 4, 10), "Meat", 100.0),
            line((2024, 5, 10), "Meat", 100.0),
        ];
        let variance = budget_variance(&records);
        let seafood = &variance["Seafood"];
        assert_eq!(seafood.projected, 0.0);
        assert_eq!(seafood.variance_percent, 0.0);
        assert!((seafood.variance - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_records() {
        assert!(budget_variance(&[]).is_empty());
    }
}
