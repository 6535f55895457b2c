//! Brand-Level Aggregators
//!
//! Rolls invoice lines up by brand (missing brands group as "Generic")
//! and derives market share, price positioning, loyalty, switching
//! behavior, and growth trend.
//!
//! There is no customer dimension in invoice data, so "loyalty" here is
//! duplicate-purchase-day detection: the fraction of a brand's purchase
//! events that landed on a date the brand was already purchased on.
//! Switching counts come from each product's chronological brand sequence.

use crate::models::InvoiceLine;
use chrono::NaiveDate;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Observed unit price bounds for a brand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

/// One observed brand-to-brand transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchPattern {
    pub from_brand: String,
    pub to_brand: String,
    pub count: u32,
    pub percentage: f64,
}

/// Aggregated metrics for one brand.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandMetric {
    pub brand: String,
    pub products: IndexSet<String>,
    pub categories: IndexSet<String>,
    pub vendors: IndexSet<String>,
    pub product_count: usize,
    pub category_count: usize,
    pub vendor_count: usize,
    pub total_spend: f64,
    pub total_qty: f64,
    pub invoice_count: usize,
    pub avg_price: f64,
    pub price_range: PriceRange,
    pub price_spread: f64,
    pub market_share: f64,
    pub repeat_purchases: usize,
    pub loyalty_rate: f64,
    /// Brand's average category price over the all-brands category
    /// average, ×100 and averaged across the brand's categories. Under
    /// 100 means cheaper than the market.
    pub competitiveness_index: f64,
    pub switching_patterns: Vec<SwitchPattern>,
    pub switching_rate: f64,
    pub growth_trend: f64,
}

/// Aggregate per-brand metrics over the record set. Brands appear in
/// first-seen order.
pub fn analyze_brands(records: &[InvoiceLine]) -> IndexMap<String, BrandMetric> {
    struct Accum {
        products: IndexSet<String>,
        categories: IndexSet<String>,
        vendors: IndexSet<String>,
        total_spend: f64,
        total_qty: f64,
        invoice_count: usize,
        min_price: f64,
        max_price: f64,
        purchase_dates: Vec<NaiveDate>,
        category_prices: IndexMap<String, Vec<f64>>,
    }

    let total_spend: f64 = records.iter().map(|r| r.ext_price).sum();

    // All-brands category price sums, for the competitiveness index.
    let mut category_totals: HashMap<String, (f64, usize)> = HashMap::new();
    for line in records {
        let entry = category_totals.entry(line.category.clone()).or_insert((0.0, 0));
        entry.0 += line.unit_price;
        entry.1 += 1;
    }

    let mut accums: IndexMap<String, Accum> = IndexMap::new();
    // Per-product chronological brand sequence, for switching detection.
    let mut product_purchases: IndexMap<String, Vec<(String, NaiveDate)>> = IndexMap::new();

    for line in records {
        let brand = line.brand_label().to_string();
        let accum = accums.entry(brand.clone()).or_insert_with(|| Accum {
            products: IndexSet::new(),
            categories: IndexSet::new(),
            vendors: IndexSet::new(),
            total_spend: 0.0,
            total_qty: 0.0,
            invoice_count: 0,
            min_price: f64::INFINITY,
            max_price: f64::NEG_INFINITY,
            purchase_dates: Vec::new(),
            category_prices: IndexMap::new(),
        });

        accum.products.insert(line.product_description.clone());
        accum.categories.insert(line.category.clone());
        accum.vendors.insert(line.vendor_label().to_string());
        accum.total_spend += line.ext_price;
        accum.total_qty += line.qty;
        accum.invoice_count += 1;
        accum.purchase_dates.push(line.invoice_date);
        if line.unit_price < accum.min_price {
            accum.min_price = line.unit_price;
        }
        if line.unit_price > accum.max_price {
            accum.max_price = line.unit_price;
        }
        accum
            .category_prices
            .entry(line.category.clone())
            .or_default()
            .push(line.unit_price);

        product_purchases
            .entry(line.product_description.clone())
            .or_default()
            .push((brand, line.invoice_date));
    }

    // Adjacent brand changes within each product's date-ordered history.
    let mut switching: HashMap<(String, String), u32> = HashMap::new();
    for purchases in product_purchases.values_mut() {
        purchases.sort_by_key(|(_, date)| *date);
        for pair in purchases.windows(2) {
            let (ref from, _) = pair[0];
            let (ref to, _) = pair[1];
            if from != to {
                *switching.entry((from.clone(), to.clone())).or_insert(0) += 1;
            }
        }
    }

    accums
        .into_iter()
        .map(|(brand, accum)| {
            let avg_price = if accum.total_qty > 0.0 {
                accum.total_spend / accum.total_qty
            } else {
                0.0
            };
            let market_share = if total_spend > 0.0 {
                accum.total_spend / total_spend * 100.0
            } else {
                0.0
            };

            let unique_dates: IndexSet<&NaiveDate> = accum.purchase_dates.iter().collect();
            let repeat_purchases = accum.purchase_dates.len() - unique_dates.len();
            let loyalty_rate = if !accum.purchase_dates.is_empty() {
                repeat_purchases as f64 / accum.purchase_dates.len() as f64 * 100.0
            } else {
                0.0
            };

            let mut comp_score_sum = 0.0;
            let mut comp_categories = 0;
            for (category, prices) in &accum.category_prices {
                let brand_avg = prices.iter().sum::<f64>() / prices.len() as f64;
                let category_avg = category_totals
                    .get(category)
                    .map(|(sum, count)| sum / *count as f64)
                    .unwrap_or(0.0);
                if category_avg > 0.0 {
                    comp_score_sum += brand_avg / category_avg * 100.0;
                    comp_categories += 1;
                }
            }
            let competitiveness_index = if comp_categories > 0 {
                comp_score_sum / comp_categories as f64
            } else {
                100.0
            };

            let mut switching_patterns: Vec<SwitchPattern> = switching
                .iter()
                .filter(|((from, _), _)| *from == brand)
                .map(|((from, to), count)| SwitchPattern {
                    from_brand: from.clone(),
                    to_brand: to.clone(),
                    count: *count,
                    percentage: 0.0,
                })
                .collect();
            let total_switches: u32 = switching_patterns.iter().map(|p| p.count).sum();
            for pattern in &mut switching_patterns {
                pattern.percentage = if total_switches > 0 {
                    pattern.count as f64 / total_switches as f64 * 100.0
                } else {
                    0.0
                };
            }
            switching_patterns.sort_by(|a, b| b.count.cmp(&a.count));
            let switching_rate = if accum.invoice_count > 0 {
                total_switches as f64 / accum.invoice_count as f64 * 100.0
            } else {
                0.0
            };

            // First-half vs second-half purchase counts over the sorted
            // date list, midpoint at floor(n/2). Needs more than 3
            // purchases to say anything.
            let growth_trend = if accum.purchase_dates.len() > 3 {
                let mut sorted_dates = accum.purchase_dates.clone();
                sorted_dates.sort();
                let midpoint = sorted_dates.len() / 2;
                let first_half = midpoint as f64;
                let second_half = (sorted_dates.len() - midpoint) as f64;
                if first_half > 0.0 {
                    (second_half - first_half) / first_half * 100.0
                } else {
                    0.0
                }
            } else {
                0.0
            };

            let metric = BrandMetric {
                brand: brand.clone(),
                product_count: accum.products.len(),
                category_count: accum.categories.len(),
                vendor_count: accum.vendors.len(),
                products: accum.products,
                categories: accum.categories,
                vendors: accum.vendors,
                total_spend: accum.total_spend,
                total_qty: accum.total_qty,
                invoice_count: accum.invoice_count,
                avg_price,
                price_spread: accum.max_price - accum.min_price,
                price_range: PriceRange {
                    min: accum.min_price,
                    max: accum.max_price,
                },
                market_share,
                repeat_purchases,
                loyalty_rate,
                competitiveness_index,
                switching_patterns,
                switching_rate,
                growth_trend,
            };
            (brand, metric)
        })
        .collect()
}
