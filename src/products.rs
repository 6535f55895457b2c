//! Product-Level Aggregators
//!
//! Groups invoice lines by product description and derives lifetime
//! metrics, then layers the portfolio views on top:
//!
//! - **Performance**: spend, quantity, price history, detected price
//!   changes, ordering cadence, activity status
//! - **ABC**: Pareto classification by cumulative spend contribution
//! - **Pack size**: cost-per-unit comparison across pack configurations
//! - **Substitution**: cheaper alternatives among similar products
//! - **Seasonality**: monthly quantity patterns and peak months
//! - **Lifecycle**: New / Growing / Mature / Declining / At-Risk buckets
//!
//! Status and lifecycle classification depend on "days since" arithmetic,
//! so those functions take an explicit `as_of` date instead of reading the
//! wall clock.

use crate::models::InvoiceLine;
use chrono::{Datelike, NaiveDate};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Price-change detection floor: adjacent history points closer than this
/// are treated as the same price.
const PRICE_CHANGE_EPSILON: f64 = 0.01;

/// Activity status from days since the last order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
    Active,
    #[serde(rename = "Slow Moving")]
    SlowMoving,
    Inactive,
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductStatus::Active => write!(f, "Active"),
            ProductStatus::SlowMoving => write!(f, "Slow Moving"),
            ProductStatus::Inactive => write!(f, "Inactive"),
        }
    }
}

/// One purchase event in a product's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInvoice {
    pub date: NaiveDate,
    pub price: f64,
    pub qty: f64,
    pub ext_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// A detected change between adjacent points of the price history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChange {
    pub date: NaiveDate,
    pub old_price: f64,
    pub new_price: f64,
    pub change: f64,
    pub change_percent: f64,
}

/// Lifetime metrics for one product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMetric {
    pub description: String,
    pub category: String,
    pub brand: Option<String>,
    pub vendor: Option<String>,
    pub pack_size: Option<String>,
    pub invoices: Vec<ProductInvoice>,
    pub total_spend: f64,
    pub total_qty: f64,
    /// Spend-weighted price per unit (`total_spend / total_qty`), not the
    /// mean of observed unit prices.
    pub avg_price: f64,
    pub price_history: Vec<PricePoint>,
    pub price_volatility: f64,
    pub price_changes: Vec<PriceChange>,
    /// Distinct order dates, ascending.
    pub order_dates: Vec<NaiveDate>,
    pub order_count: usize,
    pub avg_days_between_orders: f64,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    pub product_age_days: i64,
    pub status: ProductStatus,
}

/// Group records by product description and derive per-product metrics.
/// Products appear in first-seen order.
pub fn analyze_product_performance(
    records: &[InvoiceLine],
    as_of: NaiveDate,
) -> IndexMap<String, ProductMetric> {
    struct Accum {
        category: String,
        brand: Option<String>,
        vendor: Option<String>,
        pack_size: Option<String>,
        invoices: Vec<ProductInvoice>,
        total_spend: f64,
        total_qty: f64,
        price_history: Vec<PricePoint>,
        order_dates: IndexSet<NaiveDate>,
        first_seen: NaiveDate,
        last_seen: NaiveDate,
    }

    let mut accums: IndexMap<String, Accum> = IndexMap::new();

    for line in records {
        let key = if line.product_description.is_empty() {
            "Unknown".to_string()
        } else {
            line.product_description.clone()
        };
        let accum = accums.entry(key).or_insert_with(|| Accum {
            category: line.category.clone(),
            brand: line.brand.clone(),
            vendor: line.vendor.clone(),
            pack_size: line.pack_size.clone(),
            invoices: Vec::new(),
            total_spend: 0.0,
            total_qty: 0.0,
            price_history: Vec::new(),
            order_dates: IndexSet::new(),
            first_seen: line.invoice_date,
            last_seen: line.invoice_date,
        });

        accum.invoices.push(ProductInvoice {
            date: line.invoice_date,
            price: line.unit_price,
            qty: line.qty,
            ext_price: line.ext_price,
        });
        accum.total_spend += line.ext_price;
        accum.total_qty += line.qty;
        accum.price_history.push(PricePoint {
            date: line.invoice_date,
            price: line.unit_price,
        });
        accum.order_dates.insert(line.invoice_date);
        if line.invoice_date < accum.first_seen {
            accum.first_seen = line.invoice_date;
        }
        if line.invoice_date > accum.last_seen {
            accum.last_seen = line.invoice_date;
        }
    }

    accums
        .into_iter()
        .map(|(description, accum)| {
            let avg_price = if accum.total_qty > 0.0 {
                accum.total_spend / accum.total_qty
            } else {
                0.0
            };

            let mut price_history = accum.price_history;
            price_history.sort_by_key(|p| p.date);
            let prices: Vec<f64> = price_history.iter().map(|p| p.price).collect();
            let price_volatility = coefficient_of_variation(&prices);

            let mut price_changes = Vec::new();
            for pair in price_history.windows(2) {
                let (prev, curr) = (&pair[0], &pair[1]);
                if (curr.price - prev.price).abs() > PRICE_CHANGE_EPSILON {
                    price_changes.push(PriceChange {
                        date: curr.date,
                        old_price: prev.price,
                        new_price: curr.price,
                        change: curr.price - prev.price,
                        change_percent: if prev.price > 0.0 {
                            (curr.price - prev.price) / prev.price * 100.0
                        } else {
                            0.0
                        },
                    });
                }
            }

            let mut order_dates: Vec<NaiveDate> = accum.order_dates.into_iter().collect();
            order_dates.sort();
            let avg_days_between_orders = average_gap_days(&order_dates);

            let days_since_last = (as_of - accum.last_seen).num_days();
            let status = if days_since_last > 60 {
                ProductStatus::Inactive
            } else if days_since_last > 30 {
                ProductStatus::SlowMoving
            } else {
                ProductStatus::Active
            };

            let metric = ProductMetric {
                description: description.clone(),
                category: accum.category,
                brand: accum.brand,
                vendor: accum.vendor,
                pack_size: accum.pack_size,
                invoices: accum.invoices,
                total_spend: accum.total_spend,
                total_qty: accum.total_qty,
                avg_price,
                price_history,
                price_volatility,
                price_changes,
                order_count: order_dates.len(),
                avg_days_between_orders,
                first_seen: accum.first_seen,
                last_seen: accum.last_seen,
                product_age_days: (accum.last_seen - accum.first_seen).num_days(),
                status,
                order_dates,
            };
            (description, metric)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ABC analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbcProduct {
    pub product: String,
    pub total_spend: f64,
    pub spend_percent: f64,
    pub cumulative_percent: f64,
    pub abc_category: AbcClass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbcSummary {
    pub a_items: usize,
    pub b_items: usize,
    pub c_items: usize,
    pub total_items: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbcAnalysis {
    pub products: Vec<AbcProduct>,
    pub summary: AbcSummary,
}

/// Pareto-classify products by cumulative spend: `A` while the running
/// share stays within 80%, `B` within 95%, `C` beyond.
pub fn perform_abc_analysis(metrics: &IndexMap<String, ProductMetric>) -> AbcAnalysis {
    let mut ranked: Vec<(&String, f64)> = metrics
        .iter()
        .map(|(key, metric)| (key, metric.total_spend))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let total_spend: f64 = ranked.iter().map(|(_, spend)| spend).sum();
    let mut cumulative = 0.0;

    let products: Vec<AbcProduct> = ranked
        .into_iter()
        .map(|(key, spend)| {
            cumulative += spend;
            let cumulative_percent = if total_spend > 0.0 {
                cumulative / total_spend * 100.0
            } else {
                0.0
            };
            let abc_category = if cumulative_percent <= 80.0 {
                AbcClass::A
            } else if cumulative_percent <= 95.0 {
                AbcClass::B
            } else {
                AbcClass::C
            };
            AbcProduct {
                product: key.clone(),
                total_spend: spend,
                spend_percent: if total_spend > 0.0 {
                    spend / total_spend * 100.0
                } else {
                    0.0
                },
                cumulative_percent,
                abc_category,
            }
        })
        .collect();

    let summary = AbcSummary {
        a_items: products.iter().filter(|p| p.abc_category == AbcClass::A).count(),
        b_items: products.iter().filter(|p| p.abc_category == AbcClass::B).count(),
        c_items: products.iter().filter(|p| p.abc_category == AbcClass::C).count(),
        total_items: products.len(),
    };

    AbcAnalysis { products, summary }
}

// ---------------------------------------------------------------------------
// Pack size analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackSizeMetric {
    pub category: String,
    pub pack_size: String,
    pub products: IndexSet<String>,
    pub product_count: usize,
    pub total_spend: f64,
    pub total_qty: f64,
    pub avg_unit_price: f64,
    /// Average unit price divided by the pack multiplier, over the lines
    /// where a multiplier was parseable.
    pub avg_cost_per_unit: f64,
    pub efficiency: f64,
}

/// Group by `(category, pack size)` and compare cost-per-unit. Keys are
/// `category|packSize`.
pub fn analyze_pack_sizes(records: &[InvoiceLine]) -> IndexMap<String, PackSizeMetric> {
    struct Accum {
        category: String,
        pack_size: String,
        products: IndexSet<String>,
        total_spend: f64,
        total_qty: f64,
        unit_prices: Vec<f64>,
        cost_per_unit: Vec<f64>,
    }

    let mut accums: IndexMap<String, Accum> = IndexMap::new();

    for line in records {
        let pack_size = line.pack_size.as_deref().unwrap_or("Unknown").to_string();
        let key = format!("{}|{}", line.category, pack_size);
        let accum = accums.entry(key).or_insert_with(|| Accum {
            category: line.category.clone(),
            pack_size,
            products: IndexSet::new(),
            total_spend: 0.0,
            total_qty: 0.0,
            unit_prices: Vec::new(),
            cost_per_unit: Vec::new(),
        });

        accum.products.insert(line.product_description.clone());
        accum.total_spend += line.ext_price;
        accum.total_qty += line.qty;
        accum.unit_prices.push(line.unit_price);

        let pack_qty = extract_pack_quantity(line.pack_size.as_deref().unwrap_or(""));
        if pack_qty > 0 {
            accum.cost_per_unit.push(line.unit_price / pack_qty as f64);
        }
    }

    accums
        .into_iter()
        .map(|(key, accum)| {
            let avg_cost_per_unit = average(&accum.cost_per_unit);
            let metric = PackSizeMetric {
                category: accum.category,
                pack_size: accum.pack_size,
                product_count: accum.products.len(),
                products: accum.products,
                total_spend: accum.total_spend,
                total_qty: accum.total_qty,
                avg_unit_price: average(&accum.unit_prices),
                avg_cost_per_unit,
                efficiency: if avg_cost_per_unit > 0.0 {
                    1.0 / avg_cost_per_unit
                } else {
                    0.0
                },
            };
            (key, metric)
        })
        .collect()
}

/// Extract the pack multiplier from strings like "6/1 GA" or "24/12 OZ":
/// the first run of digits immediately before a `/`. Returns 0 when no
/// multiplier is present.
pub fn extract_pack_quantity(pack_size: &str) -> u32 {
    let mut run_start: Option<usize> = None;
    for (i, c) in pack_size.char_indices() {
        if c.is_ascii_digit() {
            run_start.get_or_insert(i);
        } else if c == '/' {
            if let Some(start) = run_start {
                return pack_size[start..i].parse().unwrap_or(0);
            }
        } else {
            run_start = None;
        }
    }
    0
}

// ---------------------------------------------------------------------------
// Substitution opportunities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub current_product: String,
    pub current_brand: Option<String>,
    pub current_price: f64,
    pub suggested_product: String,
    pub suggested_brand: Option<String>,
    pub suggested_price: f64,
    pub potential_savings: f64,
    pub savings_percent: f64,
    /// Lifetime-quantity projection (`per-unit savings × total quantity`),
    /// carried over from the reporting convention this replaces. Not
    /// normalized to a calendar year.
    pub annual_savings: f64,
}

/// Suggest cheaper alternatives among products that share a category and
/// a normalized description, when switching saves more than 5%.
pub fn find_substitution_opportunities(
    metrics: &IndexMap<String, ProductMetric>,
) -> Vec<Substitution> {
    let mut groups: IndexMap<(String, String), Vec<&ProductMetric>> = IndexMap::new();
    for metric in metrics.values() {
        let key = (metric.category.clone(), normalize_description(&metric.description));
        groups.entry(key).or_default().push(metric);
    }

    let mut substitutions = Vec::new();
    for group in groups.values_mut() {
        if group.len() < 2 {
            continue;
        }
        group.sort_by(|a, b| a.avg_price.partial_cmp(&b.avg_price).unwrap_or(Ordering::Equal));
        let cheapest = group[0];
        for current in group.iter().skip(1) {
            let savings = current.avg_price - cheapest.avg_price;
            let savings_percent = if current.avg_price > 0.0 {
                savings / current.avg_price * 100.0
            } else {
                0.0
            };
            if savings_percent > 5.0 {
                substitutions.push(Substitution {
                    current_product: current.description.clone(),
                    current_brand: current.brand.clone(),
                    current_price: current.avg_price,
                    suggested_product: cheapest.description.clone(),
                    suggested_brand: cheapest.brand.clone(),
                    suggested_price: cheapest.avg_price,
                    potential_savings: savings,
                    savings_percent,
                    annual_savings: savings * (current.total_qty / 12.0) * 12.0,
                });
            }
        }
    }

    substitutions.sort_by(|a, b| {
        b.annual_savings
            .partial_cmp(&a.annual_savings)
            .unwrap_or(Ordering::Equal)
    });
    substitutions
}

/// Collapse a product description to its comparable stem: lowercased,
/// digits and punctuation stripped, first three words longer than two
/// characters.
pub fn normalize_description(description: &str) -> String {
    let cleaned: String = description
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || *c == '_' || c.is_whitespace())
        .collect();
    cleaned
        .split_whitespace()
        .filter(|word| word.chars().count() > 2)
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Seasonality
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthBucket {
    pub qty: f64,
    pub orders: usize,
    pub spend: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalityProfile {
    pub product: String,
    /// Calendar-month buckets, index 0 = January.
    pub monthly_data: Vec<MonthBucket>,
    /// Coefficient of variation of monthly quantity.
    pub seasonality_score: f64,
    /// The three highest-volume month indices, descending.
    pub peak_months: Vec<usize>,
}

/// Bucket each product's activity by calendar month and score how uneven
/// the quantity distribution is.
pub fn detect_seasonal_patterns(records: &[InvoiceLine]) -> IndexMap<String, SeasonalityProfile> {
    let mut profiles: IndexMap<String, Vec<MonthBucket>> = IndexMap::new();

    for line in records {
        let buckets = profiles
            .entry(line.product_description.clone())
            .or_insert_with(|| vec![MonthBucket::default(); 12]);
        let bucket = &mut buckets[line.invoice_date.month0() as usize];
        bucket.qty += line.qty;
        bucket.orders += 1;
        bucket.spend += line.ext_price;
    }

    profiles
        .into_iter()
        .map(|(product, monthly_data)| {
            let avg_qty = monthly_data.iter().map(|m| m.qty).sum::<f64>() / 12.0;
            let variance = monthly_data
                .iter()
                .map(|m| (m.qty - avg_qty).powi(2))
                .sum::<f64>()
                / 12.0;
            let denominator = if avg_qty != 0.0 { avg_qty } else { 1.0 };
            let seasonality_score = variance.sqrt() / denominator;

            let mut ranked: Vec<(usize, f64)> = monthly_data
                .iter()
                .enumerate()
                .map(|(month, bucket)| (month, bucket.qty))
                .collect();
            ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
            let peak_months = ranked.into_iter().take(3).map(|(month, _)| month).collect();

            let profile = SeasonalityProfile {
                product: product.clone(),
                monthly_data,
                seasonality_score,
                peak_months,
            };
            (product, profile)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub product: String,
    pub days_since_introduction: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtRiskProduct {
    pub product: String,
    pub days_since_last_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingProduct {
    pub product: String,
    pub frequency_change: f64,
}

/// Products classified by order-frequency trend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLifecycle {
    pub new_products: Vec<NewProduct>,
    pub growing_products: Vec<TrendingProduct>,
    pub mature_products: Vec<TrendingProduct>,
    pub declining_products: Vec<TrendingProduct>,
    pub discontinued_risk: Vec<AtRiskProduct>,
}

/// Classify every product into a lifecycle bucket as of `as_of`.
///
/// First seen within 30 days is New; last seen more than 30 days ago is
/// at discontinuation risk; otherwise the order history splits at its
/// midpoint and a >20% order-frequency change decides Growing vs
/// Declining, with everything in between Mature.
pub fn analyze_product_lifecycle(
    metrics: &IndexMap<String, ProductMetric>,
    as_of: NaiveDate,
) -> ProductLifecycle {
    let mut lifecycle = ProductLifecycle::default();

    for (key, metric) in metrics {
        let days_since_first = (as_of - metric.first_seen).num_days();
        let days_since_last = (as_of - metric.last_seen).num_days();

        if days_since_first <= 30 {
            lifecycle.new_products.push(NewProduct {
                product: key.clone(),
                days_since_introduction: days_since_first,
            });
        } else if days_since_last > 30 {
            lifecycle.discontinued_risk.push(AtRiskProduct {
                product: key.clone(),
                days_since_last_order: days_since_last,
            });
        } else {
            let mut orders = metric.invoices.clone();
            orders.sort_by_key(|o| o.date);
            let midpoint = orders.len() / 2;
            let first_half_freq = order_frequency(&orders[..midpoint]);
            let second_half_freq = order_frequency(&orders[midpoint..]);

            let frequency_change = if first_half_freq > 0.0 {
                (second_half_freq - first_half_freq) / first_half_freq * 100.0
            } else {
                0.0
            };

            let entry = TrendingProduct {
                product: key.clone(),
                frequency_change,
            };
            if frequency_change > 20.0 {
                lifecycle.growing_products.push(entry);
            } else if frequency_change < -20.0 {
                lifecycle.declining_products.push(entry);
            } else {
                lifecycle.mature_products.push(entry);
            }
        }
    }

    lifecycle
}

/// Orders per 30-day period across a chronological slice of purchases.
fn order_frequency(orders: &[ProductInvoice]) -> f64 {
    if orders.len() < 2 {
        return 0.0;
    }
    let day_span = (orders[orders.len() - 1].date - orders[0].date).num_days() as f64;
    let day_span = if day_span == 0.0 { 1.0 } else { day_span };
    orders.len() as f64 / day_span * 30.0
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation over mean; 0 for fewer than two values
/// or a zero mean.
fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = average(values);
    if mean == 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt() / mean
}

fn average_gap_days(dates: &[NaiveDate]) -> f64 {
    if dates.len() < 2 {
        return 0.0;
    }
    let total: i64 = dates.windows(2).map(|pair| (pair[1] - pair[0]).num_days()).sum();
    total as f64 / (dates.len() - 1) as f64
}
