//! Forecast Series Builder
//!
//! Aggregates spend into an ordered monthly time series, which is the
//! pipeline's forecasting output. The ordinary-least-squares extrapolation
//! lives here too, as a separate step the report layer calls to project
//! future months; it is not part of the main analytics result.

use crate::models::InvoiceLine;
use chrono::{Months, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-category slice of one month's spend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySlice {
    pub category: String,
    pub spend: f64,
    #[serde(rename = "avgPrice")]
    pub avg_price: f64,
}

/// One month of aggregated spend, keyed `YYYY-MM`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub month: String,
    #[serde(rename = "totalSpend")]
    pub total_spend: f64,
    #[serde(rename = "avgUnitPrice")]
    pub avg_unit_price: f64,
    pub categories: Vec<CategorySlice>,
}

/// A projected future month from the OLS fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub month: String,
    #[serde(rename = "projectedSpend")]
    pub projected_spend: f64,
}

#[derive(Default)]
struct MonthAccum {
    total_spend: f64,
    price_sum: f64,
    count: usize,
    categories: IndexMap<String, (f64, f64, usize)>, // spend, price sum, count
}

/// Aggregate records into the monthly series, sorted by month ascending.
pub fn monthly_series(records: &[InvoiceLine]) -> Vec<ForecastPoint> {
    let mut months: BTreeMap<String, MonthAccum> = BTreeMap::new();

    for line in records {
        let accum = months.entry(line.month_key()).or_default();
        accum.total_spend += line.ext_price;
        accum.price_sum += line.unit_price;
        accum.count += 1;

        let cat = accum.categories.entry(line.category.clone()).or_default();
        cat.0 += line.ext_price;
        cat.1 += line.unit_price;
        cat.2 += 1;
    }

    months
        .into_iter()
        .map(|(month, accum)| ForecastPoint {
            month,
            total_spend: accum.total_spend,
            avg_unit_price: if accum.count > 0 {
                accum.price_sum / accum.count as f64
            } else {
                0.0
            },
            categories: accum
                .categories
                .into_iter()
                .map(|(category, (spend, price_sum, count))| CategorySlice {
                    category,
                    spend,
                    avg_price: if count > 0 { price_sum / count as f64 } else { 0.0 },
                })
                .collect(),
        })
        .collect()
}

/// Fit an OLS line over the series (index as x, total spend as y) and
/// project `periods` future months.
///
/// Returns an empty projection for series shorter than two points, where
/// the slope denominator degenerates.
pub fn linear_forecast(series: &[ForecastPoint], periods: usize) -> Vec<ProjectedPoint> {
    let n = series.len();
    if n < 2 || periods == 0 {
        return Vec::new();
    }

    let nf = n as f64;
    let mut x_sum = 0.0;
    let mut y_sum = 0.0;
    let mut xy_sum = 0.0;
    let mut xx_sum = 0.0;
    for (i, point) in series.iter().enumerate() {
        let x = i as f64;
        x_sum += x;
        y_sum += point.total_spend;
        xy_sum += x * point.total_spend;
        xx_sum += x * x;
    }

    let denominator = nf * xx_sum - x_sum * x_sum;
    if denominator == 0.0 {
        return Vec::new();
    }
    let slope = (nf * xy_sum - x_sum * y_sum) / denominator;
    let intercept = (y_sum - slope * x_sum) / nf;

    let last_month = match first_of_month(&series[n - 1].month) {
        Some(date) => date,
        None => return Vec::new(),
    };

    (1..=periods)
        .filter_map(|k| {
            let month = last_month
                .checked_add_months(Months::new(k as u32))
                .map(|d| d.format("%Y-%m").to_string())?;
            Some(ProjectedPoint {
                month,
                projected_spend: intercept + slope * (nf - 1.0 + k as f64),
            })
        })
        .collect()
}

fn first_of_month(month_key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", month_key), "%Y-%m-%d").ok()
}
