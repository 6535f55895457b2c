//! Analytics Pipeline Orchestrator
//!
//! This module provides the engine that runs the full analytics pipeline
//! over a set of invoice records. It is the primary entry point for
//! library consumers.
//!
//! ## Processing Pipeline
//!
//! 1. **Normalization**: raw rows become [`InvoiceLine`] records; input
//!    that is already normalized passes through untouched
//! 2. **Filtering**: date range, category, vendor, price range, and
//!    spike-only criteria narrow the set
//! 3. **Rolling statistics**: trailing same-category windows annotate
//!    every record with mean, deviation, volatility, and z-score
//! 4. **Spike detection**: z-scores beyond the threshold are flagged
//! 5. **Independent aggregates**: budget variance, supply concentration,
//!    and the monthly forecast series are computed from the same
//!    annotated set
//! 6. **Summary**: record count, date range, total spend, distinct
//!    category/vendor counts, spike count
//!
//! The product and brand rollups ([`crate::products`], [`crate::brands`])
//! are deliberately not bundled into [`AnalyticsResult`]; they are
//! separate calls the presentation layer makes against the annotated
//! records when it needs them.
//!
//! The engine never mutates its input and holds no state between runs;
//! every run recomputes all derived values from scratch.

use crate::budget::{budget_variance, BudgetVariance};
use crate::concentration::{analyze_supply_concentration, SupplyConcentration};
use crate::error::AnalyticsError;
use crate::filters::RecordFilter;
use crate::forecast::{monthly_series, ForecastPoint};
use crate::models::{DateRange, InvoiceLine, RecordSet};
use crate::normalizer::RecordNormalizer;
use crate::rolling::{rolling_stats, DEFAULT_WINDOW_DAYS};
use crate::spike::{detect_spikes, DEFAULT_Z_THRESHOLD};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Tunables for one analytics run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsOptions {
    /// Trailing window span for rolling statistics, in days.
    #[serde(rename = "volatilityWindow")]
    pub volatility_window: i64,
    /// Z-score magnitude beyond which a record is a spike.
    #[serde(rename = "spikeThreshold")]
    pub spike_threshold: f64,
    pub filters: RecordFilter,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self {
            volatility_window: DEFAULT_WINDOW_DAYS,
            spike_threshold: DEFAULT_Z_THRESHOLD,
            filters: RecordFilter::default(),
        }
    }
}

/// Scalar roll-up over the filtered record set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    #[serde(rename = "totalRecords")]
    pub total_records: usize,
    #[serde(rename = "dateRange")]
    pub date_range: DateRange,
    #[serde(rename = "totalSpend")]
    pub total_spend: f64,
    #[serde(rename = "uniqueCategories")]
    pub unique_categories: usize,
    #[serde(rename = "uniqueVendors")]
    pub unique_vendors: usize,
    #[serde(rename = "spikeCount")]
    pub spike_count: usize,
}

/// Everything one analytics run produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsResult {
    /// The filtered records, annotated and sorted by date ascending.
    pub records: Vec<InvoiceLine>,
    #[serde(rename = "budgetVariance")]
    pub budget_variance: IndexMap<String, BudgetVariance>,
    #[serde(rename = "supplyConcentration")]
    pub supply_concentration: SupplyConcentration,
    #[serde(rename = "forecastData")]
    pub forecast: Vec<ForecastPoint>,
    pub summary: AnalyticsSummary,
}

/// Stateless pipeline coordinator.
pub struct AnalyticsEngine;

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run the full pipeline. Fails with [`AnalyticsError::EmptyDataset`]
    /// when nothing survives normalization and filtering, before any
    /// min/max aggregation could run on an empty set.
    pub fn run(
        &self,
        input: RecordSet,
        options: &AnalyticsOptions,
    ) -> Result<AnalyticsResult, AnalyticsError> {
        let normalized = match input {
            RecordSet::Raw(rows) => RecordNormalizer::normalize_all(&rows),
            RecordSet::Normalized(lines) => lines,
        };
        debug!(records = normalized.len(), "Pipeline input normalized");

        let filtered = options.filters.apply(normalized);
        if filtered.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }
        debug!(records = filtered.len(), "Filters applied");

        let annotated = rolling_stats(filtered, options.volatility_window);
        let annotated = detect_spikes(annotated, options.spike_threshold);

        let budget_variance = budget_variance(&annotated);
        let supply_concentration = analyze_supply_concentration(&annotated);
        let forecast = monthly_series(&annotated);
        let summary = summarize(&annotated);

        info!(
            records = summary.total_records,
            spikes = summary.spike_count,
            vendors = summary.unique_vendors,
            "Analytics run complete"
        );

        Ok(AnalyticsResult {
            records: annotated,
            budget_variance,
            supply_concentration,
            forecast,
            summary,
        })
    }
}

/// Convenience wrapper for one-shot runs.
pub fn run_full_analytics(
    input: RecordSet,
    options: &AnalyticsOptions,
) -> Result<AnalyticsResult, AnalyticsError> {
    AnalyticsEngine::new().run(input, options)
}

fn summarize(records: &[InvoiceLine]) -> AnalyticsSummary {
    // Callers guarantee a non-empty set; the pipeline rejected empty
    // input before reaching this point.
    let start = records.iter().map(|r| r.invoice_date).min().unwrap_or_default();
    let end = records.iter().map(|r| r.invoice_date).max().unwrap_or_default();

    let categories: HashSet<&str> = records.iter().map(|r| r.category.as_str()).collect();
    let vendors: HashSet<&str> = records.iter().map(|r| r.vendor_label()).collect();

    AnalyticsSummary {
        total_records: records.len(),
        date_range: DateRange { start, end },
        total_spend: records.iter().map(|r| r.ext_price).sum(),
        unique_categories: categories.len(),
        unique_vendors: vendors.len(),
        spike_count: records.iter().filter(|r| r.spike_flag()).count(),
    }
}
