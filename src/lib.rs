//! Spendlens Library
//!
//! A Rust library for descriptive procurement analytics over invoice line
//! data. It turns a flat list of invoice lines (date, category, vendor,
//! unit price, quantity) into derived business metrics: rolling price
//! statistics and spike flags, budget variance, vendor concentration,
//! a monthly forecast series, and product/brand portfolio rollups.
//!
//! ## Architecture Overview
//!
//! The library is organized around a strictly forward-flowing pipeline:
//!
//! - [`models`] - Canonical record types ([`RawInvoiceRow`], [`InvoiceLine`])
//! - [`normalizer`] - Raw row → canonical record, unit price invariant
//! - [`filters`] - Date/category/vendor/price drill-down criteria
//! - [`rolling`] - Trailing same-category window statistics
//! - [`spike`] - Z-score threshold spike flagging
//! - [`budget`] - Actual vs projected category spend
//! - [`concentration`] - Vendor share, HHI, top-N concentration
//! - [`forecast`] - Monthly spend series and OLS projection
//! - [`products`] - Performance, ABC, pack size, substitution,
//!   seasonality, lifecycle
//! - [`brands`] - Brand share, loyalty, competitiveness, switching
//! - [`analyzer`] - The orchestrator composing all of the above
//! - [`alerts`] - Threshold alerts over an analytics result
//! - [`ingest`] / [`reports`] - CSV in, terminal/JSON/CSV out
//! - [`config`] / [`logging`] - Ambient configuration and tracing setup
//!
//! Every analytics function is a pure, synchronous transformation:
//! results are recomputed from scratch per run, nothing global mutates,
//! and guarded arithmetic keeps NaN out of every output.
//!
//! ## Main Entry Point
//!
//! ```rust
//! use spendlens::{run_full_analytics, AnalyticsOptions, RecordSet};
//! use spendlens::models::RawInvoiceRow;
//!
//! # fn example() -> Result<(), spendlens::error::AnalyticsError> {
//! let rows = vec![RawInvoiceRow {
//!     invoice_date: "2024-01-15".to_string(),
//!     invoice_number: "INV-1001".to_string(),
//!     product_class: "Dairy".to_string(),
//!     product_description: "MILK WHOLE GAL".to_string(),
//!     ext_price: "25.50".to_string(),
//!     qty: "6".to_string(),
//!     ..Default::default()
//! }];
//!
//! let result = run_full_analytics(RecordSet::Raw(rows), &AnalyticsOptions::default())?;
//! assert_eq!(result.summary.total_records, 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! [`RawInvoiceRow`]: models::RawInvoiceRow
//! [`InvoiceLine`]: models::InvoiceLine

pub mod alerts;
pub mod analyzer;
pub mod brands;
pub mod budget;
pub mod concentration;
pub mod config;
pub mod dates;
pub mod error;
pub mod filters;
pub mod forecast;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod products;
pub mod reports;
pub mod rolling;
pub mod spike;

pub use analyzer::{run_full_analytics, AnalyticsEngine, AnalyticsOptions, AnalyticsResult};
pub use error::AnalyticsError;
pub use filters::RecordFilter;
pub use models::*;
