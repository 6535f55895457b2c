//! Typed errors for the analytics pipeline.
//!
//! The pipeline itself computes safe defaults instead of failing (zero
//! rather than NaN, omission rather than panic); the one loud failure is
//! an empty record set, which would make the summary's date range
//! meaningless. Edge concerns (file reads, config parsing) report through
//! `anyhow` at the call site instead.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyticsError {
    /// No records survived normalization and filtering. Raised before any
    /// min/max aggregation runs, so callers get a clear error instead of
    /// a nonsense summary.
    #[error("no records to analyze after normalization and filtering")]
    EmptyDataset,
}
