//! Rolling Statistics Engine
//!
//! Annotates every record with trailing-window price statistics computed
//! against records of the same category. Window membership is date-bounded,
//! not count-bounded: the window for a record dated `d` is every
//! same-category record dated within `[d - window_days, d]`, the record
//! itself included, so window size varies with invoice frequency.
//!
//! Records are globally sorted by date first and returned in that order.
//! The per-record scan is quadratic in the worst case; the `parallel`
//! feature spreads the scans across cores without changing the windowing
//! semantics.
//!
//! Division guards: a zero mean yields a coefficient of variation and
//! z-score of `0`, and a zero standard deviation (constant prices) also
//! yields a z-score of `0`. Nothing downstream ever sees NaN.

use crate::models::InvoiceLine;
use chrono::{Duration, NaiveDate};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

/// Default trailing window span in days.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

struct WindowStats {
    mean: f64,
    std_dev: f64,
    volatility: f64,
    z_score: f64,
}

/// Compute rolling statistics for every record over the trailing
/// same-category window. Consumes the records and returns them sorted by
/// date ascending with the annotation fields set.
pub fn rolling_stats(records: Vec<InvoiceLine>, window_days: i64) -> Vec<InvoiceLine> {
    let mut sorted = records;
    sorted.sort_by_key(|r| r.invoice_date);

    // Window scans only need these three columns; snapshotting them keeps
    // the borrow checker out of the annotation pass.
    let keys: Vec<(NaiveDate, String, f64)> = sorted
        .iter()
        .map(|r| (r.invoice_date, r.category.clone(), r.unit_price))
        .collect();

    #[cfg(feature = "parallel")]
    let stats: Vec<Option<WindowStats>> = (0..keys.len())
        .into_par_iter()
        .map(|i| window_stats(&keys, i, window_days))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let stats: Vec<Option<WindowStats>> = (0..keys.len())
        .map(|i| window_stats(&keys, i, window_days))
        .collect();

    for (line, stat) in sorted.iter_mut().zip(stats) {
        match stat {
            Some(s) => {
                line.rolling_mean = Some(s.mean);
                line.rolling_std_dev = Some(s.std_dev);
                line.volatility = Some(s.volatility);
                line.z_score = Some(s.z_score);
            }
            None => {
                line.rolling_mean = None;
                line.rolling_std_dev = None;
                line.volatility = None;
                line.z_score = None;
            }
        }
    }

    debug!(records = sorted.len(), window_days, "Computed rolling statistics");
    sorted
}

fn window_stats(keys: &[(NaiveDate, String, f64)], idx: usize, window_days: i64) -> Option<WindowStats> {
    let (date, ref category, price) = keys[idx];
    let window_start = date - Duration::days(window_days);

    let prices: Vec<f64> = keys
        .iter()
        .filter(|(d, c, _)| *d >= window_start && *d <= date && c == category)
        .map(|(_, _, p)| *p)
        .collect();

    if prices.is_empty() {
        return None;
    }

    let mean = prices.iter().sum::<f64>() / prices.len() as f64;
    let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / prices.len() as f64;
    let std_dev = variance.sqrt();

    let volatility = if mean > 0.0 { std_dev / mean } else { 0.0 };
    let z_score = if mean > 0.0 && std_dev > 0.0 {
        (price - mean) / std_dev
    } else {
        0.0
    };

    Some(WindowStats {
        mean,
        std_dev,
        volatility,
        z_score,
    })
}
