//! Spike Detector
//!
//! Flags records whose z-score magnitude exceeds a threshold. Records
//! without a z-score (no rolling window) default to `0` and are never
//! flagged.

use crate::models::{InvoiceLine, SpikeDirection};

/// Default z-score threshold.
pub const DEFAULT_Z_THRESHOLD: f64 = 2.0;

/// Mark every record's spike flag and direction against `z_threshold`.
pub fn detect_spikes(records: Vec<InvoiceLine>, z_threshold: f64) -> Vec<InvoiceLine> {
    records
        .into_iter()
        .map(|mut line| {
            let z = line.z_score_or_zero();
            line.is_spike = Some(z.abs() > z_threshold);
            line.spike_direction = if z > z_threshold {
                Some(SpikeDirection::Up)
            } else if z < -z_threshold {
                Some(SpikeDirection::Down)
            } else {
                None
            };
            line
        })
        .collect()
}
