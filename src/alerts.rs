//! Threshold Alerts
//!
//! Evaluates an analytics result against configured thresholds and emits
//! a flat list of alerts: price spikes, per-category budget variance, and
//! vendor concentration. Pure evaluation; storing thresholds is the
//! config layer's job.

use crate::analyzer::AnalyticsResult;
use serde::{Deserialize, Serialize};

/// Alert trigger thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Z-score magnitude beyond which records count as spikes.
    #[serde(rename = "spikeZThreshold")]
    pub spike_z_threshold: f64,
    /// Absolute budget variance percent that triggers a category alert.
    #[serde(rename = "budgetVarianceThreshold")]
    pub budget_variance_threshold: f64,
    /// Top-5 vendor share percent that triggers a concentration alert.
    #[serde(rename = "concentrationThreshold")]
    pub concentration_threshold: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            spike_z_threshold: 2.0,
            budget_variance_threshold: 10.0,
            concentration_threshold: 40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Spike,
    Budget,
    Concentration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
}

/// Evaluate all alert rules against one analytics result.
pub fn check_alerts(result: &AnalyticsResult, thresholds: &AlertThresholds) -> Vec<Alert> {
    let mut alerts = Vec::new();

    let spike_count = result
        .records
        .iter()
        .filter(|r| r.z_score_or_zero().abs() > thresholds.spike_z_threshold)
        .count();
    if spike_count > 0 {
        alerts.push(Alert {
            kind: AlertKind::Spike,
            severity: AlertSeverity::Warning,
            message: format!("{} price spikes detected", spike_count),
        });
    }

    for (category, variance) in &result.budget_variance {
        if variance.variance_percent.abs() > thresholds.budget_variance_threshold {
            alerts.push(Alert {
                kind: AlertKind::Budget,
                severity: if variance.variance_percent > 0.0 {
                    AlertSeverity::Warning
                } else {
                    AlertSeverity::Info
                },
                message: format!(
                    "{}: {:.1}% budget variance",
                    category, variance.variance_percent
                ),
            });
        }
    }

    if result.supply_concentration.top5_share > thresholds.concentration_threshold {
        alerts.push(Alert {
            kind: AlertKind::Concentration,
            severity: AlertSeverity::Warning,
            message: format!(
                "High vendor concentration: Top 5 vendors = {:.1}%",
                result.supply_concentration.top5_share
            ),
        });
    }

    alerts
}
