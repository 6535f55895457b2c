use spendlens::analyzer::{run_full_analytics, AnalyticsOptions};
use spendlens::concentration::ConcentrationRisk;
use spendlens::error::AnalyticsError;
use spendlens::filters::RecordFilter;
use spendlens::models::{RecordSet, SpikeDirection};

mod common;
use common::{invoice_line, raw_row};

#[test]
fn test_rolling_window_round_trip_scenario() {
    // Three category-A records at 10, 10, 50. With a 30-day window the
    // third record's window holds the Jan 15 and Feb 1 records only,
    // giving mean 30, stddev 20, z-score 1.0.
    let records = vec![
        invoice_line((2024, 1, 1), "A", "WIDGET", 10.0, 1.0),
        invoice_line((2024, 1, 15), "A", "WIDGET", 10.0, 1.0),
        invoice_line((2024, 2, 1), "A", "WIDGET", 50.0, 1.0),
    ];
    let result =
        run_full_analytics(RecordSet::Normalized(records), &AnalyticsOptions::default()).unwrap();

    let third = result.records.last().unwrap();
    assert!((third.rolling_mean.unwrap() - 30.0).abs() < 1e-9);
    assert!((third.rolling_std_dev.unwrap() - 20.0).abs() < 1e-9);
    assert!((third.z_score.unwrap() - 1.0).abs() < 1e-9);
    // z = 1.0 stays under the default threshold of 2.
    assert_eq!(result.summary.spike_count, 0);
}

#[test]
fn test_rolling_window_category_exclusivity() {
    let records = vec![
        invoice_line((2024, 1, 1), "A", "WIDGET", 10.0, 1.0),
        invoice_line((2024, 1, 2), "B", "GADGET", 9000.0, 1.0),
        invoice_line((2024, 1, 3), "A", "WIDGET", 10.0, 1.0),
    ];
    let result =
        run_full_analytics(RecordSet::Normalized(records), &AnalyticsOptions::default()).unwrap();
    for record in result.records.iter().filter(|r| r.category == "A") {
        assert!((record.rolling_mean.unwrap() - 10.0).abs() < 1e-9);
    }
}

#[test]
fn test_spike_symmetry_scenario() {
    // Constant price except one outlier: only the outlier is flagged,
    // direction up.
    let mut records: Vec<_> = (1..=20)
        .map(|day| invoice_line((2024, 1, day), "A", "WIDGET", 10.0, 1.0))
        .collect();
    records.push(invoice_line((2024, 1, 21), "A", "WIDGET", 40.0, 1.0));

    let result =
        run_full_analytics(RecordSet::Normalized(records), &AnalyticsOptions::default()).unwrap();

    let spikes: Vec<_> = result.records.iter().filter(|r| r.spike_flag()).collect();
    assert_eq!(spikes.len(), 1);
    assert!((spikes[0].unit_price - 40.0).abs() < 1e-9);
    assert_eq!(spikes[0].spike_direction, Some(SpikeDirection::Up));
    assert_eq!(result.summary.spike_count, 1);
}

#[test]
fn test_concentration_scenario() {
    // Vendor spends 600/300/100 give shares 60/30/10, HHI 4600, High.
    let mut records = vec![
        invoice_line((2024, 1, 1), "A", "WIDGET", 600.0, 1.0),
        invoice_line((2024, 1, 2), "A", "WIDGET", 300.0, 1.0),
        invoice_line((2024, 1, 3), "A", "WIDGET", 100.0, 1.0),
    ];
    records[0].vendor = Some("Alpha".to_string());
    records[1].vendor = Some("Beta".to_string());
    records[2].vendor = Some("Gamma".to_string());

    let result =
        run_full_analytics(RecordSet::Normalized(records), &AnalyticsOptions::default()).unwrap();

    let concentration = &result.supply_concentration;
    assert_eq!(concentration.vendors[0].vendor, "Alpha");
    assert!((concentration.vendors[0].share_percent - 60.0).abs() < 1e-9);
    assert!((concentration.hhi - 4600.0).abs() < 1e-9);
    assert_eq!(concentration.concentration_risk, ConcentrationRisk::High);
    assert!((concentration.top5_share - 100.0).abs() < 1e-9);
}

#[test]
fn test_hhi_stays_bounded() {
    let records: Vec<_> = (0..50)
        .map(|i| {
            let mut line = invoice_line((2024, 1, 1 + (i % 28) as u32), "A", "WIDGET", 10.0, 1.0);
            line.vendor = Some(format!("Vendor-{}", i % 7));
            line
        })
        .collect();
    let result =
        run_full_analytics(RecordSet::Normalized(records), &AnalyticsOptions::default()).unwrap();
    let hhi = result.supply_concentration.hhi;
    assert!(hhi > 0.0);
    assert!(hhi <= 10000.0);
}

#[test]
fn test_budget_variance_scenario() {
    // Monthly spends 100/100/100/400: projected = avg(100,100,400) * 4
    // = 800, actual = 700, variance percent = -12.5.
    let records = vec![
        invoice_line((2024, 1, 10), "Meat", "BEEF", 100.0, 1.0),
        invoice_line((2024, 2, 10), "Meat", "BEEF", 100.0, 1.0),
        invoice_line((2024, 3, 10), "Meat", "BEEF", 100.0, 1.0),
        invoice_line((2024, 4, 10), "Meat", "BEEF", 400.0, 1.0),
    ];
    let result =
        run_full_analytics(RecordSet::Normalized(records), &AnalyticsOptions::default()).unwrap();

    let meat = &result.budget_variance["Meat"];
    assert!((meat.actual - 700.0).abs() < 1e-9);
    assert!((meat.projected - 800.0).abs() < 1e-9);
    assert!((meat.variance_percent - -12.5).abs() < 1e-9);
}

#[test]
fn test_raw_rows_normalize_through_pipeline() {
    let rows = vec![
        raw_row("2024-01-05", "Dairy", "ACME", 4.0, 6.0),
        raw_row("2024-01-12", "Dairy", "ACME", 4.5, 6.0),
    ];
    let result = run_full_analytics(RecordSet::Raw(rows), &AnalyticsOptions::default()).unwrap();
    assert_eq!(result.summary.total_records, 2);
    assert!((result.summary.total_spend - 51.0).abs() < 1e-9);
    assert_eq!(result.summary.unique_vendors, 1);
    assert_eq!(result.forecast.len(), 1);
    assert_eq!(result.forecast[0].month, "2024-01");
}

#[test]
fn test_empty_dataset_rejected() {
    let err = run_full_analytics(RecordSet::Raw(Vec::new()), &AnalyticsOptions::default());
    assert_eq!(err.unwrap_err(), AnalyticsError::EmptyDataset);

    // Filters that exclude everything are the same failure.
    let records = vec![invoice_line((2024, 1, 1), "A", "WIDGET", 10.0, 1.0)];
    let options = AnalyticsOptions {
        filters: RecordFilter {
            min_price: Some(100.0),
            ..Default::default()
        },
        ..Default::default()
    };
    let err = run_full_analytics(RecordSet::Normalized(records), &options);
    assert_eq!(err.unwrap_err(), AnalyticsError::EmptyDataset);
}

#[test]
fn test_date_range_filter_inclusive_bounds() {
    let records = vec![
        invoice_line((2024, 1, 1), "A", "WIDGET", 10.0, 1.0),
        invoice_line((2024, 1, 15), "A", "WIDGET", 10.0, 1.0),
        invoice_line((2024, 1, 31), "A", "WIDGET", 10.0, 1.0),
    ];
    let options = AnalyticsOptions {
        filters: RecordFilter {
            start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 15),
            end_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 31),
            ..Default::default()
        },
        ..Default::default()
    };
    let result = run_full_analytics(RecordSet::Normalized(records), &options).unwrap();
    assert_eq!(result.summary.total_records, 2);
    assert_eq!(
        result.summary.date_range.start,
        chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    );
}

#[test]
fn test_no_nan_anywhere_on_degenerate_input() {
    // All-zero prices and quantities exercise every division guard.
    let records = vec![
        invoice_line((2024, 1, 1), "", "FREEBIE", 0.0, 0.0),
        invoice_line((2024, 1, 2), "", "FREEBIE", 0.0, 0.0),
    ];
    let result =
        run_full_analytics(RecordSet::Normalized(records), &AnalyticsOptions::default()).unwrap();

    for record in &result.records {
        assert!(record.rolling_mean.unwrap().is_finite());
        assert!(record.rolling_std_dev.unwrap().is_finite());
        assert!(record.volatility.unwrap().is_finite());
        assert!(record.z_score.unwrap().is_finite());
    }
    for variance in result.budget_variance.values() {
        assert!(variance.variance_percent.is_finite());
    }
    assert!(result.supply_concentration.hhi.is_finite());
    for vendor in &result.supply_concentration.vendors {
        assert!(vendor.share_percent.is_finite());
    }
}
