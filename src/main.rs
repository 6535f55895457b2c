use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use spendlens::alerts::{check_alerts, AlertThresholds};
use spendlens::analyzer::{AnalyticsEngine, AnalyticsOptions};
use spendlens::brands::analyze_brands;
use spendlens::config::get_config;
use spendlens::dates::DateParser;
use spendlens::filters::RecordFilter;
use spendlens::ingest::read_invoice_csv;
use spendlens::logging::init_logging;
use spendlens::models::RecordSet;
use spendlens::products::{
    analyze_product_lifecycle, analyze_product_performance, find_substitution_opportunities,
    perform_abc_analysis,
};
use spendlens::reports::ReportManager;

#[derive(Parser)]
#[command(name = "spendlens")]
#[command(about = "Procurement spend analytics for invoice line data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analytics report over an invoice CSV
    Report {
        /// Invoice CSV file
        #[arg(long)]
        file: PathBuf,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Rolling window in days
        #[arg(long)]
        window: Option<i64>,
        /// Spike z-score threshold
        #[arg(long)]
        threshold: Option<f64>,
        /// Start date filter (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,
        /// End date filter (YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,
        /// Category filter
        #[arg(long)]
        category: Option<String>,
        /// Vendor filter
        #[arg(long)]
        vendor: Option<String>,
        /// Minimum unit price filter
        #[arg(long)]
        min_price: Option<f64>,
        /// Maximum unit price filter
        #[arg(long)]
        max_price: Option<f64>,
        /// Only keep records already flagged as spikes
        #[arg(long)]
        spikes_only: bool,
        /// Future months to project
        #[arg(long)]
        forecast_months: Option<usize>,
        /// Write the annotated records to a CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Product analytics: ABC, lifecycle, substitutions
    Products {
        /// Invoice CSV file
        #[arg(long)]
        file: PathBuf,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Reference date for status/lifecycle (default: today)
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Brand analytics: share, loyalty, switching
    Brands {
        /// Invoice CSV file
        #[arg(long)]
        file: PathBuf,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Evaluate threshold alerts
    Alerts {
        /// Invoice CSV file
        #[arg(long)]
        file: PathBuf,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let reports = ReportManager::new();

    match cli.command {
        Commands::Report {
            file,
            json,
            window,
            threshold,
            since,
            until,
            category,
            vendor,
            min_price,
            max_price,
            spikes_only,
            forecast_months,
            export,
        } => {
            let config = get_config();
            let options = AnalyticsOptions {
                volatility_window: window.unwrap_or(config.analytics.volatility_window_days),
                spike_threshold: threshold.unwrap_or(config.analytics.spike_z_threshold),
                filters: build_filters(since, until, category, vendor, min_price, max_price)?,
            };

            let rows = read_invoice_csv(&file)?;
            let result = match AnalyticsEngine::new().run(RecordSet::Raw(rows), &options) {
                Ok(result) => result,
                Err(e) => return handle_error(e.into(), json),
            };

            // The spike filter needs annotations, so it runs as a second
            // pass over the annotated output.
            let result = if spikes_only {
                let spike_filter = RecordFilter {
                    spikes_only: true,
                    ..Default::default()
                };
                let mut second_pass_options = options.clone();
                second_pass_options.filters = spike_filter;
                match AnalyticsEngine::new()
                    .run(RecordSet::Normalized(result.records), &second_pass_options)
                {
                    Ok(result) => result,
                    Err(e) => return handle_error(e.into(), json),
                }
            } else {
                result
            };

            if let Some(export_path) = export {
                let csv = reports.export_csv(&result.records, true)?;
                std::fs::write(&export_path, csv)?;
            }

            let months = forecast_months.unwrap_or(config.analytics.forecast_months);
            reports.display_report(&result, months, json);
            Ok(())
        }
        Commands::Products { file, json, as_of } => {
            let as_of_date = match as_of {
                Some(raw) => DateParser::parse(&raw)?,
                None => Local::now().date_naive(),
            };
            let rows = read_invoice_csv(&file)?;
            let result = match AnalyticsEngine::new()
                .run(RecordSet::Raw(rows), &AnalyticsOptions::default())
            {
                Ok(result) => result,
                Err(e) => return handle_error(e.into(), json),
            };

            let metrics = analyze_product_performance(&result.records, as_of_date);
            let abc = perform_abc_analysis(&metrics);
            let lifecycle = analyze_product_lifecycle(&metrics, as_of_date);
            let substitutions = find_substitution_opportunities(&metrics);
            reports.display_products(&metrics, &abc, &lifecycle, &substitutions, json);
            Ok(())
        }
        Commands::Brands { file, json } => {
            let rows = read_invoice_csv(&file)?;
            let result = match AnalyticsEngine::new()
                .run(RecordSet::Raw(rows), &AnalyticsOptions::default())
            {
                Ok(result) => result,
                Err(e) => return handle_error(e.into(), json),
            };
            reports.display_brands(&analyze_brands(&result.records), json);
            Ok(())
        }
        Commands::Alerts { file, json } => {
            let config = get_config();
            let rows = read_invoice_csv(&file)?;
            let result = match AnalyticsEngine::new()
                .run(RecordSet::Raw(rows), &AnalyticsOptions::default())
            {
                Ok(result) => result,
                Err(e) => return handle_error(e.into(), json),
            };
            let thresholds = AlertThresholds {
                spike_z_threshold: config.alerts.spike_z_threshold,
                budget_variance_threshold: config.alerts.budget_variance_threshold_pct,
                concentration_threshold: config.alerts.concentration_threshold_pct,
            };
            reports.display_alerts(&check_alerts(&result, &thresholds), json);
            Ok(())
        }
    }
}

fn build_filters(
    since: Option<String>,
    until: Option<String>,
    category: Option<String>,
    vendor: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
) -> Result<RecordFilter> {
    let start_date = since.map(|s| DateParser::parse(&s)).transpose()?;
    let end_date = until.map(|s| DateParser::parse(&s)).transpose()?;
    Ok(RecordFilter {
        start_date,
        end_date,
        // "all" is the UI convention for an unset selector.
        category: category.filter(|c| c != "all"),
        vendor: vendor.filter(|v| v != "all"),
        min_price,
        max_price,
        spikes_only: false,
    })
}

fn handle_error(e: anyhow::Error, json_output: bool) -> Result<()> {
    if json_output {
        println!(
            "{}",
            serde_json::json!({ "error": e.to_string() })
        );
    } else {
        eprintln!("Error: {}", e);
    }
    process::exit(1);
}
