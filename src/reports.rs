//! Output Formatting and Report Management
//!
//! Formats analytics results for the terminal (colored, sectioned) or as
//! structured JSON for programmatic consumption, and exports annotated
//! records back to CSV.

use crate::alerts::Alert;
use crate::analyzer::AnalyticsResult;
use crate::brands::BrandMetric;
use crate::forecast::linear_forecast;
use crate::models::InvoiceLine;
use crate::products::{AbcAnalysis, ProductLifecycle, ProductMetric, Substitution};
use anyhow::Result;
use colored::Colorize;
use indexmap::IndexMap;

pub struct ReportManager;

impl Default for ReportManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportManager {
    pub fn new() -> Self {
        Self
    }

    /// Print the full analytics report, with an OLS projection of
    /// `forecast_months` future months appended to the series.
    pub fn display_report(&self, result: &AnalyticsResult, forecast_months: usize, json_output: bool) {
        let projection = linear_forecast(&result.forecast, forecast_months);

        if json_output {
            let output = serde_json::json!({
                "summary": result.summary,
                "budgetVariance": result.budget_variance,
                "supplyConcentration": result.supply_concentration,
                "forecastData": result.forecast,
                "projection": projection,
            });
            print_json(&output);
            return;
        }

        print_rule();
        println!("{}", "Spend Analytics Report".bright_white().bold());
        print_rule();

        let summary = &result.summary;
        println!(
            "\n{} {} records • {} – {} • {} total spend",
            "📊".bright_yellow(),
            summary.total_records.to_string().bright_white().bold(),
            summary.date_range.start.to_string().bright_white(),
            summary.date_range.end.to_string().bright_white(),
            format!("${:.2}", summary.total_spend).bright_green().bold()
        );
        println!(
            "   {} categories • {} vendors • {} price spikes\n",
            summary.unique_categories.to_string().bright_white(),
            summary.unique_vendors.to_string().bright_white(),
            summary.spike_count.to_string().bright_red().bold()
        );

        let concentration = &result.supply_concentration;
        println!(
            "{} Vendor concentration — HHI {} ({})",
            "🏭".bright_blue(),
            format!("{:.0}", concentration.hhi).bright_white().bold(),
            concentration.concentration_risk.to_string().bright_yellow()
        );
        for vendor in concentration.vendors.iter().take(5) {
            println!(
                "   {}: {} ({}%, {} orders)",
                vendor.vendor.bright_cyan(),
                format!("${:.2}", vendor.spend).bright_green(),
                format!("{:.1}", vendor.share_percent).bright_yellow(),
                vendor.order_count
            );
        }

        println!("\n{} Budget variance by category:", "💰".bright_yellow());
        for (category, variance) in &result.budget_variance {
            let label = if category.is_empty() { "(uncategorized)" } else { category };
            let pct = format!("{:+.1}%", variance.variance_percent);
            let pct = if variance.variance_percent > 0.0 {
                pct.bright_red()
            } else {
                pct.bright_green()
            };
            println!(
                "   {}: {} actual vs {} projected ({})",
                label.bright_cyan(),
                format!("${:.2}", variance.actual).bright_white(),
                format!("${:.2}", variance.projected).bright_white(),
                pct
            );
        }

        println!("\n{} Monthly spend:", "📅".bright_blue());
        for point in &result.forecast {
            println!(
                "   {}: {}",
                point.month.bright_white(),
                format!("${:.2}", point.total_spend).bright_green()
            );
        }
        for point in &projection {
            println!(
                "   {}: {} {}",
                point.month.bright_white(),
                format!("${:.2}", point.projected_spend).bright_green(),
                "(projected)".bright_yellow()
            );
        }
        println!();
    }

    pub fn display_products(
        &self,
        metrics: &IndexMap<String, ProductMetric>,
        abc: &AbcAnalysis,
        lifecycle: &ProductLifecycle,
        substitutions: &[Substitution],
        json_output: bool,
    ) {
        if json_output {
            let output = serde_json::json!({
                "products": metrics,
                "abcAnalysis": abc,
                "lifecycle": lifecycle,
                "substitutions": substitutions,
            });
            print_json(&output);
            return;
        }

        print_rule();
        println!("{}", "Product Analytics".bright_white().bold());
        print_rule();

        println!(
            "\n{} ABC: {} A / {} B / {} C of {} products",
            "📦".bright_yellow(),
            abc.summary.a_items.to_string().bright_white().bold(),
            abc.summary.b_items.to_string().bright_white(),
            abc.summary.c_items.to_string().bright_white(),
            abc.summary.total_items
        );
        for product in abc.products.iter().take(10) {
            println!(
                "   [{:?}] {}: {} ({}% of spend)",
                product.abc_category,
                product.product.bright_cyan(),
                format!("${:.2}", product.total_spend).bright_green(),
                format!("{:.1}", product.spend_percent).bright_yellow()
            );
        }

        println!(
            "\n{} Lifecycle: {} new • {} growing • {} mature • {} declining • {} at risk",
            "🔄".bright_blue(),
            lifecycle.new_products.len(),
            lifecycle.growing_products.len(),
            lifecycle.mature_products.len(),
            lifecycle.declining_products.len(),
            lifecycle.discontinued_risk.len().to_string().bright_red()
        );

        if !substitutions.is_empty() {
            println!("\n{} Substitution opportunities:", "💡".bright_yellow());
            for sub in substitutions.iter().take(10) {
                println!(
                    "   {} → {} saves {}/unit ({}%)",
                    sub.current_product.bright_cyan(),
                    sub.suggested_product.bright_cyan(),
                    format!("${:.2}", sub.potential_savings).bright_green(),
                    format!("{:.1}", sub.savings_percent).bright_yellow()
                );
            }
        }
        println!();
    }

    pub fn display_brands(&self, brands: &IndexMap<String, BrandMetric>, json_output: bool) {
        if json_output {
            print_json(&serde_json::json!({ "brands": brands }));
            return;
        }

        print_rule();
        println!("{}", "Brand Analytics".bright_white().bold());
        print_rule();
        println!();

        for metric in brands.values() {
            println!(
                "{} {} — {} ({}% share)",
                "🏷️".bright_blue(),
                metric.brand.bright_white().bold(),
                format!("${:.2}", metric.total_spend).bright_green(),
                format!("{:.1}", metric.market_share).bright_yellow()
            );
            println!(
                "   {} products • loyalty {:.0}% • competitiveness {:.0} • trend {:+.0}%",
                metric.product_count, metric.loyalty_rate, metric.competitiveness_index,
                metric.growth_trend
            );
        }
        println!();
    }

    pub fn display_alerts(&self, alerts: &[Alert], json_output: bool) {
        if json_output {
            print_json(&serde_json::json!({ "alerts": alerts }));
            return;
        }

        if alerts.is_empty() {
            println!("{} No alerts", "✅".bright_green());
            return;
        }
        for alert in alerts {
            println!("{} {}", "⚠️".bright_yellow(), alert.message.bright_white());
        }
    }

    /// Serialize records to CSV. With `include_analytics`, the rolling
    /// statistics and spike columns are appended to each row.
    pub fn export_csv(&self, records: &[InvoiceLine], include_analytics: bool) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut headers = vec![
            "Invoice Date",
            "Invoice Number",
            "Category",
            "Product Description",
            "Brand",
            "Vendor",
            "Unit Price",
            "Ext. Price",
            "Qty",
            "Qty Ordered",
            "Pack Size",
        ];
        if include_analytics {
            headers.extend(["Rolling Mean", "Rolling Std Dev", "Volatility", "Z-Score", "Spike"]);
        }
        writer.write_record(&headers)?;

        for line in records {
            let mut fields = vec![
                line.invoice_date.to_string(),
                line.invoice_number.clone(),
                line.category.clone(),
                line.product_description.clone(),
                line.brand.clone().unwrap_or_default(),
                line.vendor.clone().unwrap_or_default(),
                format!("{:.4}", line.unit_price),
                format!("{:.2}", line.ext_price),
                format!("{}", line.qty),
                format!("{}", line.qty_ordered),
                line.pack_size.clone().unwrap_or_default(),
            ];
            if include_analytics {
                fields.push(optional(line.rolling_mean));
                fields.push(optional(line.rolling_std_dev));
                fields.push(optional(line.volatility));
                fields.push(optional(line.z_score));
                fields.push(line.spike_flag().to_string());
            }
            writer.write_record(&fields)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV export: {}", e))?;
        Ok(String::from_utf8(bytes)?)
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_default()
}

fn print_rule() {
    println!("{}", "=".repeat(80).bright_cyan());
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing report to JSON: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn line() -> InvoiceLine {
        InvoiceLine {
            invoice_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            invoice_number: "INV-1".to_string(),
            category: "Dairy".to_string(),
            product_description: "MILK, WHOLE".to_string(),
            brand: Some("FarmCo".to_string()),
            vendor: None,
            unit_price: 4.25,
            ext_price: 25.5,
            qty: 6.0,
            qty_ordered: 6.0,
            pack_size: None,
            rolling_mean: Some(4.0),
            rolling_std_dev: Some(0.5),
            volatility: Some(0.125),
            z_score: Some(0.5),
            is_spike: Some(false),
            spike_direction: None,
        }
    }

    #[test]
    fn test_export_csv_base_columns() {
        let csv = ReportManager::new().export_csv(&[line()], false).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("Invoice Date,"));
        assert!(!header.contains("Z-Score"));
        let row = lines.next().unwrap();
        // The comma in the description forces quoting.
        assert!(row.contains("\"MILK, WHOLE\""));
        assert!(row.contains("2024-01-15"));
    }

    #[test]
    fn test_export_csv_analytics_columns() {
        let csv = ReportManager::new().export_csv(&[line()], true).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().contains("Z-Score"));
        let row = lines.next().unwrap();
        assert!(row.contains("0.5000"));
        assert!(row.ends_with("false"));
    }

    #[test]
    fn test_export_csv_empty_optionals() {
        let mut l = line();
        l.rolling_mean = None;
        l.z_score = None;
        let csv = ReportManager::new().export_csv(&[l], true).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }
}
