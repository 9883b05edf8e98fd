//! Report command - statistics over the stored orders.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;
use serde_json::json;

use invo_core::report::SalesReport;
use rust_decimal::Decimal;
use invo_core::{OrderStore, StoreError};

/// Arguments for the report command.
#[derive(Args)]
pub struct ReportArgs {
    /// Order store file
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Part of the analysis to show
    #[arg(long, value_enum, default_value = "all")]
    section: Section,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Section {
    /// Every section
    All,
    /// Average invoice total
    Average,
    /// Most frequently purchased product
    TopProduct,
    /// Total value spent per product
    Totals,
    /// Distinct product names and unit prices
    Prices,
}

impl Section {
    fn includes(self, other: Section) -> bool {
        self == Section::All || self == other
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text summary
    Text,
    /// JSON output
    Json,
    /// CSV output (section, name, value)
    Csv,
}

/// One CSV row of the long-format report.
#[derive(Serialize)]
struct CsvRow<'a> {
    section: &'a str,
    name: &'a str,
    value: String,
}

pub fn run(args: ReportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::config::load(config_path)?;
    let store = OrderStore::new(args.store.unwrap_or(config.store.path));

    let orders = match store.load_existing() {
        Ok(orders) => orders,
        Err(StoreError::NotFound(path)) => {
            println!(
                "{} Store file '{}' was not found.",
                style("✗").red(),
                path.display()
            );
            println!("  Run 'invo ingest' to extract orders first.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if orders.is_empty() {
        println!("{} The store has no orders yet.", style("ℹ").blue());
        return Ok(());
    }

    let report = SalesReport::from_orders(&orders)?;
    let content = match args.format {
        OutputFormat::Text => format_text(&report, args.section),
        OutputFormat::Json => format_json(&report, args.section)?,
        OutputFormat::Csv => format_csv(&report, args.section)?,
    };

    match args.output {
        Some(path) => {
            fs::write(&path, content)?;
            println!(
                "{} Report written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => print!("{}", content),
    }

    Ok(())
}

fn money(value: Decimal) -> String {
    let mut value = value.round_dp(2);
    value.rescale(2);
    value.to_string()
}

fn format_text(report: &SalesReport, section: Section) -> String {
    let mut output = String::new();

    if section == Section::All {
        output.push_str(&format!("ORDER ANALYSIS ({} orders)\n", report.orders));
    }

    if section.includes(Section::Average) {
        output.push_str("\nAverage invoice total:\n");
        if let Some(average) = report.average_invoice_total {
            output.push_str(&format!("   {}\n", money(average)));
        }
    }

    if section.includes(Section::TopProduct) {
        output.push_str("\nMost frequently purchased product:\n");
        if let Some(top) = &report.top_product {
            output.push_str(&format!("   {} ({} occurrences)\n", top.name, top.occurrences));
        }
    }

    if section.includes(Section::Totals) {
        output.push_str("\nTotal spent per product:\n");
        for total in &report.totals_by_product {
            output.push_str(&format!("   {}: {}\n", total.name, money(total.total)));
        }
    }

    if section.includes(Section::Prices) {
        output.push_str("\nProducts and unit prices:\n");
        for price in &report.product_prices {
            output.push_str(&format!("   {}: {}\n", price.name, money(price.unit_price)));
        }
    }

    output
}

fn format_json(report: &SalesReport, section: Section) -> anyhow::Result<String> {
    let value = match section {
        Section::All => serde_json::to_value(report)?,
        Section::Average => json!({ "average_invoice_total": report.average_invoice_total }),
        Section::TopProduct => json!({ "top_product": report.top_product }),
        Section::Totals => json!({ "totals_by_product": report.totals_by_product }),
        Section::Prices => json!({ "product_prices": report.product_prices }),
    };
    Ok(serde_json::to_string_pretty(&value)? + "\n")
}

fn format_csv(report: &SalesReport, section: Section) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    if section.includes(Section::Average) {
        if let Some(average) = report.average_invoice_total {
            wtr.serialize(CsvRow {
                section: "average",
                name: "",
                value: money(average),
            })?;
        }
    }

    if section.includes(Section::TopProduct) {
        if let Some(top) = &report.top_product {
            wtr.serialize(CsvRow {
                section: "top_product",
                name: &top.name,
                value: top.occurrences.to_string(),
            })?;
        }
    }

    if section.includes(Section::Totals) {
        for total in &report.totals_by_product {
            wtr.serialize(CsvRow {
                section: "total",
                name: &total.name,
                value: money(total.total),
            })?;
        }
    }

    if section.includes(Section::Prices) {
        for price in &report.product_prices {
            wtr.serialize(CsvRow {
                section: "price",
                name: &price.name,
                value: money(price.unit_price),
            })?;
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use invo_core::report::{ProductFrequency, ProductPrice, ProductTotal};

    fn report() -> SalesReport {
        SalesReport {
            orders: 2,
            average_invoice_total: Some(Decimal::new(2450, 2)),
            top_product: Some(ProductFrequency {
                name: "Chai".to_string(),
                occurrences: 2,
            }),
            totals_by_product: vec![ProductTotal {
                name: "Chai".to_string(),
                total: Decimal::new(49, 0),
            }],
            product_prices: vec![ProductPrice {
                name: "Chai".to_string(),
                unit_price: Decimal::new(245, 1),
            }],
        }
    }

    #[test]
    fn test_money_has_two_places() {
        assert_eq!(money(Decimal::new(49, 0)), "49.00");
        assert_eq!(money(Decimal::new(12345, 3)), "12.34");
    }

    #[test]
    fn test_text_single_section() {
        let text = format_text(&report(), Section::TopProduct);
        assert_eq!(text, "\nMost frequently purchased product:\n   Chai (2 occurrences)\n");
    }

    #[test]
    fn test_csv_long_format() {
        let csv = format_csv(&report(), Section::All).unwrap();
        assert_eq!(
            csv,
            "section,name,value\naverage,,24.50\ntop_product,Chai,2\ntotal,Chai,49.00\nprice,Chai,24.50\n"
        );
    }

    #[test]
    fn test_json_section() {
        let json = format_json(&report(), Section::Average).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["average_invoice_total"], "24.50");
    }
}
