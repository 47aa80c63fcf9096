//! Process command - extract and reconcile a single invoice PDF.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use fatex_core::report::{build_report_rows, write_invoice_report};
use fatex_core::{FatexConfig, InvoiceRecord, TransactionBook};

use super::pipeline;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input invoice PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Transaction CSV used to enrich the report rows
    #[arg(short, long)]
    transactions: Option<PathBuf>,

    /// Also write the upload-template CSV for this invoice
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Skip OCR and use only embedded PDF text
    #[arg(long)]
    text_only: bool,

    /// Show extraction warnings
    #[arg(long)]
    show_warnings: bool,

    /// Validate the extracted record and print review issues
    #[arg(long)]
    validate: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = if let Some(path) = config_path {
        FatexConfig::from_file(std::path::Path::new(path))?
    } else {
        FatexConfig::default()
    };

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let extension = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "pdf" {
        anyhow::bail!("Unsupported file format: {}", extension);
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Extracting invoice data...");

    let parser = pipeline::build_parser(&config);
    let result = pipeline::extract_record(&args.input, &config, &parser, args.text_only).await?;
    let record = result.record;

    pb.finish_with_message("Done");

    if args.validate {
        let issues = record.validate();
        if !issues.is_empty() {
            eprintln!("{}", style("Review issues:").yellow());
            for issue in &issues {
                eprintln!("  - {}", issue);
            }
        }
    }

    if args.show_warnings && !record.warnings.is_empty() {
        eprintln!("{}", style("Warnings:").yellow());
        for warning in &record.warnings {
            eprintln!("  - {}", warning);
        }
    }

    // Upload-template CSV, enriched from the transaction book if given
    if let Some(report_path) = &args.report {
        let book = match &args.transactions {
            Some(path) => Some(TransactionBook::load(path)?),
            None => None,
        };

        let rows = build_report_rows(&record, book.as_ref());
        write_invoice_report(report_path, &rows)?;
        println!(
            "{} Report written to {}",
            style("✓").green(),
            report_path.display()
        );
    }

    let output = format_record(&record, args.format, &config.report.currency)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if record.reconciliation.discrepancy {
        eprintln!(
            "{} Stated total differs from computed gross by {}",
            style("!").red(),
            record.reconciliation.difference
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_record(
    record: &InvoiceRecord,
    format: OutputFormat,
    currency: &str,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => Ok(format_text(record, currency)),
    }
}

fn format_csv(record: &InvoiceRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "source",
        "invoice_number",
        "invoice_date",
        "product_code",
        "net_amount",
        "vat_rate",
        "computed_gross",
        "stated_gross",
        "discrepancy",
    ])?;

    wtr.write_record([
        record.source.as_str(),
        record.invoice_number.as_deref().unwrap_or(""),
        &record
            .invoice_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        record.product_code.display(),
        &record.net_amount.to_string(),
        &record.vat_rate.to_string(),
        &record.reconciliation.computed_gross.to_string(),
        &record
            .reconciliation
            .stated_gross
            .map(|d| d.to_string())
            .unwrap_or_default(),
        if record.reconciliation.discrepancy {
            "true"
        } else {
            "false"
        },
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &InvoiceRecord, currency: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Invoice: {}\n",
        record.invoice_number.as_deref().unwrap_or("(unknown)")
    ));
    if let Some(date) = record.invoice_date {
        output.push_str(&format!("Date: {}\n", date.format("%d.%m.%Y")));
    }
    output.push_str(&format!("Product: {}\n", record.product_code.display()));
    output.push('\n');

    output.push_str("Amounts:\n");
    output.push_str(&format!("  Net:   {} {}\n", record.net_amount, currency));
    output.push_str(&format!(
        "  Rate:  {}%\n",
        record.vat_rate * rust_decimal::Decimal::ONE_HUNDRED
    ));
    output.push_str(&format!(
        "  Gross: {} {}\n",
        record.reconciliation.computed_gross, currency
    ));

    if let Some(stated) = record.reconciliation.stated_gross {
        output.push_str(&format!("  Stated: {} {}\n", stated, currency));
        if record.reconciliation.discrepancy {
            output.push_str(&format!(
                "  DISCREPANCY: difference of {}\n",
                record.reconciliation.difference
            ));
        }
    }

    output
}
