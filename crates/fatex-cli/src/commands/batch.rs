//! Batch command - process a folder of invoice PDFs.
//!
//! Emits one upload-template CSV per invoice, the aggregate upload
//! pair, and an error report for the files that failed. A failed file
//! never aborts the rest of the batch.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use fatex_core::report::{build_report_rows, write_error_report, write_invoice_report, UploadWriter};
use fatex_core::{FatexConfig, InvoiceRecord, TransactionBook};

use super::pipeline;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input directory or glob pattern
    #[arg(short, long)]
    source: String,

    /// Output directory
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Transaction CSV used to enrich the report rows
    #[arg(short, long)]
    transactions: Option<PathBuf>,

    /// Also generate a summary CSV covering every file, failures included
    #[arg(long)]
    summary: bool,

    /// Skip OCR and use only embedded PDF text
    #[arg(long)]
    text_only: bool,

    /// Abort on the first failed file instead of collecting errors
    #[arg(long)]
    fail_fast: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = if let Some(path) = config_path {
        FatexConfig::from_file(std::path::Path::new(path))?
    } else {
        FatexConfig::default()
    };

    let files = collect_input_files(&args.source)?;
    if files.is_empty() {
        anyhow::bail!("No PDF files found for: {}", args.source);
    }

    println!(
        "{} Found {} invoices to process",
        style("ℹ").blue(),
        files.len()
    );

    fs::create_dir_all(&args.output_dir)?;

    let transactions = match &args.transactions {
        Some(path) => {
            let book = TransactionBook::load(path)?;
            println!(
                "{} Loaded {} transaction rows from {}",
                style("ℹ").blue(),
                book.rows().len(),
                path.display()
            );
            Some(book)
        }
        None => None,
    };

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let parser = pipeline::build_parser(&config);

    let mut records: Vec<InvoiceRecord> = Vec::with_capacity(files.len());
    let mut failures: Vec<(String, String)> = Vec::new();

    for path in &files {
        let result = pipeline::extract_record(path, &config, &parser, args.text_only).await;

        match result {
            Ok(extraction) => {
                let record = extraction.record;

                let rows = build_report_rows(&record, transactions.as_ref());
                let report_path = per_invoice_report_path(&args.output_dir, path);
                if let Err(e) = write_invoice_report(&report_path, &rows) {
                    warn!("Failed to write {}: {}", report_path.display(), e);
                } else {
                    debug!("Wrote report to {}", report_path.display());
                }

                records.push(record);
            }
            Err(e) => {
                let source = path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or("invoice.pdf")
                    .to_string();
                let message = e.to_string();

                if args.fail_fast {
                    anyhow::bail!("Processing failed for {}: {}", source, message);
                }

                warn!("Failed to process {}: {}", source, message);
                failures.push((source, message));
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    // Aggregate upload pair covering every successful invoice
    if !records.is_empty() {
        let writer = UploadWriter::new(
            &args.output_dir,
            &config.report.upload_stem,
            config.report.currency.clone(),
        );
        writer.write(&records)?;
        println!(
            "{} Upload pair written: {} + {}",
            style("✓").green(),
            writer.csv_path().display(),
            writer.manifest_path().display()
        );
    }

    if !failures.is_empty() {
        let errors_path = args.output_dir.join("errors.csv");
        write_error_report(&errors_path, &failures)?;
        println!(
            "{} Error report written to {}",
            style("✓").green(),
            errors_path.display()
        );
    }

    if args.summary {
        let summary_path = args.output_dir.join("summary.csv");
        write_summary(&summary_path, &records, &failures)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let discrepancies = records
        .iter()
        .filter(|r| r.reconciliation.discrepancy)
        .count();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        files.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} flagged for review",
        style(records.len()).green(),
        style(failures.len()).red(),
        style(discrepancies).yellow()
    );

    if !failures.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for (source, error) in &failures {
            println!("  - {}: {}", source, error);
        }
    }

    Ok(())
}

/// Expand the input argument into a sorted list of PDF paths.
///
/// A directory means every `*.pdf` directly inside it; anything else
/// is treated as a glob pattern.
fn collect_input_files(input: &str) -> anyhow::Result<Vec<PathBuf>> {
    let input_path = Path::new(input);

    let mut files: Vec<PathBuf> = if input_path.is_dir() {
        fs::read_dir(input_path)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| is_pdf(p))
            .collect()
    } else {
        glob(input)?
            .filter_map(|r| r.ok())
            .filter(|p| is_pdf(p))
            .collect()
    };

    files.sort();
    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// One row per file, successes and failures side by side.
fn write_summary(
    path: &Path,
    records: &[InvoiceRecord],
    failures: &[(String, String)],
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "invoice_number",
        "invoice_date",
        "product_code",
        "net_amount",
        "computed_gross",
        "discrepancy",
        "error",
    ])?;

    for record in records {
        wtr.write_record([
            record.source.as_str(),
            "success",
            record.invoice_number.as_deref().unwrap_or(""),
            &record
                .invoice_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            record.product_code.display(),
            &record.net_amount.to_string(),
            &record.reconciliation.computed_gross.to_string(),
            if record.reconciliation.discrepancy {
                "true"
            } else {
                "false"
            },
            "",
        ])?;
    }

    for (source, error) in failures {
        wtr.write_record([source, "error", "", "", "", "", "", "", error])?;
    }

    wtr.flush()?;
    Ok(())
}

fn per_invoice_report_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice");
    output_dir.join(format!("output_{}.csv", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.pdf"), b"x").unwrap();
        fs::write(dir.path().join("b.PDF"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let files = collect_input_files(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_collect_from_glob() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("inv_1.pdf"), b"x").unwrap();
        fs::write(dir.path().join("other.pdf"), b"x").unwrap();

        let pattern = format!("{}/inv_*.pdf", dir.path().display());
        let files = collect_input_files(&pattern).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_report_path_uses_stem() {
        let path = per_invoice_report_path(Path::new("out"), Path::new("in/fatura_06.pdf"));
        assert_eq!(path, PathBuf::from("out/output_fatura_06.csv"));
    }
}
