//! Core library for Turkish invoice processing.
//!
//! This crate provides:
//! - PDF processing (text extraction and scan detection)
//! - External OCR / LLM service clients
//! - Partner Fillo field extraction (product code, amounts, VAT, dates)
//! - Reconciliation of computed versus stated gross totals
//! - Transaction enrichment and report/upload emission

pub mod error;
pub mod invoice;
pub mod llm;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod reconcile;
pub mod report;
pub mod transactions;

pub use error::{FatexError, Result};
pub use invoice::{ExtractionResult, InvoiceParser, InvoiceTextParser};
pub use models::config::FatexConfig;
pub use models::invoice::{InvoiceRecord, ProductCode, Reconciliation, SourceKind};
pub use ocr::{RemoteOcrClient, TextRecognizer};
pub use pdf::{PdfExtractor, PdfKind, PdfProcessor};
pub use reconcile::Reconciler;
pub use transactions::{TransactionBook, TransactionRow};
