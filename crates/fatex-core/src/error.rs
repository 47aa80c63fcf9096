//! Error types for the fatex-core library.

use thiserror::Error;

/// Main error type for the fatex library.
#[derive(Error, Debug)]
pub enum FatexError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR service error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Transaction file error.
    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    /// Report emission error.
    #[error("report error: {0}")]
    Report(#[from] ReportError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors from the external OCR service.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The API key could not be resolved.
    #[error("missing API key: set the {0} environment variable")]
    MissingApiKey(String),

    /// The HTTP request to the OCR service failed.
    #[error("OCR request failed: {0}")]
    Request(String),

    /// The OCR service returned an error response.
    #[error("OCR service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The OCR service returned no usable text.
    #[error("OCR produced no text")]
    EmptyResult,
}

/// Errors related to invoice field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Required field is missing.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Failed to parse a value.
    #[error("failed to parse {field}: {value}")]
    Parse { field: String, value: String },

    /// No invoice data could be extracted.
    #[error("no invoice data found")]
    NoData,
}

/// Errors related to the transaction file.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// The file could not be read or parsed as CSV.
    #[error("failed to read transaction file: {0}")]
    Read(String),

    /// A required column could not be located by keyword.
    #[error("missing transaction column: {0}")]
    MissingColumn(String),

    /// A cell value could not be parsed.
    #[error("failed to parse transaction value in column {column}: {value}")]
    Parse { column: String, value: String },
}

/// Errors related to report emission.
#[derive(Error, Debug)]
pub enum ReportError {
    /// CSV serialization failed.
    #[error("CSV write failed: {0}")]
    Csv(String),

    /// Manifest serialization failed.
    #[error("manifest write failed: {0}")]
    Manifest(String),

    /// I/O error while writing an output file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for ReportError {
    fn from(e: csv::Error) -> Self {
        ReportError::Csv(e.to_string())
    }
}

/// Result type for the fatex library.
pub type Result<T> = std::result::Result<T, FatexError>;
