//! Shared extraction pipeline: text acquisition and parsing.
//!
//! Both the `process` and `batch` commands route through here so a
//! single file and a folder of files behave identically.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use fatex_core::error::ExtractionError;
use fatex_core::llm::RemoteLlmClient;
use fatex_core::{
    ExtractionResult, FatexConfig, InvoiceParser, InvoiceTextParser, PdfExtractor, PdfKind,
    PdfProcessor, Reconciler, RemoteOcrClient, SourceKind, TextRecognizer,
};

/// Invoice text with its acquisition route.
pub struct AcquiredText {
    pub full_text: String,
    pub last_page_text: String,
    pub kind: SourceKind,
}

/// Where a document's text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextRoute {
    Embedded,
    Remote,
}

/// Decide the acquisition route from the document kind and the flags.
///
/// Embedded text is used for text-bearing documents when preferred or
/// when `--text-only` forbids OCR; everything else that is allowed to
/// go out goes to the OCR service, including text documents when
/// `prefer_embedded_text` is off.
fn choose_route(kind: PdfKind, prefer_embedded: bool, text_only: bool) -> anyhow::Result<TextRoute> {
    match kind {
        PdfKind::Text | PdfKind::Hybrid if prefer_embedded || text_only => Ok(TextRoute::Embedded),
        PdfKind::Text | PdfKind::Hybrid | PdfKind::Image if !text_only => Ok(TextRoute::Remote),
        PdfKind::Empty => anyhow::bail!("PDF contains neither text nor images"),
        _ => anyhow::bail!("PDF is image-based but --text-only was set; remove the flag to use OCR"),
    }
}

/// Build a parser wired to the configured tolerances.
pub fn build_parser(config: &FatexConfig) -> InvoiceTextParser {
    InvoiceTextParser::new()
        .with_reconciler(Reconciler::from_config(&config.extraction))
        .with_required_product_code(config.extraction.require_product_code)
}

/// Load a PDF and acquire its text, natively or via the OCR service.
pub async fn acquire_text(
    path: &Path,
    config: &FatexConfig,
    text_only: bool,
) -> anyhow::Result<AcquiredText> {
    let data = fs::read(path)?;
    let mut extractor = PdfExtractor::new();
    extractor.load(&data)?;

    let kind = extractor.analyze();
    debug!("{}: {} pages, {:?}", path.display(), extractor.page_count(), kind);

    let route = choose_route(kind, config.pdf.prefer_embedded_text, text_only)
        .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;

    match route {
        TextRoute::Embedded => {
            let full_text = extractor.extract_text()?;

            if !text_only && full_text.trim().len() < config.pdf.min_text_length {
                warn!(
                    "{}: only {} characters of embedded text, routing to OCR",
                    path.display(),
                    full_text.trim().len()
                );
                return recognize_remote(&extractor, config).await;
            }

            let last_page_text = extractor.last_page_text()?;
            Ok(AcquiredText {
                full_text,
                last_page_text,
                kind: SourceKind::TextPdf,
            })
        }
        TextRoute::Remote => recognize_remote(&extractor, config).await,
    }
}

async fn recognize_remote(
    extractor: &PdfExtractor,
    config: &FatexConfig,
) -> anyhow::Result<AcquiredText> {
    let client = RemoteOcrClient::new(config.ocr.clone())?;
    let full_text = client.recognize(extractor.raw_data()).await?;

    // OCR output carries no reliable page boundaries, so the trigger
    // scan runs over the whole recognized text.
    Ok(AcquiredText {
        last_page_text: full_text.clone(),
        full_text,
        kind: SourceKind::OcrPdf,
    })
}

/// Acquire text and parse it into an invoice record.
///
/// When the LLM fallback is enabled and the rules leave gaps (or fail
/// on a missing field), a summary is requested and the parse is rerun
/// with it. PDF-extracted values are never overwritten either way.
pub async fn extract_record(
    path: &Path,
    config: &FatexConfig,
    parser: &InvoiceTextParser,
    text_only: bool,
) -> anyhow::Result<ExtractionResult> {
    let source = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice.pdf")
        .to_string();

    let acquired = acquire_text(path, config, text_only).await?;

    let first = parser.parse(&source, &acquired.full_text, &acquired.last_page_text);

    let needs_summary = match &first {
        Ok(result) => {
            result.record.invoice_number.is_none() || result.record.invoice_date.is_none()
        }
        Err(ExtractionError::MissingField(_)) => true,
        Err(_) => false,
    };

    let mut result = if config.llm.enabled && needs_summary {
        match request_summary(config, &acquired.full_text).await {
            Ok(summary) => parser.parse_with_summary(
                &source,
                &acquired.full_text,
                &acquired.last_page_text,
                Some(&summary),
            )?,
            Err(e) => {
                warn!("LLM fallback failed, keeping rule-only result: {}", e);
                first?
            }
        }
    } else {
        first?
    };

    if result.record.source_kind == SourceKind::Unknown {
        result.record.source_kind = acquired.kind;
    }

    Ok(result)
}

async fn request_summary(
    config: &FatexConfig,
    text: &str,
) -> anyhow::Result<fatex_core::llm::SummaryFields> {
    let client = RemoteLlmClient::new(config.llm.clone())?;
    Ok(client.extract_summary(text).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_prefers_embedded_by_default() {
        let route = choose_route(PdfKind::Text, true, false).unwrap();
        assert_eq!(route, TextRoute::Embedded);
    }

    #[test]
    fn test_text_routes_to_ocr_when_embedded_not_preferred() {
        let route = choose_route(PdfKind::Text, false, false).unwrap();
        assert_eq!(route, TextRoute::Remote);

        let route = choose_route(PdfKind::Hybrid, false, false).unwrap();
        assert_eq!(route, TextRoute::Remote);
    }

    #[test]
    fn test_text_only_forces_embedded() {
        let route = choose_route(PdfKind::Text, false, true).unwrap();
        assert_eq!(route, TextRoute::Embedded);
    }

    #[test]
    fn test_image_routes_to_ocr() {
        let route = choose_route(PdfKind::Image, true, false).unwrap();
        assert_eq!(route, TextRoute::Remote);
    }

    #[test]
    fn test_image_with_text_only_errors() {
        let err = choose_route(PdfKind::Image, true, true).unwrap_err();
        assert!(err.to_string().contains("--text-only"));
    }

    #[test]
    fn test_empty_document_errors() {
        let err = choose_route(PdfKind::Empty, true, false).unwrap_err();
        assert!(err.to_string().contains("neither text nor images"));
    }
}
