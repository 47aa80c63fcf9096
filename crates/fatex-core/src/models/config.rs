//! Configuration structures for the processing pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main configuration for the fatex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FatexConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// External OCR service configuration.
    pub ocr: OcrConfig,

    /// LLM fallback configuration.
    pub llm: LlmConfig,

    /// Field extraction and reconciliation configuration.
    pub extraction: ExtractionConfig,

    /// Report emission configuration.
    pub report: ReportConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Try embedded text before falling back to OCR.
    pub prefer_embedded_text: bool,

    /// Minimum extracted text length to treat the PDF as text-based.
    /// Below this the document is considered a scan and routed to OCR.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            prefer_embedded_text: true,
            min_text_length: 100,
        }
    }
}

/// External OCR service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// HTTP endpoint accepting PDF uploads and returning recognized text.
    pub endpoint: String,

    /// Name of the environment variable holding the API key.
    pub api_key_env: String,

    /// Recognition language hint passed to the service.
    pub language: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.ocr.example/v1/parse".to_string(),
            api_key_env: "FATEX_OCR_API_KEY".to_string(),
            language: "tur".to_string(),
            timeout_secs: 120,
        }
    }
}

/// LLM fallback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Whether the LLM fallback is consulted for missing fields.
    pub enabled: bool,

    /// OpenAI-compatible chat completions endpoint.
    pub endpoint: String,

    /// Model identifier.
    pub model: String,

    /// Name of the environment variable holding the API key.
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "FATEX_LLM_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Field extraction and reconciliation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Absolute reconciliation tolerance in currency units.
    pub tolerance_abs: Decimal,

    /// Relative reconciliation tolerance (fraction of computed gross).
    pub tolerance_rel: Decimal,

    /// Treat an unknown product code as an extraction failure.
    pub require_product_code: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            tolerance_abs: Decimal::new(5, 2),  // 0.05
            tolerance_rel: Decimal::new(1, 3),  // 0.001
            require_product_code: false,
        }
    }
}

/// Report emission configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Currency code used in the reports.
    pub currency: String,

    /// File stem for the aggregate upload pair (stem.csv + stem.fatx).
    pub upload_stem: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            currency: "TRY".to_string(),
            upload_stem: "upload".to_string(),
        }
    }
}

impl FatexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FatexConfig::default();
        assert!(config.pdf.prefer_embedded_text);
        assert_eq!(config.pdf.min_text_length, 100);
        assert_eq!(config.extraction.tolerance_abs, Decimal::new(5, 2));
        assert!(!config.llm.enabled);
        assert_eq!(config.report.currency, "TRY");
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = FatexConfig::default();
        config.ocr.language = "eng".to_string();
        config.save(&path).unwrap();

        let loaded = FatexConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ocr.language, "eng");
        assert_eq!(loaded.extraction.tolerance_rel, Decimal::new(1, 3));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: FatexConfig =
            serde_json::from_str(r#"{"extraction": {"tolerance_abs": "0.10"}}"#).unwrap();
        assert_eq!(config.extraction.tolerance_abs, Decimal::new(10, 2));
        assert_eq!(config.pdf.min_text_length, 100);
    }
}
