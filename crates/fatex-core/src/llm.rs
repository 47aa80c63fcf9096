//! Optional LLM fallback for fields the rules could not extract.
//!
//! Calls an OpenAI-compatible chat completions endpoint and expects a
//! JSON object back. Values from here only ever fill gaps; fields the
//! rules extracted from the PDF are never overwritten.

use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::OcrError;
use crate::models::config::LlmConfig;

/// Result type reusing the external-service error kind.
pub type Result<T> = std::result::Result<T, OcrError>;

/// Summary fields the LLM can recover from invoice text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryFields {
    /// Invoice number, e.g. "PFS2025000001235".
    pub invoice_number: Option<String>,

    /// Invoice date in ISO format.
    pub invoice_date: Option<String>,

    /// VAT percentage as stated on the invoice (e.g. 20 or 10).
    pub vat_percentage: Option<Decimal>,
}

impl SummaryFields {
    /// Parse the ISO invoice date, if present and well-formed.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.invoice_date
            .as_deref()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    /// VAT rate as a decimal fraction (20 -> 0.20).
    pub fn vat_rate(&self) -> Option<Decimal> {
        self.vat_percentage.map(|p| p / Decimal::ONE_HUNDRED)
    }
}

/// Client for the chat completions endpoint.
pub struct RemoteLlmClient {
    config: LlmConfig,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

const EXTRACTION_PROMPT: &str = "From the provided text of a Turkish invoice, extract these \
fields and return a single JSON object: invoice_number (the PFS... number), invoice_date \
(reformatted to YYYY-MM-DD), vat_percentage (the main VAT rate as a number, e.g. 20 or 10). \
Use null for anything not present.";

impl RemoteLlmClient {
    /// Create a client, resolving the API key from the configured
    /// environment variable.
    pub fn new(config: LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| OcrError::MissingApiKey(config.api_key_env.clone()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OcrError::Request(e.to_string()))?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    /// Ask the model for the summary fields of an invoice text.
    ///
    /// Only the head of the text is sent; the summary block sits on the
    /// first page of this vendor's invoices.
    pub async fn extract_summary(&self, text: &str) -> Result<SummaryFields> {
        let excerpt: String = text.chars().take(4000).collect();

        let payload = json!({
            "model": self.config.model,
            "temperature": 0.0,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": EXTRACTION_PROMPT},
                {"role": "user", "content": excerpt},
            ],
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| OcrError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OcrError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| OcrError::Request(e.to_string()))?;

        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or_default();

        debug!("LLM summary response: {}", content);

        serde_json::from_str(content).map_err(|e| {
            warn!("LLM returned unparseable JSON: {}", e);
            OcrError::Request(format!("unparseable LLM response: {}", e))
        })
    }
}
