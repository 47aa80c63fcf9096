//! HTTP client for the external OCR service.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use super::{Result, TextRecognizer};
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Client posting PDF documents to an OCR endpoint.
pub struct RemoteOcrClient {
    config: OcrConfig,
    api_key: String,
    client: reqwest::Client,
}

/// Response shape of the OCR service.
#[derive(Debug, Deserialize)]
struct OcrResponse {
    /// Recognized text per page, in page order.
    #[serde(default)]
    pages: Vec<OcrPage>,
    /// Flat text fallback for services that do not paginate.
    #[serde(default)]
    text: Option<String>,
    /// Service-side error message, if any.
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OcrPage {
    text: String,
}

impl RemoteOcrClient {
    /// Create a client, resolving the API key from the configured
    /// environment variable.
    pub fn new(config: OcrConfig) -> Result<Self> {
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

    /// Create a client with an explicit API key (used by tests and by
    /// callers that manage secrets themselves).
    pub fn with_api_key(config: OcrConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OcrError::Request(e.to_string()))?;

        Ok(Self {
            config,
            api_key: api_key.into(),
            client,
        })
    }
}

impl TextRecognizer for RemoteOcrClient {
    async fn recognize(&self, pdf_data: &[u8]) -> Result<String> {
        debug!(
            "Posting {} bytes to OCR service at {}",
            pdf_data.len(),
            self.config.endpoint
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/pdf")
            .query(&[("language", self.config.language.as_str())])
            .body(pdf_data.to_vec())
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

        let body: OcrResponse = response
            .json()
            .await
            .map_err(|e| OcrError::Request(e.to_string()))?;

        if let Some(error) = body.error {
            warn!("OCR service reported an error: {}", error);
            return Err(OcrError::Service {
                status: status.as_u16(),
                message: error,
            });
        }

        let text = if body.pages.is_empty() {
            body.text.unwrap_or_default()
        } else {
            body.pages
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        if text.trim().is_empty() {
            return Err(OcrError::EmptyResult);
        }

        debug!("OCR service returned {} characters", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key() {
        let mut config = OcrConfig::default();
        config.api_key_env = "FATEX_TEST_KEY_THAT_DOES_NOT_EXIST".to_string();

        let result = RemoteOcrClient::new(config);
        assert!(matches!(result, Err(OcrError::MissingApiKey(_))));
    }

    #[test]
    fn test_explicit_api_key() {
        let client = RemoteOcrClient::with_api_key(OcrConfig::default(), "secret");
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_recognize_unreachable_endpoint() {
        let mut config = OcrConfig::default();
        config.endpoint = "http://127.0.0.1:9/parse".to_string();
        config.timeout_secs = 1;

        let client = RemoteOcrClient::with_api_key(config, "secret").unwrap();
        let err = client.recognize(b"%PDF-1.4").await.unwrap_err();
        assert!(matches!(err, OcrError::Request(_)));
    }

    #[test]
    fn test_response_paginated_parse() {
        let body: OcrResponse = serde_json::from_str(
            r#"{"pages": [{"text": "page one"}, {"text": "page two"}]}"#,
        )
        .unwrap();
        assert_eq!(body.pages.len(), 2);
        assert!(body.text.is_none());
    }

    #[test]
    fn test_response_flat_parse() {
        let body: OcrResponse = serde_json::from_str(r#"{"text": "all text"}"#).unwrap();
        assert!(body.pages.is_empty());
        assert_eq!(body.text.as_deref(), Some("all text"));
    }
}
