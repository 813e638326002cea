use base64::Engine;
use serde::Serialize;

use super::types::{ExtractionClient, PageImage};
use super::ExtractionError;

/// HTTP client for the external extraction service.
///
/// The service takes page images and returns a structured JSON extraction;
/// its internals (vision model, prompting) are a black box. A timeout here
/// surfaces as an error and the document lands in the `error` state, never
/// an indefinite `processing`.
pub struct HttpExtractionClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
    /// Model id sent with each request; None lets the service pick its
    /// currently active version.
    model: Option<String>,
}

impl HttpExtractionClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
            model: None,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }
}

#[derive(Serialize)]
struct ExtractRequest<'a> {
    pages: Vec<ExtractPage>,
    model: Option<&'a str>,
}

#[derive(Serialize)]
struct ExtractPage {
    index: u32,
    mime_type: String,
    data: String,
}

impl ExtractionClient for HttpExtractionClient {
    fn extract(&self, pages: &[PageImage]) -> Result<serde_json::Value, ExtractionError> {
        let url = format!("{}/extract", self.base_url);
        let body = ExtractRequest {
            pages: pages
                .iter()
                .map(|p| ExtractPage {
                    index: p.index,
                    mime_type: p.mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(&p.data),
                })
                .collect(),
            model: self.model.as_deref(),
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                ExtractionError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                ExtractionError::HttpClient(format!(
                    "Request timed out after {}s",
                    self.timeout_secs
                ))
            } else {
                ExtractionError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractionError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .map_err(|e| ExtractionError::HttpClient(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| {
            ExtractionError::NonJson(format!("{e}: {}", text.chars().take(200).collect::<String>()))
        })
    }
}

/// Mock extraction client for tests: returns a canned payload or a canned
/// failure, and counts calls.
pub struct MockExtractionClient {
    response: Result<serde_json::Value, String>,
    calls: std::sync::atomic::AtomicUsize,
}

impl MockExtractionClient {
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            response: Ok(payload),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl ExtractionClient for MockExtractionClient {
    fn extract(&self, _pages: &[PageImage]) -> Result<serde_json::Value, ExtractionError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match &self.response {
            Ok(payload) => Ok(payload.clone()),
            Err(message) => Err(ExtractionError::Service {
                status: 502,
                body: message.clone(),
            }),
        }
    }
}
