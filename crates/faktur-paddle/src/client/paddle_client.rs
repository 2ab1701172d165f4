//! PaddleOCR serving HTTP client implementation.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use faktur_core::ocr::{Error, ErrorKind, Result};
use faktur_core::types::{BoundingBox, TextFragment};

use super::PaddleConfig;
use crate::TRACING_TARGET;

/// HTTP client for a PaddleOCR serving endpoint.
///
/// Construction builds the underlying connection pool and validates the
/// configured headers; this is the one-time setup cost. Each call uploads
/// one PNG-encoded page and maps the recognized lines into
/// [`TextFragment`]s.
#[derive(Debug, Clone)]
pub struct PaddleClient {
    /// HTTP client
    http_client: Client,

    /// Configuration
    config: PaddleConfig,
}

impl PaddleClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: PaddleConfig) -> Result<Self> {
        let mut client_builder = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent());

        if let Some(api_key) = config.api_key() {
            let mut headers = reqwest::header::HeaderMap::new();
            let mut value =
                reqwest::header::HeaderValue::from_str(&format!("Bearer {api_key}"))
                    .map_err(|e| Error::with_source(ErrorKind::Authentication, Box::new(e)))?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
            client_builder = client_builder.default_headers(headers);
        }

        let http_client = client_builder
            .build()
            .map_err(|e| Error::internal_error_with_source(Box::new(e)))?;

        debug!(
            target: TRACING_TARGET,
            base_url = %config.base_url(),
            timeout = ?config.timeout(),
            "PaddleOCR client initialized"
        );

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &PaddleConfig {
        &self.config
    }

    /// Recognizes text on one PNG-encoded page.
    ///
    /// Returns the recognized lines as fragments tagged with `page_index`.
    /// An empty line list is a valid result and means the page carries no
    /// readable text.
    pub(crate) async fn recognize_page(
        &self,
        png_data: &[u8],
        page_index: u32,
        language: &str,
    ) -> Result<RecognizedPage> {
        let url = self
            .config
            .base_url()
            .join("/ocr/v1/recognize")
            .map_err(|e| Error::with_source(ErrorKind::InvalidInput, Box::new(e)))?;

        debug!(
            target: TRACING_TARGET,
            url = %url,
            size = png_data.len(),
            page = page_index,
            "Uploading page to PaddleOCR"
        );

        let part = reqwest::multipart::Part::bytes(png_data.to_vec())
            .file_name(format!("page-{page_index}.png"))
            .mime_str("image/png")
            .map_err(|e| Error::with_source(ErrorKind::InvalidInput, Box::new(e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("language", language.to_string());

        let response = self
            .http_client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(classify_transport_error)?;

        self.handle_response(response, page_index).await
    }

    /// Health check against the serving endpoint.
    pub async fn health_check(&self) -> Result<()> {
        let url = self
            .config
            .base_url()
            .join("/health")
            .map_err(|e| Error::with_source(ErrorKind::InvalidInput, Box::new(e)))?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(classify_transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::service_unavailable())
        }
    }

    /// Maps an HTTP response into recognized fragments.
    async fn handle_response(
        &self,
        response: reqwest::Response,
        page_index: u32,
    ) -> Result<RecognizedPage> {
        let status = response.status();

        debug!(
            target: TRACING_TARGET,
            status = status.as_u16(),
            page = page_index,
            "Received response from PaddleOCR"
        );

        if status.is_success() {
            let body: ApiResponse<EnginePage> = response
                .json()
                .await
                .map_err(|e| Error::parse_error_with_source(Box::new(e)))?;

            if !body.success {
                error!(
                    target: TRACING_TARGET,
                    message = body.message.as_deref().unwrap_or("unknown"),
                    "Engine reported failure"
                );
                return Err(Error::internal_error());
            }

            let page = body.data.unwrap_or_default();
            let fragments = page
                .lines
                .iter()
                .map(|line| line.to_fragment(page_index))
                .collect();

            return Ok(RecognizedPage {
                fragments,
                processing_time_ms: page.processing_time_ms,
            });
        }

        let error = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::authentication(),
            StatusCode::PAYLOAD_TOO_LARGE => Error::new(ErrorKind::ImageTooLarge),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => Error::unsupported_format(),
            StatusCode::TOO_MANY_REQUESTS => Error::rate_limited(),
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                Error::service_unavailable()
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Error::timeout(),
            status if status.is_client_error() => Error::invalid_input(),
            _ => Error::internal_error(),
        };

        warn!(
            target: TRACING_TARGET,
            status = status.as_u16(),
            error = %error,
            page = page_index,
            "PaddleOCR request failed"
        );

        Err(error)
    }
}

/// Classifies reqwest transport failures into the shared error taxonomy.
fn classify_transport_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::with_source(ErrorKind::Timeout, Box::new(error))
    } else if error.is_connect() {
        Error::with_source(ErrorKind::ServiceUnavailable, Box::new(error))
    } else {
        Error::network_error_with_source(Box::new(error))
    }
}

/// Fragments plus timing for one recognized page.
#[derive(Debug, Clone)]
pub(crate) struct RecognizedPage {
    pub fragments: Vec<TextFragment>,
    pub processing_time_ms: Option<u64>,
}

/// Generic API response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiResponse<T> {
    /// Whether the request was successful
    success: bool,

    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,

    /// Optional error message
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Recognized lines for one page as reported by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EnginePage {
    /// Recognized lines in the engine's reading order.
    #[serde(default)]
    lines: Vec<EngineLine>,

    /// Engine-side processing time in milliseconds.
    #[serde(default)]
    processing_time_ms: Option<u64>,
}

/// One recognized line: text, box as `[x, y, width, height]`, confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EngineLine {
    text: String,
    bbox: [f32; 4],
    score: f32,
}

impl EngineLine {
    fn to_fragment(&self, page_index: u32) -> TextFragment {
        TextFragment::new(
            self.text.clone(),
            BoundingBox::new(self.bbox[0], self.bbox[1], self.bbox[2], self.bbox[3]),
            self.score.clamp(0.0, 1.0),
            page_index,
        )
    }
}
