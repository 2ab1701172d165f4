//! Request types for OCR operations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::PageImage;

/// Request to recognize text on one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Unique identifier for this request.
    pub request_id: Uuid,
    /// The page to recognize.
    pub page: PageImage,
    /// Processing options.
    pub options: RequestOptions,
}

/// Processing options for OCR requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Language hint for the recognition model.
    pub language: String,
    /// Custom parameters forwarded to specific engines.
    pub custom_parameters: HashMap<String, serde_json::Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            custom_parameters: HashMap::new(),
        }
    }
}

impl Request {
    /// Creates a request for one page with default options.
    pub fn new(page: PageImage) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            page,
            options: RequestOptions::default(),
        }
    }

    /// Sets the language hint.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.options.language = language.into();
        self
    }

    /// Adds a custom engine parameter.
    pub fn with_custom_parameter(mut self, key: String, value: serde_json::Value) -> Self {
        self.options.custom_parameters.insert(key, value);
        self
    }
}
