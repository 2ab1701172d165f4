//! HTTP client for a PaddleOCR serving endpoint.

mod paddle_client;
mod paddle_config;

pub use paddle_client::PaddleClient;
pub use paddle_config::{PaddleConfig, PaddleConfigBuilder};
