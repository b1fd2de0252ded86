//! Blocking HTTP clients for the external services.

pub mod address;
pub mod documentai;

use std::fmt;

use ordex_core::models::config::HttpConfig;
use ordex_core::retry::{is_retryable_status, retry_with_backoff, RetryPolicy};
use reqwest::blocking::{Client, RequestBuilder};

pub use address::AddressValidationClient;
pub use documentai::DocumentAiClient;

/// A failed HTTP exchange.
#[derive(Debug)]
pub enum HttpFailure {
    /// No response was received.
    Transport(String),
    /// The service answered with a non-success status.
    Status { status: u16, body: String },
}

impl HttpFailure {
    fn is_retryable(&self) -> bool {
        match self {
            HttpFailure::Transport(_) => true,
            HttpFailure::Status { status, .. } => is_retryable_status(*status),
        }
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpFailure::Transport(e) => write!(f, "{}", e),
            HttpFailure::Status { status, body } if body.is_empty() => write!(f, "HTTP {}", status),
            HttpFailure::Status { status, body } => write!(f, "HTTP {}: {}", status, body),
        }
    }
}

/// Client with the configured request timeout.
pub fn build_client(http: &HttpConfig) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("ordex/", env!("CARGO_PKG_VERSION")))
        .timeout(http.timeout())
        .build()
}

/// Send the request built by `build`, retrying transient failures, and
/// return the response body.
pub fn send_with_retry<F>(policy: &RetryPolicy, operation: &str, build: F) -> Result<String, HttpFailure>
where
    F: Fn() -> RequestBuilder,
{
    retry_with_backoff(
        policy,
        operation,
        || {
            let response = build()
                .send()
                .map_err(|e| HttpFailure::Transport(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .map_err(|e| HttpFailure::Transport(e.to_string()))?;
            if status.is_success() {
                Ok(body)
            } else {
                Err(HttpFailure::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        },
        HttpFailure::is_retryable,
    )
}
