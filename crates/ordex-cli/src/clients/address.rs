//! Address Validation API client.

use anyhow::Context;
use ordex_core::address::{AddressValidationRequest, AddressValidationResponse, AddressValidator};
use ordex_core::models::config::OrdexConfig;
use ordex_core::retry::RetryPolicy;
use ordex_core::AddressError;
use reqwest::blocking::Client;
use tracing::debug;

use super::{build_client, send_with_retry, HttpFailure};

pub struct AddressValidationClient {
    endpoint: String,
    api_key: String,
    client: Client,
    policy: RetryPolicy,
}

impl AddressValidationClient {
    pub fn from_config(config: &OrdexConfig) -> anyhow::Result<Self> {
        let settings = &config.address_validation;
        let api_key = std::env::var(&settings.api_key_env)
            .with_context(|| format!("{} is not set", settings.api_key_env))?;

        Ok(Self {
            endpoint: settings.endpoint.clone(),
            api_key,
            client: build_client(&config.http)?,
            policy: RetryPolicy::from(&config.http),
        })
    }
}

impl AddressValidator for AddressValidationClient {
    fn validate(
        &self,
        request: &AddressValidationRequest,
    ) -> Result<AddressValidationResponse, AddressError> {
        debug!(lines = request.address.address_lines.len(), "Validating address");

        let body = match send_with_retry(&self.policy, "address_validation", || {
            self.client
                .post(&self.endpoint)
                .query(&[("key", self.api_key.as_str())])
                .json(request)
        }) {
            Ok(body) => body,
            // Error responses carry an `error` object the resolver reports.
            Err(HttpFailure::Status { status, body }) => {
                return match serde_json::from_str::<AddressValidationResponse>(&body) {
                    Ok(response) if response.error.is_some() => Ok(response),
                    _ => Err(AddressError::Service(format!("HTTP {}", status))),
                };
            }
            Err(e @ HttpFailure::Transport(_)) => return Err(AddressError::Transport(e.to_string())),
        };

        serde_json::from_str(&body).map_err(|e| AddressError::Response(e.to_string()))
    }
}
