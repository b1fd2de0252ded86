//! Document AI `:process` client.

use std::fs;
use std::path::Path;

use anyhow::Context;
use base64::Engine;
use ordex_core::models::config::{DocumentAiConfig, OrdexConfig};
use ordex_core::models::document::{MimeType, RawDocument};
use ordex_core::retry::RetryPolicy;
use ordex_core::{DocumentError, DocumentProcessor};
use reqwest::blocking::Client;
use serde_json::json;
use tracing::{debug, info};

use super::{build_client, send_with_retry};

/// Calls the form parser and, when configured, the entity extractor, and
/// merges both results into one document.
pub struct DocumentAiClient {
    config: DocumentAiConfig,
    access_token: String,
    client: Client,
    policy: RetryPolicy,
}

impl DocumentAiClient {
    pub fn from_config(config: &OrdexConfig) -> anyhow::Result<Self> {
        let document_ai = &config.document_ai;
        if document_ai.project_id.is_empty() || document_ai.form_processor_id.is_empty() {
            anyhow::bail!(
                "document_ai.project_id and document_ai.form_processor_id must be configured (or pass --document)"
            );
        }

        let access_token = std::env::var(&document_ai.access_token_env)
            .with_context(|| format!("{} is not set", document_ai.access_token_env))?;

        Ok(Self {
            config: document_ai.clone(),
            access_token,
            client: build_client(&config.http)?,
            policy: RetryPolicy::from(&config.http),
        })
    }

    fn call(&self, processor_name: &str, content: &str, mime_type: MimeType) -> Result<RawDocument, DocumentError> {
        let url = format!("{}/{}:process", self.config.endpoint(), processor_name);
        let body = json!({
            "rawDocument": {
                "content": content,
                "mimeType": mime_type.as_str(),
            }
        });

        debug!(processor = processor_name, "Calling document processor");
        let response = send_with_retry(&self.policy, "document_ai", || {
            self.client
                .post(&url)
                .bearer_auth(&self.access_token)
                .json(&body)
        })
        .map_err(|e| DocumentError::Service(e.to_string()))?;

        RawDocument::from_json(&response)
    }
}

impl DocumentProcessor for DocumentAiClient {
    fn process(&self, path: &Path, mime_type: MimeType) -> Result<RawDocument, DocumentError> {
        let bytes = fs::read(path)?;
        let content = base64::engine::general_purpose::STANDARD.encode(&bytes);

        let mut document = self.call(&self.config.form_processor_name(), &content, mime_type)?;

        if let Some(entity_processor) = self.config.entity_processor_name() {
            let labeled = self.call(&entity_processor, &content, mime_type)?;
            document.entities = labeled.entities;
        }

        info!(
            bytes = bytes.len(),
            pages = document.pages.len(),
            entities = document.entities.len(),
            "Document AI processing complete"
        );
        Ok(document)
    }
}
