//! Configuration structures for the order pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration for the ordex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrdexConfig {
    /// Document-understanding service configuration.
    pub document_ai: DocumentAiConfig,

    /// Address-validation service configuration.
    pub address_validation: AddressValidationConfig,

    /// Timeouts and retries shared by every outgoing request.
    pub http: HttpConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Output file configuration.
    pub output: OutputConfig,
}

/// Document-understanding service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentAiConfig {
    /// Cloud project that owns the processors.
    pub project_id: String,

    /// Processor location (`us`, `eu`).
    pub location: String,

    /// Processor returning text, tables and form fields.
    pub form_processor_id: String,

    /// Processor returning labeled entities. Skipped when empty.
    pub entity_processor_id: String,

    /// Pinned version of the entity processor.
    pub entity_processor_version: Option<String>,

    /// Environment variable holding the OAuth access token.
    pub access_token_env: String,
}

impl Default for DocumentAiConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            location: "us".to_string(),
            form_processor_id: String::new(),
            entity_processor_id: String::new(),
            entity_processor_version: None,
            access_token_env: "ORDEX_DOCUMENTAI_TOKEN".to_string(),
        }
    }
}

impl DocumentAiConfig {
    /// API endpoint for the configured location.
    pub fn endpoint(&self) -> String {
        format!("https://{}-documentai.googleapis.com/v1", self.location)
    }

    /// Resource name of the form processor.
    pub fn form_processor_name(&self) -> String {
        format!(
            "projects/{}/locations/{}/processors/{}",
            self.project_id, self.location, self.form_processor_id
        )
    }

    /// Resource name of the entity processor (version-qualified when pinned).
    pub fn entity_processor_name(&self) -> Option<String> {
        if self.entity_processor_id.is_empty() {
            return None;
        }
        let base = format!(
            "projects/{}/locations/{}/processors/{}",
            self.project_id, self.location, self.entity_processor_id
        );
        Some(match &self.entity_processor_version {
            Some(version) => format!("{}/processorVersions/{}", base, version),
            None => base,
        })
    }
}

/// Address-validation service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressValidationConfig {
    /// Call the service at all. When disabled, extracted address lines are
    /// treated as a service failure and the address is left blank.
    pub enabled: bool,

    /// `validateAddress` endpoint.
    pub endpoint: String,

    /// CLDR region code sent with every request.
    pub region_code: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for AddressValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://addressvalidation.googleapis.com/v1:validateAddress".to_string(),
            region_code: "GB".to_string(),
            api_key_env: "ORDEX_ADDRESS_API_KEY".to_string(),
        }
    }
}

/// Timeouts and retries for outgoing requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Retries after the first attempt.
    pub max_retries: u32,

    /// First backoff delay in milliseconds; doubled on each retry.
    pub retry_base_ms: u64,

    /// Upper bound for a single backoff delay in milliseconds.
    pub retry_max_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_retries: 2,
            retry_base_ms: 500,
            retry_max_ms: 4000,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// How a table header is matched when several mapping labels occur in it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMatchPriority {
    /// First label in mapping order wins.
    #[default]
    MappingOrder,
    /// Longest label wins; ties go to mapping order.
    LongestKey,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Header matching priority for table columns.
    pub header_match: HeaderMatchPriority,
}

/// HEAD/LINE/RECON output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Facility code written to HEAD and RECON rows.
    pub facility_code: String,

    /// Source-system code written to the RECON row.
    pub source_system: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            facility_code: "76001".to_string(),
            source_system: "HPC".to_string(),
        }
    }
}

impl OrdexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: OrdexConfig = serde_json::from_str(
            r#"{"extraction": {"header_match": "longest_key"}, "output": {"facility_code": "12000"}}"#,
        )
        .unwrap();

        assert_eq!(config.extraction.header_match, HeaderMatchPriority::LongestKey);
        assert_eq!(config.output.facility_code, "12000");
        assert_eq!(config.output.source_system, "HPC");
        assert_eq!(config.address_validation.region_code, "GB");
    }

    #[test]
    fn test_processor_names() {
        let config = DocumentAiConfig {
            project_id: "orders".to_string(),
            form_processor_id: "abc".to_string(),
            entity_processor_id: "def".to_string(),
            entity_processor_version: Some("v1".to_string()),
            ..Default::default()
        };

        assert_eq!(config.endpoint(), "https://us-documentai.googleapis.com/v1");
        assert_eq!(config.form_processor_name(), "projects/orders/locations/us/processors/abc");
        assert_eq!(
            config.entity_processor_name().unwrap(),
            "projects/orders/locations/us/processors/def/processorVersions/v1"
        );
    }
}
