//! End-to-end processing of one order document.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span};

use crate::address::{AddressResolver, AddressValidator};
use crate::error::{DocumentError, OrdexError, Result};
use crate::extract::{EntityGrouper, FormFieldMapper, TableColumnMapper, TextFieldExtractor};
use crate::models::config::OrdexConfig;
use crate::models::customer::CustomerProfile;
use crate::models::document::{MimeType, RawDocument};
use crate::output::{CsvSerializer, CsvStatus};
use crate::reconcile::FieldReconciler;

/// Message returned when a document yields no usable order record.
pub const NO_DATA_MESSAGE: &str = "PDF file is not valid for CSV generation.";

/// Trait for document-understanding collaborators.
pub trait DocumentProcessor {
    /// Produce the document-understanding result for one input file.
    fn process(&self, path: &Path, mime_type: MimeType) -> std::result::Result<RawDocument, DocumentError>;
}

/// Serves a stored document-understanding result instead of calling a service.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    path: PathBuf,
}

impl StoredDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentProcessor for StoredDocument {
    fn process(&self, _path: &Path, _mime_type: MimeType) -> std::result::Result<RawDocument, DocumentError> {
        RawDocument::from_file(&self.path)
    }
}

/// Terminal status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Success,
    NoData,
    Error,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Success => "success",
            PipelineStatus::NoData => "no_data",
            PipelineStatus::Error => "error",
        }
    }
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub status: PipelineStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PipelineResult {
    pub fn success(csv_path: PathBuf) -> Self {
        Self {
            status: PipelineStatus::Success,
            csv_path: Some(csv_path),
            message: None,
        }
    }

    pub fn no_data() -> Self {
        Self {
            status: PipelineStatus::NoData,
            csv_path: None,
            message: Some(NO_DATA_MESSAGE.to_string()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: PipelineStatus::Error,
            csv_path: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PipelineStatus::Success
    }
}

impl From<&OrdexError> for PipelineResult {
    fn from(e: &OrdexError) -> Self {
        match e {
            OrdexError::Reconcile(_) => PipelineResult::no_data(),
            other => PipelineResult::error(other.to_string()),
        }
    }
}

/// Runs every stage for one document and writes the order file.
pub struct OrderPipeline<'a> {
    config: &'a OrdexConfig,
    processor: &'a dyn DocumentProcessor,
    validator: Option<&'a dyn AddressValidator>,
}

impl<'a> OrderPipeline<'a> {
    pub fn new(config: &'a OrdexConfig, processor: &'a dyn DocumentProcessor) -> Self {
        Self {
            config,
            processor,
            validator: None,
        }
    }

    /// Set the address-validation collaborator. Ignored when address
    /// validation is disabled in the configuration.
    pub fn with_validator(mut self, validator: &'a dyn AddressValidator) -> Self {
        if self.config.address_validation.enabled {
            self.validator = Some(validator);
        }
        self
    }

    /// Process `input` for `customer` and write the result to `output`.
    ///
    /// Never fails: every failure is logged and reported as a status.
    pub fn run(&self, input: &Path, customer: &CustomerProfile, output: &Path) -> PipelineResult {
        let document_id = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        let span = info_span!("order", document = %document_id);
        let _guard = span.enter();

        match self.try_run(input, customer, output) {
            Ok(path) => PipelineResult::success(path),
            Err(e) => {
                error!(kind = e.kind(), error = %e, "Order processing failed");
                PipelineResult::from(&e)
            }
        }
    }

    fn try_run(&self, input: &Path, customer: &CustomerProfile, output: &Path) -> Result<PathBuf> {
        let mime_type = MimeType::from_path(input)?;
        debug!(mime_type = %mime_type, "Accepted input type");

        let document = self.processor.process(input, mime_type)?;
        info!(
            pages = document.pages.len(),
            entities = document.entities.len(),
            "Document processed"
        );

        self.write_order(&document, customer, output)?;
        Ok(output.to_path_buf())
    }

    /// Run the extraction, reconciliation and serialization stages on an
    /// already processed document.
    pub fn write_order(&self, document: &RawDocument, customer: &CustomerProfile, output: &Path) -> Result<()> {
        let mapping = &customer.field_mapping;

        let text = TextFieldExtractor::new().extract(&document.text);
        let grouped = EntityGrouper::new().group(&document.entities);
        let scalars = FormFieldMapper::new(mapping).map(document);
        let columns = TableColumnMapper::new(mapping)
            .with_priority(self.config.extraction.header_match)
            .map(document);

        let record = FieldReconciler::new().reconcile(&text, &grouped, &scalars, &columns)?;

        let address = AddressResolver::new(self.validator, self.config.address_validation.region_code.clone())
            .resolve(&grouped, customer)
            .result();

        let status = CsvSerializer::new(&self.config.output).generate(output, &record, &address.slots);
        debug!(csv_status = status.as_str(), "Serialization finished");
        match status {
            CsvStatus::Generated => Ok(()),
            CsvStatus::Failed(e) => Err(e.into()),
        }
    }
}
