//! Error types for the ordex-core library.

use thiserror::Error;

/// Main error type for the ordex library.
#[derive(Error, Debug)]
pub enum OrdexError {
    /// Document acquisition error.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Record reconciliation error.
    #[error("reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Address validation error.
    #[error("address error: {0}")]
    Address(#[from] AddressError),

    /// Output serialization error.
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl OrdexError {
    /// Failure kind reported in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            OrdexError::Document(e) => e.kind(),
            OrdexError::Reconcile(e) => e.kind(),
            OrdexError::Address(_) => "address_service",
            OrdexError::Output(_) => "serialization",
            OrdexError::Io(_) => "io",
            OrdexError::Config(_) => "config",
        }
    }
}

/// Errors related to obtaining a document-understanding result.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The input file type is not one of PDF, PNG or JPEG.
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// The document-understanding service failed.
    #[error("document service failed: {0}")]
    Service(String),

    /// The service answered with something that is not a document.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// Failed to read the input file.
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    /// Short machine-friendly name of the failure kind, used in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentError::UnsupportedFormat(_) => "unsupported_format",
            DocumentError::Service(_) => "document_service",
            DocumentError::Malformed(_) => "malformed_document",
            DocumentError::Io(_) => "io",
        }
    }
}

/// Errors that reject a reconciled order record before serialization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Description, quantity and price are all empty.
    #[error("no data available to extract")]
    NoExtractableData,

    /// Item sequences are not aligned.
    #[error(
        "mismatched lengths in extracted data: description={description}, quantity={quantity}, product_code={product_code}"
    )]
    SchemaMismatch {
        description: usize,
        quantity: usize,
        product_code: usize,
    },
}

impl ReconcileError {
    pub fn kind(&self) -> &'static str {
        match self {
            ReconcileError::NoExtractableData => "no_extractable_data",
            ReconcileError::SchemaMismatch { .. } => "schema_mismatch",
        }
    }
}

/// Errors reported by the address-validation collaborator.
#[derive(Error, Debug)]
pub enum AddressError {
    /// The service answered with an `error` object.
    #[error("address service error: {0}")]
    Service(String),

    /// The request never produced a response.
    #[error("address service transport error: {0}")]
    Transport(String),

    /// The response did not carry a validation result.
    #[error("unexpected address service response: {0}")]
    Response(String),
}

/// Errors raised while writing the HEAD/LINE/RECON file.
#[derive(Error, Debug)]
pub enum OutputError {
    /// CSV encoding error.
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the ordex library.
pub type Result<T> = std::result::Result<T, OrdexError>;
