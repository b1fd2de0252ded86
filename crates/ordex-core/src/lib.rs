//! Core library for purchase-order document extraction.
//!
//! This crate provides:
//! - Document-understanding result models (text, tables, form fields, entities)
//! - Field extraction from text, labeled entities, form fields and tables
//! - Reconciliation into one canonical order record
//! - Delivery address resolution
//! - HEAD/LINE/RECON flat file output

pub mod address;
pub mod error;
pub mod extract;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod reconcile;
pub mod retry;

pub use address::{AddressOutcome, AddressResolver, AddressValidationRequest, AddressValidationResponse, AddressValidator};
pub use error::{AddressError, DocumentError, OrdexError, OutputError, ReconcileError, Result};
pub use models::config::{HeaderMatchPriority, OrdexConfig};
pub use models::customer::{CustomerAddress, CustomerProfile, FieldMapping};
pub use models::document::{MimeType, RawDocument};
pub use models::order::{AddressResult, AddressSlots, CanonicalOrderRecord, DateInfo};
pub use output::{CsvSerializer, CsvStatus};
pub use pipeline::{DocumentProcessor, OrderPipeline, PipelineResult, PipelineStatus, StoredDocument};
pub use reconcile::FieldReconciler;
pub use retry::{retry_with_backoff, RetryPolicy};
