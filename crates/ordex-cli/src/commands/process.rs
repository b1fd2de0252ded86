//! Process command - turn a single order document into a CSV file.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use ordex_core::models::config::OrdexConfig;
use ordex_core::{
    CustomerProfile, DocumentProcessor, MimeType, OrderPipeline, OrdexError, PipelineResult,
    PipelineStatus, StoredDocument,
};

use crate::clients::{AddressValidationClient, DocumentAiClient};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, PNG or JPEG)
    #[arg(required = true)]
    input: PathBuf,

    /// Customer profile JSON (field mapping and addresses)
    #[arg(long)]
    customer: PathBuf,

    /// Output CSV file (default: input file name with .csv extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stored Document AI result to use instead of calling the service
    #[arg(long)]
    document: Option<PathBuf>,

    /// Skip address validation; extracted address lines leave the address blank
    #[arg(long)]
    no_address_validation: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    if args.no_address_validation {
        config.address_validation.enabled = false;
    }

    let customer = CustomerProfile::from_file(&args.customer)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("csv"));

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Processing {}", args.input.display()));

    let input = args.input.clone();
    let document = args.document.clone();
    let result = tokio::task::spawn_blocking(move || {
        process_file(&config, &customer, &input, document.as_deref(), &output)
    })
    .await??;

    pb.finish_and_clear();

    println!("{}", serde_json::to_string_pretty(&result)?);

    match result.status {
        PipelineStatus::Success => {
            eprintln!(
                "{} Order written in {:?}",
                style("✓").green(),
                start.elapsed()
            );
            Ok(())
        }
        PipelineStatus::NoData => {
            eprintln!("{} No order data found", style("⚠").yellow());
            Ok(())
        }
        PipelineStatus::Error => anyhow::bail!(
            "Processing failed: {}",
            result.message.as_deref().unwrap_or("unknown error")
        ),
    }
}

/// Run the pipeline for one file with collaborators built from `config`.
///
/// Blocking; call from a blocking worker thread.
pub fn process_file(
    config: &OrdexConfig,
    customer: &CustomerProfile,
    input: &Path,
    document: Option<&Path>,
    output: &Path,
) -> anyhow::Result<PipelineResult> {
    if let Err(e) = MimeType::from_path(input) {
        let e = OrdexError::from(e);
        error!(kind = e.kind(), error = %e, "Rejected input before processing");
        return Ok(PipelineResult::from(&e));
    }

    let processor: Box<dyn DocumentProcessor> = match document {
        Some(path) => Box::new(StoredDocument::new(path)),
        None => Box::new(DocumentAiClient::from_config(config)?),
    };

    let validator = address_validator(config);

    let mut pipeline = OrderPipeline::new(config, &*processor);
    if let Some(validator) = &validator {
        pipeline = pipeline.with_validator(validator);
    }

    Ok(pipeline.run(input, customer, output))
}

fn address_validator(config: &OrdexConfig) -> Option<AddressValidationClient> {
    if !config.address_validation.enabled {
        return None;
    }
    match AddressValidationClient::from_config(config) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "Address validation unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_input_rejected_before_clients() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("order.csv");
        let config = OrdexConfig::default();

        let result = process_file(
            &config,
            &CustomerProfile::default(),
            Path::new("order.docx"),
            None,
            &output,
        )
        .unwrap();

        assert_eq!(result.status, PipelineStatus::Error);
        assert!(result.message.unwrap().contains("unsupported file type"));
        assert!(!output.exists());
    }
}
