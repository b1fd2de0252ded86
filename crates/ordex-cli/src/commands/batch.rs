//! Batch processing command for multiple order documents.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use ordex_core::models::config::OrdexConfig;
use ordex_core::{CustomerProfile, MimeType, PipelineResult, PipelineStatus};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Customer profile JSON (field mapping and addresses)
    #[arg(long)]
    customer: PathBuf,

    /// Output directory for the CSV files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Directory with stored Document AI results named `<input stem>.json`
    #[arg(long)]
    document_dir: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Skip address validation
    #[arg(long)]
    no_address_validation: bool,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    result: PipelineResult,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    if args.no_address_validation {
        config.address_validation.enabled = false;
    }
    let config = Arc::new(config);
    let customer = Arc::new(CustomerProfile::from_file(&args.customer)?);

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| MimeType::from_path(p).is_ok())
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    fs::create_dir_all(&args.output_dir)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut tasks = JoinSet::new();

    let outputs = output_paths(&args.output_dir, &files);
    for (path, output) in files.into_iter().zip(outputs) {
        let permit = semaphore.clone().acquire_owned().await?;
        let config = Arc::clone(&config);
        let customer = Arc::clone(&customer);
        let document = args.document_dir.as_ref().map(|dir| document_path(dir, &path));

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let result = process_one(&config, &customer, &path, document.as_deref(), &output);
            FileResult { path, result }
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let file_result = joined?;
        pb.inc(1);

        if file_result.result.status == PipelineStatus::Error {
            let message = file_result.result.message.clone().unwrap_or_default();
            if args.continue_on_error {
                warn!("Failed to process {}: {}", file_result.path.display(), message);
            } else {
                error!("Failed to process {}: {}", file_result.path.display(), message);
                tasks.abort_all();
                pb.abandon();
                anyhow::bail!("Processing failed: {}", message);
            }
        }
        results.push(file_result);
    }

    pb.finish_and_clear();
    results.sort_by(|a, b| a.path.cmp(&b.path));

    if args.summary {
        let summary_path = args.output_dir.join("summary.csv");
        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let count = |status: PipelineStatus| results.iter().filter(|r| r.result.status == status).count();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} without order data, {} failed",
        style(count(PipelineStatus::Success)).green(),
        style(count(PipelineStatus::NoData)).yellow(),
        style(count(PipelineStatus::Error)).red()
    );

    let failed: Vec<_> = results
        .iter()
        .filter(|r| r.result.status == PipelineStatus::Error)
        .collect();
    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for failure in failed {
            println!(
                "  - {}: {}",
                failure.path.display(),
                failure.result.message.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_one(
    config: &OrdexConfig,
    customer: &CustomerProfile,
    path: &Path,
    document: Option<&Path>,
    output: &Path,
) -> PipelineResult {
    debug!("Processing {}", path.display());
    super::process::process_file(config, customer, path, document, output)
        .unwrap_or_else(|e| PipelineResult::error(e.to_string()))
}

/// One distinct path per input: `<output_dir>/<input stem>.csv`, or
/// `<stem>-2.csv`, `<stem>-3.csv`, ... once that name is taken.
fn output_paths(output_dir: &Path, inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("order");
            let mut candidate = output_dir.join(format!("{}.csv", stem));
            let mut suffix = 2;
            while !taken.insert(candidate.clone()) {
                candidate = output_dir.join(format!("{}-{}.csv", stem, suffix));
                suffix += 1;
            }
            if suffix > 2 {
                warn!(
                    input = %input.display(),
                    output = %candidate.display(),
                    "Output name already used in this batch"
                );
            }
            candidate
        })
        .collect()
}

/// `<document_dir>/<input stem>.json`
fn document_path(document_dir: &Path, input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("order");
    document_dir.join(format!("{}.json", stem))
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["filename", "status", "csv_path", "message"])?;

    for file_result in results {
        let filename = file_result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let csv_path = file_result
            .result
            .csv_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        wtr.write_record([
            filename,
            file_result.result.status.as_str(),
            &csv_path,
            file_result.result.message.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
