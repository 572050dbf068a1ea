//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use tokio_util::sync::CancellationToken;

use fileflow_core::{
    catalog, job::download_file_name, load_config, load_config_from_env, validate_config,
    Config, ConversionBackend, ConversionJob, ConversionWorkflow, DownloadOperation,
    FsArtifactSink, HttpBackend, JobCredentials, JobSnapshot, JobStatus, SourceFile,
    WorkflowConfig,
};

use crate::progress::{spawn_printer, ProgressRenderer};

/// Config file picked up from the working directory when no path is given.
const DEFAULT_CONFIG_FILE: &str = "fileflow.toml";

/// Resolve configuration: explicit path, then `./fileflow.toml`, then
/// defaults plus environment.
pub fn resolve_config(path: Option<&Path>, base_url: Option<&str>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            load_config(Path::new(DEFAULT_CONFIG_FILE))
                .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_FILE))?
        }
        None => load_config_from_env().context("Failed to load config from environment")?,
    };

    if let Some(url) = base_url {
        config.backend.base_url = url.to_string();
    }

    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

fn backend(config: &Config) -> Result<Arc<HttpBackend>> {
    let backend = HttpBackend::from_config(config).context("Failed to create backend client")?;
    Ok(Arc::new(backend))
}

/// `fileflow formats [SOURCE]`
pub fn formats(source: Option<&str>) {
    match source {
        Some(source) => {
            let Some(format) = catalog::input_format(source) else {
                println!("Unknown source format {}", source);
                return;
            };
            let targets = catalog::output_formats_for(source);
            if targets.is_empty() {
                println!("No conversions available for {}", format.label);
                return;
            }
            println!("{} can be converted to:", format.label);
            for target in targets {
                println!("  {:<8} {}", target.value, target.label);
            }
        }
        None => {
            let mut current = None;
            for format in catalog::input_formats() {
                let category = format.category();
                if current != Some(category) {
                    println!("{}:", category.heading());
                    current = Some(category);
                }
                println!(
                    "  {:<75} {} (.{})",
                    format.mime_type,
                    format.label,
                    format.extensions.join(", .")
                );
            }
        }
    }
}

pub struct ConvertArgs {
    pub file: PathBuf,
    pub target: String,
    pub source: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub no_download: bool,
    pub credentials_file: Option<PathBuf>,
    pub discard: bool,
}

/// `fileflow convert FILE --to FORMAT`
pub async fn convert(config: &Config, args: ConvertArgs) -> Result<()> {
    let file = SourceFile::from_path(&args.file, args.source.clone())
        .await
        .with_context(|| format!("Cannot read {:?}", args.file))?;

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.download.output_dir.clone());
    let workflow = ConversionWorkflow::new(
        backend(config)?,
        Arc::new(FsArtifactSink::new(&output_dir)),
        WorkflowConfig::from_config(config),
    );

    let printer = spawn_printer(workflow.subscribe());
    let result = run_conversion(&workflow, file, &args).await;

    // The printer exits once the update channel closes, after printing
    // everything still queued.
    drop(workflow);
    if let Err(e) = printer.await {
        debug!(error = %e, "Progress printer stopped early");
    }
    result
}

async fn run_conversion(
    workflow: &ConversionWorkflow,
    file: SourceFile,
    args: &ConvertArgs,
) -> Result<()> {
    let file_name = file.file_name.clone();
    let job = workflow
        .convert(file, &args.target)
        .await
        .with_context(|| format!("Conversion of {} failed", file_name))?;

    match job.status {
        JobStatus::Completed if args.no_download => {
            print!("{}", completed_summary(&job));
            if let Some(path) = &args.credentials_file {
                write_credentials(path, &job).await?;
                println!("Credentials written to {}", path.display());
            }
        }
        JobStatus::Completed => {
            let saved = workflow.download().await.context("Download failed")?;
            println!("Saved {}", saved.location.display());
        }
        status => {
            let reason = job.error.as_deref().unwrap_or("no details from the backend");
            if args.discard {
                discard_quietly(workflow).await;
            }
            bail!("Conversion ended {}: {}", status, reason);
        }
    }

    if args.discard {
        discard_quietly(workflow).await;
    }
    Ok(())
}

/// What `convert --no-download` prints. The token stays out of it.
fn completed_summary(job: &ConversionJob) -> String {
    let mut out = format!("Job {} completed.\n", job.id);
    out.push_str(&format!("  file name: {}\n", job.file_name));
    out.push_str(&format!("  target:    {}\n", job.target_format));
    if let Some(expires_at) = job.expires_at {
        out.push_str(&format!("  expires:   {}\n", expires_at.to_rfc3339()));
    }
    out
}

/// Hand the job identity to a file the user named, for a later `download`.
async fn write_credentials(path: &Path, job: &ConversionJob) -> Result<()> {
    let credentials = serde_json::json!({
        "jobId": job.id,
        "token": job.credentials().token(),
        "fileName": job.file_name,
        "targetFormat": job.target_format,
    });
    let body = serde_json::to_vec_pretty(&credentials)?;
    tokio::fs::write(path, body)
        .await
        .with_context(|| format!("Failed to write credentials to {:?}", path))?;
    Ok(())
}

async fn discard_quietly(workflow: &ConversionWorkflow) {
    if let Err(e) = workflow.discard().await {
        warn!(error = %e, "Could not delete the job on the backend");
    }
}

/// `fileflow status JOB_ID --token TOKEN`
pub async fn status(config: &Config, job_id: &str, token: &str) -> Result<()> {
    let job = JobCredentials::new(job_id, token);
    let response = backend(config)?
        .job_status(&job)
        .await
        .context("Status request failed")?;

    let snapshot = JobSnapshot::from(response);
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

pub struct DownloadArgs {
    pub job_id: String,
    pub token: String,
    pub file_name: String,
    pub target: String,
    pub output_dir: Option<PathBuf>,
}

/// `fileflow download JOB_ID --token TOKEN --file-name NAME --to FORMAT`
pub async fn download(config: &Config, args: DownloadArgs) -> Result<()> {
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| config.download.output_dir.clone());
    let operation = DownloadOperation::new(
        backend(config)?,
        Arc::new(FsArtifactSink::new(output_dir)),
        config.download.mode,
    );

    let name = download_file_name(&args.file_name, &args.target);
    let job = JobCredentials::new(args.job_id, args.token);
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let mut renderer = ProgressRenderer::default();
    let result = operation
        .run(&job, &name, &cancel, |progress| {
            let update = fileflow_core::WorkflowUpdate::DownloadProgress { progress };
            if let Some(line) = renderer.render(&update) {
                eprintln!("{}", line);
            }
        })
        .await;
    ctrl_c.abort();

    let saved = match result {
        Err(e) if e.is_cancelled() => bail!("Download interrupted, nothing was saved"),
        other => other.context("Download failed")?,
    };
    println!("Saved {}", saved.location.display());
    Ok(())
}

/// `fileflow delete JOB_ID --token TOKEN`
pub async fn delete(config: &Config, job_id: &str, token: &str) -> Result<()> {
    let job = JobCredentials::new(job_id, token);
    backend(config)?
        .delete_job(&job)
        .await
        .context("Delete failed")?;
    info!(job_id = %job_id, "Job deleted");
    println!("Deleted {}", job_id);
    Ok(())
}

/// `fileflow config`
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
