mod cli;
mod commands;
mod progress;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Command};
use commands::{ConvertArgs, DownloadArgs};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays clean for command output.
fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    let (json_layer, text_layer) = if json {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (None, Some(fmt::layer().with_writer(std::io::stderr)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    // Formats need no configuration.
    if let Command::Formats { source } = &cli.command {
        commands::formats(source.as_deref());
        return Ok(());
    }

    let config = commands::resolve_config(cli.config.as_deref(), cli.base_url.as_deref())?;
    debug!(base_url = %config.backend.base_url, "Configuration loaded");

    match cli.command {
        Command::Formats { .. } => Ok(()),
        Command::Convert {
            file,
            target,
            source,
            output_dir,
            no_download,
            credentials_file,
            discard,
        } => {
            commands::convert(
                &config,
                ConvertArgs {
                    file,
                    target,
                    source,
                    output_dir,
                    no_download,
                    credentials_file,
                    discard,
                },
            )
            .await
        }
        Command::Status { job_id, token } => commands::status(&config, &job_id, &token).await,
        Command::Download {
            job_id,
            token,
            file_name,
            target,
            output_dir,
        } => {
            commands::download(
                &config,
                DownloadArgs {
                    job_id,
                    token,
                    file_name,
                    target,
                    output_dir,
                },
            )
            .await
        }
        Command::Delete { job_id, token } => commands::delete(&config, &job_id, &token).await,
        Command::Config => commands::show_config(&config),
    }
}
