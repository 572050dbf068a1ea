//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fileflow")]
#[command(version, about = "Convert files with a remote conversion service")]
pub struct Cli {
    /// Configuration file (defaults to ./fileflow.toml when present)
    #[arg(long, global = true, env = "FILEFLOW_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the backend base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List accepted source formats, or the targets for one source
    Formats {
        /// Source MIME type, e.g. image/png
        source: Option<String>,
    },

    /// Upload a file, wait for the conversion and save the result
    Convert {
        /// File to convert
        file: PathBuf,

        /// Target format token, e.g. pdf
        #[arg(long = "to", value_name = "FORMAT")]
        target: String,

        /// Source MIME type (inferred from the extension when omitted)
        #[arg(long = "from", value_name = "MIME")]
        source: Option<String>,

        /// Directory to save the converted file into
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Leave the artifact on the backend instead of saving it
        #[arg(long)]
        no_download: bool,

        /// With --no-download, write the job id and token to this file so the
        /// artifact can be fetched later
        #[arg(long, value_name = "PATH", requires = "no_download")]
        credentials_file: Option<PathBuf>,

        /// Delete the job on the backend once finished
        #[arg(long, conflicts_with = "no_download")]
        discard: bool,
    },

    /// Show the status of a job
    Status {
        job_id: String,

        #[arg(long, env = "FILEFLOW_JOB_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Download the artifact of a completed job
    Download {
        job_id: String,

        #[arg(long, env = "FILEFLOW_JOB_TOKEN", hide_env_values = true)]
        token: String,

        /// Original file name; the saved name is derived from it
        #[arg(long, value_name = "NAME")]
        file_name: String,

        /// Target format of the job
        #[arg(long = "to", value_name = "FORMAT")]
        target: String,

        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Delete a job and its files on the backend
    Delete {
        job_id: String,

        #[arg(long, env = "FILEFLOW_JOB_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Print the effective configuration
    Config,
}
