// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://api.caravel.example.com";

#[derive(Parser)]
#[command(name = "caravel")]
#[command(about = "Declarative deployments through a remote pipeline orchestrator")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Orchestration service base URL (falls back to CARAVEL_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// API token (falls back to CARAVEL_API_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Normal)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Normal,
    Quiet,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scaffold a starter deployment descriptor
    Init {
        /// Application name to seed the descriptor with
        #[arg(long)]
        application: Option<String>,

        /// Overwrite an existing descriptor
        #[arg(long)]
        force: bool,
    },

    /// Compile a deployment, submit it, and wait on the pipeline
    Deploy {
        /// Deployment descriptor path (defaults to caravel.yml in the cwd)
        #[arg(short = 'f', long)]
        file: Option<PathBuf>,

        /// Application name override (wins over the descriptor)
        #[arg(long)]
        application: Option<String>,

        /// Account override
        #[arg(long)]
        account: Option<String>,

        /// Submit a hosted deployment config by URL instead of a local descriptor
        #[arg(long, conflicts_with = "from_pipeline")]
        from_url: Option<String>,

        /// Re-submit the config of an existing pipeline (caravel::<id> or bare id)
        #[arg(long)]
        from_pipeline: Option<String>,

        /// Resolve remote and kustomize manifests locally before submitting
        #[arg(long)]
        local: bool,

        /// Per-image version override (repeatable)
        #[arg(long = "image-version", value_name = "IMAGE=VERSION")]
        image_versions: Vec<String>,

        /// Track the pipeline to completion instead of returning once it starts
        #[arg(long)]
        watch: bool,

        /// Console base URL for deep links (falls back to CARAVEL_CONSOLE_URL)
        #[arg(long)]
        console_url: Option<String>,
    },

    /// Show the current status of a pipeline
    Status {
        /// Pipeline id
        pipeline: String,
    },

    /// Stream pipeline events until a terminal state
    Watch {
        /// Pipeline id
        pipeline: String,

        /// Console base URL for deep links (falls back to CARAVEL_CONSOLE_URL)
        #[arg(long)]
        console_url: Option<String>,
    },

    /// Show provisioning status of an ephemeral sandbox cluster
    Sandbox {
        /// Sandbox cluster id
        id: String,
    },
}
