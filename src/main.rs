// ABOUTME: Entry point for the caravel CLI application.
// ABOUTME: Parses arguments, wires cancellation to Ctrl-C, and dispatches commands.

mod cli;
mod commands;

use caravel::api::ApiClient;
use caravel::cancel::{self, CancelToken};
use caravel::descriptor;
use caravel::error::Result;
use caravel::output::{Output, OutputMode};
use clap::Parser;
use cli::{Cli, Commands, DEFAULT_API_URL, OutputFormat};
use commands::DeployOptions;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mut output = Output::new(output_mode(cli.output));

    // The supervising task cancels the shared token exactly once; every
    // polling loop and network call observes it.
    let (handle, mut token) = cancel::cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    let result = run(cli, &mut output, &mut token).await;

    if let Err(e) = result {
        output.error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}

fn output_mode(format: OutputFormat) -> OutputMode {
    match format {
        OutputFormat::Normal => OutputMode::Normal,
        OutputFormat::Quiet => OutputMode::Quiet,
        OutputFormat::Json => OutputMode::Json,
    }
}

async fn run(cli: Cli, output: &mut Output, cancel: &mut CancelToken) -> Result<()> {
    let api_url = cli
        .api_url
        .or_else(|| env::var("CARAVEL_API_URL").ok())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let token = cli.token.or_else(|| env::var("CARAVEL_API_TOKEN").ok());

    match cli.command {
        Commands::Init { application, force } => {
            let cwd = env::current_dir()?;
            descriptor::init_descriptor(&cwd, application.as_deref(), force)
        }
        Commands::Deploy {
            file,
            application,
            account,
            from_url,
            from_pipeline,
            local,
            image_versions,
            watch,
            console_url,
        } => {
            let client = build_client(&api_url, token)?;
            let options = DeployOptions {
                file,
                application,
                account,
                from_url,
                from_pipeline,
                local,
                image_versions,
                watch,
                console_url: console_url.or_else(|| env::var("CARAVEL_CONSOLE_URL").ok()),
            };
            commands::deploy(options, &client, output, cancel).await
        }
        Commands::Status { pipeline } => {
            let client = build_client(&api_url, token)?;
            commands::status(pipeline, &client, output).await
        }
        Commands::Watch {
            pipeline,
            console_url,
        } => {
            let client = build_client(&api_url, token)?;
            commands::watch(
                pipeline,
                console_url.or_else(|| env::var("CARAVEL_CONSOLE_URL").ok()),
                &client,
                output,
                cancel,
            )
            .await
        }
        Commands::Sandbox { id } => {
            let client = build_client(&api_url, token)?;
            commands::sandbox(id, &client, output, cancel).await
        }
    }
}

fn build_client(api_url: &str, token: Option<String>) -> Result<ApiClient> {
    let client = ApiClient::new(api_url)?;
    Ok(match token {
        Some(token) => client.with_token(token),
        None => client,
    })
}
