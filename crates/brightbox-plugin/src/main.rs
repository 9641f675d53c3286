mod request;

use anyhow::Context;
use brightbox_cloud::{Lifecycle, ResourceInstance};
use brightbox_provider::{Session, registry};
use clap::{Parser, Subcommand};
use request::{PluginRequest, ResourceResponse};
use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "brightbox-plugin", version)]
#[command(about = "Brightbox Cloud resource plugin", long_about = None)]
struct Cli {
    /// Log filter, e.g. "debug" or "brightbox_api=trace" (defaults to RUST_LOG, then info)
    #[arg(long, global = true, env = "BRIGHTBOX_PLUGIN_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read one request from stdin and write the resulting state to stdout (default)
    Run,
    /// List the resource kinds this plugin manages
    Kinds,
}

/// Logs go to stderr; stdout carries the response only
fn init_logging(level: Option<&str>) {
    let filter = level
        .and_then(|l| EnvFilter::try_new(l).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Kinds => {
            for kind in registry().kinds() {
                println!("{}", kind);
            }
            ExitCode::SUCCESS
        }
        Commands::Run => {
            let (response, code) = match run().await {
                Ok(instance) => (ResourceResponse::Instance(instance), ExitCode::SUCCESS),
                Err(e) => {
                    tracing::error!("{:#}", e);
                    (ResourceResponse::error(&e), ExitCode::FAILURE)
                }
            };
            match serde_json::to_string(&response) {
                Ok(json) => {
                    println!("{}", json);
                    code
                }
                Err(e) => {
                    tracing::error!("Failed to encode response: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn run() -> anyhow::Result<ResourceInstance> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("Failed to read request from stdin")?;
    let request: PluginRequest =
        serde_json::from_str(&input).context("Invalid plugin request")?;

    let registry = registry();
    let resource = request.resource;
    registry.get(&resource.kind)?;

    // Import accepts the id as given, so no session is needed
    if resource.operation == Lifecycle::Import {
        let id = resource.require_id()?;
        tracing::info!("Importing {} {}", resource.kind, id);
        return Ok(ResourceInstance::imported(id));
    }

    let config = request.provider.with_env_defaults();
    tracing::debug!("Provider configuration: {:?}", config);
    let session = Session::connect(&config).await?;

    tracing::info!("Running {} for {}", resource.operation, resource.kind);
    let instance = registry.dispatch(&session, &resource).await?;
    Ok(instance)
}
