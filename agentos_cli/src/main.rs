mod commands;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use agentos_lib::{FixtureService, HttpService, Registry, Row, ServiceClient, ServiceMode, Settings};
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "agentos")]
#[command(about = "Browse and operate AgentOS resources from the terminal")]
struct Cli {
    /// Output format: table, json, csv, markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Settings file (TOML). Falls back to AGENTOS_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding settings and environment
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Serve the built-in demo data instead of calling the backend
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the resources this console knows about
    Resources,
    /// List one page of a resource
    List(commands::list::ListArgs),
    /// Show a single record
    Show(commands::show::ShowArgs),
    /// Run an action (approve, reject, enable, disable, delete) on a record
    Act(commands::act::ActArgs),
    /// Re-list a resource on an interval until interrupted
    Watch(commands::watch::WatchArgs),
    /// Load the overview widgets concurrently
    Dashboard,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agentos=info".parse().unwrap()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "table" => OutputFormat::Table,
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        "markdown" | "md" => OutputFormat::Markdown,
        other => bail!("unknown output format '{}'. Valid: table, json, csv, markdown", other),
    };

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(base_url) = &cli.base_url {
        settings.base_url = base_url.clone();
    }
    if cli.offline {
        settings.mode = ServiceMode::Fixture;
    }

    let registry = Registry::builtin();
    if let Commands::Resources = cli.command {
        return output::print_resources(&registry, &format);
    }

    match settings.mode {
        ServiceMode::Http => {
            tracing::debug!("using backend at {}", settings.base_url);
            let service = Arc::new(HttpService::from_settings(&settings)?);
            dispatch(&cli.command, service, &registry, &settings, &format).await
        }
        ServiceMode::Fixture => {
            tracing::info!("offline mode: serving built-in demo data");
            let service = Arc::new(FixtureService::builtin()?);
            dispatch(&cli.command, service, &registry, &settings, &format).await
        }
    }
}

async fn dispatch<S>(
    command: &Commands,
    service: Arc<S>,
    registry: &Registry,
    settings: &Settings,
    format: &OutputFormat,
) -> Result<()>
where
    S: ServiceClient<Row = Row, Detail = Row>,
{
    match command {
        Commands::Resources => output::print_resources(registry, format),
        Commands::List(args) => commands::list::run(args, service, registry, settings, format).await,
        Commands::Show(args) => commands::show::run(args, service, registry, settings, format).await,
        Commands::Act(args) => commands::act::run(args, service, registry, settings).await,
        Commands::Watch(args) => {
            commands::watch::run(args, service, registry, settings, format).await
        }
        Commands::Dashboard => {
            commands::dashboard::run(service, registry, settings, format).await
        }
    }
}
