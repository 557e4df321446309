//! asklepios binary: loads settings, connects to the cluster and runs the
//! monitor until interrupted.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use kube::Client;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use asklepios::config::{Settings, DEFAULT_CONFIG_PATH};
use asklepios::error::{Error, Result};
use asklepios::node::KubeNodeApi;
use asklepios::{rest_api, Monitor};

#[derive(Parser)]
#[command(name = "asklepios")]
#[command(about = "Auto-healing for Kubernetes control-plane nodes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check node status and kick unhealthy control-plane nodes out (default)
    Serve,
    /// Validate the config file and print the effective settings
    CheckConfig,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "asklepios=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(e) = run(cli).await {
        error!(error = %e, "asklepios failed to start");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(&cli.config)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::CheckConfig => {
            let yaml = serde_yaml::to_string(&settings)
                .map_err(|e| Error::ConfigError(format!("YAML serialization error: {}", e)))?;
            print!("{}", yaml);
            Ok(())
        }
        Commands::Serve => serve(settings).await,
    }
}

async fn serve(settings: Settings) -> Result<()> {
    let client = Client::try_default().await.map_err(Error::KubeError)?;

    if let Some(port) = settings.metrics_port {
        tokio::spawn(async move {
            if let Err(e) = rest_api::run_server(port).await {
                error!(error = %e, "Metrics server stopped");
            }
        });
    }

    let monitor = Monitor::new(Arc::new(KubeNodeApi::new(client)), settings);

    tokio::select! {
        _ = monitor.run() => {}
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("Received shutdown signal, exiting");
        }
    }

    Ok(())
}
