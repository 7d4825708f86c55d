use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::info;

use pixelpress_core::AppConfig;
use pixelpress_server::Server;

#[derive(Parser)]
#[command(name = "pixelpress")]
#[command(about = "HTTP image optimization service: compression, resizing, thumbnails, watermarking")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the pixelpress server
    Serve {
        /// Server host address (overrides configuration)
        #[arg(long)]
        host: Option<String>,

        /// Server port (overrides configuration)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error(transparent)]
    Server(#[from] pixelpress_server::ServerError),
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    init_tracing(cli.debug);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            serve_command(config, host, port).await?;
        }
    }

    Ok(())
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(config_path: Option<&Path>) -> Result<AppConfig, figment::Error> {
    use figment::{
        providers::{Env, Format, Toml},
        Figment,
    };

    let mut figment = Figment::new();

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    } else {
        figment = figment
            .merge(Toml::file("pixelpress.toml"))
            .merge(Toml::file("config/pixelpress.toml"));
    }

    figment.merge(Env::prefixed("PIXELPRESS_").split("__")).extract()
}

async fn serve_command(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), CliError> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    info!(
        "Starting pixelpress server on {}:{}",
        config.server.host, config.server.port
    );

    let server = Server::new(config).await?;
    server.serve().await?;

    Ok(())
}
