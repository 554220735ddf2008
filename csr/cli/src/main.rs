use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use csr_gateway_common::handle::ServerStopError;
use csr_gateway_server::configuration::LoadConfigurationError;
use csr_gateway_server::configuration::ServiceConfiguration;
use csr_gateway_server::server::Server;
use csr_gateway_server::server::ServerError;
use nameth::NamedEnumValues as _;
use nameth::nameth;
use tracing::info;

/// Generates certificate signing requests and submits them to AWS Private CA.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file, defaults apply when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Overrides the host to listen to.
    #[arg(long)]
    host: Option<String>,

    /// Overrides the port to listen to.
    #[arg(long, short)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), RunError> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ServiceConfiguration::load(path)?,
        None => ServiceConfiguration::default(),
    };
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let (_server, handle) = Server::run(Arc::new(config)).await?;
    tokio::signal::ctrl_c().await.map_err(RunError::Signal)?;
    info!("Received Ctrl-C");
    let () = handle.stop("Ctrl-C").await?;
    Ok(())
}

#[nameth]
#[derive(thiserror::Error, Debug)]
enum RunError {
    #[error("[{n}] {0}", n = self.name())]
    LoadConfiguration(#[from] LoadConfigurationError),

    #[error("[{n}] {0}", n = self.name())]
    Server(#[from] ServerError),

    #[error("[{n}] Failed to listen to Ctrl-C: {0}", n = self.name())]
    Signal(std::io::Error),

    #[error("[{n}] {0}", n = self.name())]
    Stop(#[from] ServerStopError),
}
