// ABOUTME: Entry point for the one-image CLI application.
// ABOUTME: Resolves configuration, runs one reconciliation, prints the result.

mod cli;

use clap::Parser;
use cli::Cli;
use one_image::config::{Config, ConnectionConfig};
use one_image::error::Result;
use one_image::manage::{ImageManager, Outcome};
use one_image::one::OneClient;
use one_image::output::Output;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
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
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(cli.format.into());

    match run(&cli).await {
        Ok(outcome) => output.result(&outcome.report()),
        Err(e) => {
            output.error(&e.to_string());
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<Outcome> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // Everything that can fail without the network fails here.
    let connection = ConnectionConfig::resolve(&cli.connection_args(), &config)?;
    let request = cli.request()?;

    let client = OneClient::connect(&connection)?.request_timeout(config.request_timeout);
    tracing::debug!(url = %connection.url, user = %connection.username, "using RPC endpoint");

    let outcome = ImageManager::new(&client)
        .dry_run(cli.check)
        .wait_policy(config.wait)
        .apply(&request)
        .await?;

    Ok(outcome)
}
