//! Machine Timeline

use clap::Parser;
use machine_timeline::{Config, Result, VERSION, cli, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let mut config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::load()?
    };
    if let Some(log_file) = &args.log_file {
        config.logging.file = Some(log_file.clone());
    }

    init_logging(&config.logging)?;

    tracing::info!("Machine Timeline v{}", VERSION);
    tracing::debug!("Parsed arguments: {:?}", args);
    tracing::debug!("Loaded configuration: {:?}", config);

    cli::execute(args, config).await
}
