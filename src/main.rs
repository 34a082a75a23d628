//! Binary entry point for the softlayer-imager CLI.

use std::io::{self, Write};
use std::process;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use softlayer_imager::{
    Artifact, ArtifactError, BuildError, ConfigError, ConfigOverrides, ConsoleUi, ImageBuilder,
    ImagerConfig, SoftLayerClient,
};

mod cli;

use cli::{BuildCommand, Cli, DestroyImageCommand};

const DEFAULT_LOG_FILTER: &str = "softlayer_imager=warn";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("build failed: {0}")]
    Build(#[from] BuildError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli {
        Cli::Build(command) => build_image(command).await,
        Cli::DestroyImage(command) => destroy_image(command).await,
    }
}

fn overrides(command: BuildCommand) -> ConfigOverrides {
    ConfigOverrides {
        image_name: command.image_name,
        image_type: command.image_type,
        base_image_id: command.base_image_id,
        base_os_code: command.base_os_code,
        datacenter: command.datacenter,
    }
}

async fn build_image(command: BuildCommand) -> Result<(), CliError> {
    let mut config = ImagerConfig::load_without_cli_args()?;
    config.apply_overrides(overrides(command));
    let build_config = config.validate()?;

    let builder = ImageBuilder::connect(build_config, Arc::new(ConsoleUi))?;
    let artifact = builder.run().await?;

    writeln!(io::stdout(), "{artifact}").ok();
    Ok(())
}

async fn destroy_image(command: DestroyImageCommand) -> Result<(), CliError> {
    let credentials = ImagerConfig::load_without_cli_args()?.credentials()?;
    let client = SoftLayerClient::connect(
        &credentials.endpoint,
        &credentials.username,
        &credentials.api_key,
    )
    .map_err(|err| BuildError::remote("error creating SoftLayer client", err))?;
    let artifact = Artifact::new(command.image_id, String::new(), client);
    artifact.destroy().await?;

    writeln!(io::stdout(), "Destroyed image '{}'", artifact.id()).ok();
    Ok(())
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
