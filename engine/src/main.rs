// Valet Assistant Engine
// Main entry point for the valet binary

use clap::Parser;
use valet_engine::cli::{Cli, Command, ConfigAction};
use valet_engine::config::Config;
use valet_engine::handlers::{
    handle_ask, handle_chat, handle_config_path, handle_config_show, handle_status, OutputFormat,
};
use valet_engine::telemetry::{init_telemetry, init_telemetry_with_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize basic telemetry first (before config is loaded)
    init_telemetry();

    tracing::info!("Valet Engine v{}", env!("CARGO_PKG_VERSION"));

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // Re-initialize telemetry with the CLI override or config-driven level
    // (only takes effect if RUST_LOG env var is not set)
    let level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(level);

    match cli.command {
        Command::Ask { query, from } => handle_ask(query, from, &config, format).await,

        Command::Chat { from } => handle_chat(from, &config, format).await,

        Command::Status => handle_status(&config, format),

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
            ConfigAction::Path => handle_config_path(),
        },
    }
}
