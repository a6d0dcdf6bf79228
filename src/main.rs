use anyhow::Result;
use clap::Parser;
use paste_image::{
    cli::{Cli, Commands, handle_config, handle_paste},
    config::AppConfig,
    console::{Console, default_log_path, init_console},
};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load config to get configured verbosity level and log file
    let config = AppConfig::load().unwrap_or_default();

    // CLI verbosity takes precedence over config
    let effective_verbosity = cli.get_effective_verbosity(config.get_verbosity());
    let mut console = Console::new(effective_verbosity);
    if let Some(log_file) = config.log_file.clone().or_else(default_log_path) {
        console = console.with_log_file(log_file);
    }
    init_console(console);

    match cli.command {
        Commands::Paste(args) => {
            if !handle_paste(args).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Config { action } => {
            handle_config(action)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
