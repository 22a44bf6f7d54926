use clap::Parser;
use live_export::cli::{CliArgs, CliHandler, CliResult, Commands};
use live_export::config::LiveExportConfig;
use live_export::logging;
use std::process;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let handler = match CliHandler::new(args.config.clone()) {
        Ok(handler) => handler,
        Err(e) => {
            eprintln!("Error: Failed to resolve configuration path: {e}");
            process::exit(1);
        }
    };

    let loaded = handler.load_config().await;

    // A broken config still gets default logging so the error can be reported
    let log_config = match &loaded {
        Ok(config) => config.clone(),
        Err(e) => {
            eprintln!("Warning: Failed to load configuration, using defaults: {e}");
            LiveExportConfig::default()
        }
    };

    if let Err(e) = logging::init_logging(&log_config, args.verbose) {
        eprintln!("Warning: Failed to initialize logging: {e}");
    }

    // init rewrites the file, so it must work on a broken one
    let is_init = matches!(args.command, Commands::Init { .. });
    let result = match loaded {
        Ok(config) => handler.handle_command(args, config).await,
        Err(_) if is_init => handler.handle_command(args, log_config).await,
        Err(e) => Err(e),
    };

    let result = match result {
        Ok(result) => result,
        Err(e) => CliResult::Error(format!("Failed to execute command: {e}")),
    };

    match result {
        CliResult::Success(msg) => {
            println!("{msg}");
            process::exit(0);
        }
        CliResult::Error(msg) => {
            eprintln!("{msg}");
            process::exit(1);
        }
    }
}
