use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use op_server::cli::Cli;
use op_server::config::{load_config, resolve_config_path};
use op_server::lifecycle;
use op_server::observability::{init_logging, LogFiles};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("op-server: cannot determine working directory: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Logging needs the config, so everything before it reports on stderr.
    let config = match resolve_config_path(&cli.config).and_then(|path| load_config(&path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("op-server: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log_dir = config
        .webserver
        .log_dir
        .as_ref()
        .map(|dir| cwd.join(dir))
        .unwrap_or_else(|| PathBuf::from("."));
    if let Err(e) = LogFiles::open(&log_dir).and_then(init_logging) {
        eprintln!("op-server: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config,
        issuer = %config.server_info.issuer,
        "op-server starting"
    );

    // From here on errors are reported through the log only.
    if let Err(e) = lifecycle::run(&config, &cli, &cwd).await {
        tracing::error!(error = %e, "Startup failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
