mod catalog;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use declroute::logging::{init_logging_with_config, LogConfig};

use commands::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if std::env::var_os("DECLROUTE_LOG_LEVEL").is_none() {
        log_config.log_level = "warn".to_string();
    }
    log_config.stderr = true;
    let _guard = match init_logging_with_config(&log_config) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match commands::run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
