mod args;
mod error;
mod run;

use std::process::ExitCode;

use clap::Parser;
use flexi_logger::{Logger, LoggerHandle};

use args::Args;
use error::CliError;

fn init_logging(args: &Args) -> Result<LoggerHandle, CliError> {
    Ok(Logger::try_with_env_or_str(args.log_spec())?
        .log_to_stderr()
        .start()?)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let _logger = match init_logging(&args) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = run::execute(&args) {
        if !args.silent {
            eprintln!("Error: {e}");
        }
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
