use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use coap_cli::error::USAGE_EXIT_CODE;
use coap_cli::{Cli, CliError, Outcome};
use coap_cli_core::UsageError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match coap_cli::run(cli).await {
        Ok(Outcome::Completed) => ExitCode::SUCCESS,
        Ok(Outcome::Exit(code)) => ExitCode::from(code),
        Err(CliError::Usage(UsageError::MissingUrl)) => {
            // Help goes to stdout.
            if let Err(e) = Cli::command().print_help() {
                eprintln!("Error: {e}");
            }
            ExitCode::from(USAGE_EXIT_CODE)
        }
        Err(err @ CliError::Usage(_)) => {
            println!("{err}");
            ExitCode::from(err.exit_code())
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
