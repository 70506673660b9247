use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use triage::cli::Cli;
use triage::client::ClientError;
use triage::commands;

fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("triage=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = commands::run(cli) {
        let message = match err.downcast_ref::<ClientError>() {
            Some(client_err) if client_err.is_invalid_token() => {
                format!("Error: {client_err}: try logging in again.")
            }
            Some(client_err) => format!("Error: {client_err}"),
            None => err.to_string(),
        };
        eprintln!("{}", message.red().bold());
        std::process::exit(1);
    }
}
