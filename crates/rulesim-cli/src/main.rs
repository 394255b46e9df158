//! CLI entry point for the rulesim driver.

use std::error::Error;
use std::io;

use clap::Parser;
use rulesim_cli::Cli;
use rulesim_core as _;
#[cfg(test)]
use tempfile as _;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn report(err: &dyn Error) {
    error!(%err, "simulation failed");
    eprintln!("error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.config();
    let exit_code = match cli.design.execute(&config, &mut io::stdout().lock()) {
        Ok(()) => 0,
        Err(err) => {
            report(&err);
            1
        }
    };

    std::process::exit(exit_code);
}
