//! Template CLI entry point

use clap::Parser;
use std::process;
use template_cli::Cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    tracing::debug!(action = ?cli.action, "parsed arguments");

    let stdout = std::io::stdout();
    if let Err(err) = template_cli::run(&cli, &mut stdout.lock()) {
        tracing::error!("{err:#}");
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}
