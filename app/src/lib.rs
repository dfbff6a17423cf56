//! Alpha-fee command-line application

pub mod commands;
pub mod scenario;

use clap::Parser;

use commands::{Cli, Commands};

/// Parse arguments, run one command and print its JSON result to stdout.
pub fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("alpha_fee=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = match &cli.command {
        Commands::Default {
            summary,
            config,
            prices,
        } => commands::default_fee::run(summary, config, prices.as_deref())?,
        Commands::Simulate { scenario, config } => commands::simulate::run(scenario, config)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
