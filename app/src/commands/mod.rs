//! CLI commands

pub mod default_fee;
pub mod simulate;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use router_core::AlphaFeeConfig;
use serde::de::DeserializeOwned;

#[derive(Parser, Debug)]
#[command(name = "alpha-fee", version, about = "Alpha-fee planning for swap routes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Price a serialized route summary without a simulator
    Default {
        /// Route summary JSON
        #[arg(long)]
        summary: PathBuf,

        /// Alpha-fee config JSON
        #[arg(long)]
        config: PathBuf,

        /// Token prices and decimals JSON
        #[arg(long)]
        prices: Option<PathBuf>,
    },

    /// Re-simulate a live route against reference pools
    Simulate {
        /// Scenario JSON: pools, swap limits, best and AMM routes, prices
        #[arg(long)]
        scenario: PathBuf,

        /// Alpha-fee config JSON
        #[arg(long)]
        config: PathBuf,
    },
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

pub(crate) fn load_config(path: &Path) -> anyhow::Result<AlphaFeeConfig> {
    let config = AlphaFeeConfig::from_json_file(path)
        .with_context(|| format!("loading config {}", path.display()))?;
    tracing::info!(version = ?config.version, path = %path.display(), "loaded alpha-fee config");
    Ok(config)
}
