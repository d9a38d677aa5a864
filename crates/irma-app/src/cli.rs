use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use irma_core::IrmaConfig;

#[derive(Parser, Debug)]
#[command(
    name = "irma",
    version,
    about = "Run an IRMA artificial-life world headless"
)]
pub struct Cli {
    /// JSON configuration file; missing fields take their defaults.
    #[arg(short, long, env = "IRMA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of runs to execute before exiting.
    #[arg(short, long, default_value_t = 10)]
    pub runs: u64,

    /// Override the world width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Override the world height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Override the organism pool capacity.
    #[arg(long)]
    pub org_amount: Option<usize>,

    /// Override the iterations executed per run.
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Seed the RNG for a reproducible run.
    #[arg(long, env = "IRMA_SEED")]
    pub seed: Option<u64>,

    /// Append one JSON line per organism birth to this file.
    #[arg(long)]
    pub lineage: Option<PathBuf>,

    /// Print every run summary as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Load the configuration file (or defaults) and apply command line overrides.
    pub fn load_config(&self) -> Result<IrmaConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                serde_json::from_str::<IrmaConfig>(&raw)
                    .with_context(|| format!("failed to parse config {}", path.display()))?
            }
            None => IrmaConfig::default(),
        };
        if let Some(width) = self.width {
            config.world_width = width;
        }
        if let Some(height) = self.height {
            config.world_height = height;
        }
        if let Some(amount) = self.org_amount {
            config.org_amount = amount;
        }
        if let Some(iterations) = self.iterations {
            config.iterations_per_run = iterations;
        }
        if self.seed.is_some() {
            config.rng_seed = self.seed;
        }
        Ok(config)
    }
}
