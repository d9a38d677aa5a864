use anyhow::{Context, Result};
use clap::Parser;
use irma_app::{Cli, JsonLinesLineage, TracingView};
use irma_core::{LineagePersistence, NullLineage};
use irma_vm::WorldState;
use tracing::info;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = cli.load_config()?;

    let persistence: Box<dyn LineagePersistence> = match &cli.lineage {
        Some(path) => Box::new(JsonLinesLineage::create(path)?),
        None => Box::new(NullLineage),
    };
    let mut world =
        WorldState::with_persistence(config, persistence).context("invalid configuration")?;
    world.set_view(Box::new(TracingView::default()));
    info!(
        width = world.config().world_width,
        height = world.config().world_height,
        organisms = world.pool().len(),
        "Starting IRMA world"
    );

    for run in 0..cli.runs {
        let summary = world.run();
        info!(
            run,
            iteration = summary.iteration,
            organisms = summary.organisms,
            avg_energy = summary.average_energy,
            diff = summary.diff,
            generation = summary.generation,
            "run complete"
        );
        if cli.json {
            println!("{}", serde_json::to_string(&summary)?);
        }
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
