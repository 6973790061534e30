use nbody::{bench_gravity, bench_integrators, read_snapshots};
use nbody::{IntegratorKind, Scenario, ScenarioConfig};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "nbody", about = "Direct-summation gravitational N-body integrator")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a YAML scenario
    Run {
        scenario: PathBuf,
        /// Override the scenario's output file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the scenario's integrator (leapfrog, rk2, rk4)
        #[arg(short, long)]
        integrator: Option<IntegratorKind>,
    },
    /// Print line count, time span and energy drift of a snapshot file
    Summary { file: PathBuf },
    /// Time every integrator on deterministic body clouds
    Bench {
        #[arg(short = 'n', long = "bodies", num_args = 1.., default_values_t = [100usize, 200, 400, 800])]
        bodies: Vec<usize>,
        #[arg(short, long, default_value_t = 5)]
        steps: usize,
        #[arg(long, default_value_t = 1e-3)]
        dt: f64,
    },
}

// load here to keep main clean
fn load_scenario(path: &Path, output: Option<PathBuf>, integrator: Option<IntegratorKind>) -> Result<ScenarioConfig> {
    let mut cfg = ScenarioConfig::from_path(path)
        .with_context(|| format!("failed to load scenario {}", path.display()))?;
    if let Some(output) = output {
        cfg.engine.output = output;
    }
    if let Some(integrator) = integrator {
        cfg.engine.integrator = integrator;
    }
    Ok(cfg)
}

fn summary(file: &Path) -> Result<()> {
    let snaps = read_snapshots(file).with_context(|| format!("failed to read {}", file.display()))?;
    let (Some(first), Some(last)) = (snaps.first(), snaps.last()) else {
        bail!("{} holds no snapshots", file.display());
    };

    let drift = ((last.total_energy - first.total_energy) / first.total_energy).abs();
    println!("snapshots: {}", snaps.len());
    println!("bodies:    {}", first.states.len());
    println!("time:      {} .. {}", first.time, last.time);
    println!("energy:    {} -> {} (relative drift {:.3e})", first.total_energy, last.total_energy, drift);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nbody=info")))
        .init();

    let args = Args::parse();

    match args.command {
        Command::Run { scenario, output, integrator } => {
            let cfg = load_scenario(&scenario, output, integrator)?;
            let mut scenario = Scenario::build_scenario(cfg).context("failed to build scenario")?;
            let report = scenario.run().context("simulation failed")?;
            println!(
                "{} steps, {} snapshots written to {}, relative energy drift {:.3e}",
                report.steps,
                report.snapshots,
                scenario.engine.output_path().display(),
                report.relative_energy_drift()
            );
        }
        Command::Summary { file } => summary(&file)?,
        Command::Bench { bodies, steps, dt } => {
            bench_gravity(&bodies)?;
            bench_integrators(&bodies, steps, dt)?;
        }
    }

    Ok(())
}
