//! Command line front end running single samples outside a sampler.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use flowmc::config::SampleConfig;
use flowmc::error::{ConfigError, Result};
use flowmc::mesh::CdtKernel;
use flowmc::simulation::{calculate, prepare_mesh, FlowSimulation};

#[derive(Parser)]
#[command(name = "flowmc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Mesh, solve and collect one flow sample", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute one sample and print its result vector
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
        /// Sample directory (defaults to the current directory)
        #[arg(short, long)]
        work_dir: Option<PathBuf>,
    },
    /// Print the result format
    Format {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Prepare and heal the mesh only
    Mesh {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        work_dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // Default: WARN for everything, INFO for flowmc.
    // Override with RUST_LOG env var (e.g. RUST_LOG=flowmc=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("flowmc=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match execute(Cli::parse().command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            config,
            seed,
            work_dir,
        } => {
            let config = SampleConfig::load(config)?;
            let dir = work_dir.unwrap_or_else(|| PathBuf::from("."));
            let [fine, _] = calculate(&config, seed, &dir)?;
            print_yaml(&fine)
        }
        Commands::Format { config } => {
            let simulation = FlowSimulation::new(SampleConfig::load(config)?, false);
            print_yaml(&simulation.result_format()?)
        }
        Commands::Mesh { config, work_dir } => {
            let config = SampleConfig::load(config)?;
            let dir = work_dir.unwrap_or_else(|| PathBuf::from("."));
            let kernel = CdtKernel::new(config.kernel_options());
            let healed = prepare_mesh(&config, &dir, &kernel)?;
            println!("{}", healed.display());
            Ok(())
        }
    }
}

fn print_yaml<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_yaml::to_string(value).map_err(|e| ConfigError::Parse(e.to_string()))?;
    print!("{text}");
    Ok(())
}
