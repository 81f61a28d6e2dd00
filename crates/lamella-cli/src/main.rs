//! Lamella command-line interface.
//!
//! Run grating efficiency sweeps from command-line flags or a TOML job file:
//! ```sh
//! lamella run --mode constantIncidence --min 100 --max 300 --increment 5 \
//!     --incidenceAngle 88 --outputFile out.txt --gratingType blazed \
//!     --gratingPeriod 1.6 --gratingGeometry 3.2,30 --gratingMaterial Au --N 5 --eV
//! lamella job job.toml
//! lamella validate job.toml
//! lamella materials
//! ```

mod config;
mod output;
mod runner;

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use lamella_core::sweep::SweepStatus;
use lamella_materials::{MaterialDatabase, MaterialOptics, MaterialProvider, HC_EV_UM};

use crate::config::JobConfig;

#[derive(Parser)]
#[command(name = "lamella")]
#[command(about = "Lamella: diffraction efficiencies of surface-relief gratings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a sweep described by command-line flags.
    Run(JobConfig),
    /// Run a sweep described by a TOML job file.
    Job {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Validate a job file without running it.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// List the materials in the built-in index database.
    Materials,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = parse_cli();

    match cli.command {
        Commands::Run(config) => execute(&config),
        Commands::Job { config } => {
            println!("Configuration: {}", config.display());
            execute(&config::load_config(&config)?)
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?.validate()?;
            println!("Configuration is valid: {}", config.display());
            println!(
                "  {} {} grating, period {} um, depth {:.4} um",
                job.profile.material(),
                job.profile.kind(),
                job.profile.period_um(),
                job.profile.depth_um()
            );
            println!(
                "  {} steps ({}), orders -{n}..={n}, {}",
                job.plan.len(),
                job.plan.mode(),
                job.options.polarization(),
                n = job.options.truncation()
            );
            Ok(())
        }
        Commands::Materials => {
            let db = MaterialDatabase::builtin();
            println!("Available materials:");
            println!();
            for name in db.material_names() {
                if let Some(provider) = db.get(&name) {
                    let (lo, hi) = provider.wavelength_range();
                    println!(
                        "  {:<4} {:.5}-{:.5} um ({:.0}-{:.0} eV)",
                        name,
                        lo,
                        hi,
                        HC_EV_UM / hi,
                        HC_EV_UM / lo
                    );
                }
            }
            Ok(())
        }
    }
}

/// Parse the command line. Help and version exit with 0; any invalid option exits with 1.
fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    }
}

fn execute(config: &JobConfig) -> anyhow::Result<()> {
    let job = config.validate()?;

    println!("Lamella Grating Solver");
    println!("======================");
    println!("Output: {}", config.output_file.display());

    let state = runner::run_job(config, &job)?;

    match state.status() {
        SweepStatus::Succeeded => println!("Sweep complete: all {} steps succeeded.", state.total()),
        status => println!(
            "Sweep complete ({status}): {} of {} steps failed.",
            state.failed(),
            state.total()
        ),
    }
    Ok(())
}
