//! Job configuration, from command-line flags or a TOML file.
//!
//! The same [`JobConfig`] is filled in by clap (`lamella run --gratingType ...`)
//! or by serde (`lamella job job.toml`), so both entry points share one set of
//! names and one validation pass.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use lamella_core::sweep::{SpectralUnits, SweepGeometry, SweepMode, SweepPlan};
use lamella_core::types::DEFAULT_SLICES;
use lamella_core::{MathOptions, Polarization};
use lamella_geometry::{GratingProfile, ProfileKind};
use serde::Deserialize;

/// A complete sweep job.
#[derive(Debug, Clone, Args, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobConfig {
    /// Profile family: rectangular, blazed, sinusoidal or trapezoidal.
    #[arg(long = "gratingType")]
    pub grating_type: ProfileKind,

    /// Grating period (um).
    #[arg(long = "gratingPeriod")]
    pub grating_period: f64,

    /// Comma-separated profile parameters. Rectangular: depth, valley width (um).
    /// Blazed: blaze, anti-blaze angle (deg). Sinusoidal: depth (um).
    /// Trapezoidal: depth, valley width, blaze, anti-blaze angle.
    #[arg(
        long = "gratingGeometry",
        value_delimiter = ',',
        required = true,
        allow_negative_numbers = true
    )]
    pub grating_geometry: Vec<f64>,

    /// Material identifier in the index database (e.g. Au).
    #[arg(long = "gratingMaterial")]
    pub grating_material: String,

    /// Truncation index: orders -N..=N are retained.
    #[arg(long = "N")]
    #[serde(rename = "N")]
    pub n: usize,

    /// constantIncidence, constantIncludedAngle or constantWavelength.
    #[arg(long)]
    pub mode: SweepMode,

    /// First swept value (wavelength, energy or incidence angle).
    #[arg(long, allow_negative_numbers = true)]
    pub min: f64,

    /// Last swept value, inclusive.
    #[arg(long, allow_negative_numbers = true)]
    pub max: f64,

    #[arg(long)]
    pub increment: f64,

    /// Incidence angle (deg) in constantIncidence mode.
    #[arg(long = "incidenceAngle", allow_negative_numbers = true)]
    #[serde(default)]
    pub incidence_angle: Option<f64>,

    /// Included angle (deg) in constantIncludedAngle mode.
    #[arg(long = "includedAngle", allow_negative_numbers = true)]
    #[serde(default)]
    pub included_angle: Option<f64>,

    /// Order the included angle refers to, in constantIncludedAngle mode.
    #[arg(long = "toOrder", allow_negative_numbers = true)]
    #[serde(default)]
    pub to_order: Option<i32>,

    /// Fixed wavelength (or energy with --eV) in constantWavelength mode.
    #[arg(long)]
    #[serde(default)]
    pub wavelength: Option<f64>,

    #[arg(long = "outputFile")]
    pub output_file: PathBuf,

    /// Optional file that receives the progress block after every step.
    #[arg(long = "progressFile")]
    #[serde(default)]
    pub progress_file: Option<PathBuf>,

    /// Interpret min, max, increment and wavelength as photon energies (eV).
    #[arg(long = "eV")]
    #[serde(default, rename = "eV")]
    pub ev: bool,

    /// Print intermediate results of every step to standard output.
    #[arg(long = "printDebugOutput")]
    #[serde(default)]
    pub print_debug_output: bool,

    #[arg(long, default_value_t = Polarization::Te)]
    #[serde(default)]
    pub polarization: Polarization,

    /// Staircase slices for non-lamellar profiles.
    #[arg(long, default_value_t = DEFAULT_SLICES)]
    #[serde(default = "default_slices")]
    pub slices: usize,

    /// Worker threads; 1 runs serially. Defaults to all cores.
    #[arg(long)]
    #[serde(default)]
    pub threads: Option<usize>,
}

fn default_slices() -> usize {
    DEFAULT_SLICES
}

/// A validated job, ready to run.
#[derive(Debug, Clone)]
pub struct Job {
    pub profile: GratingProfile,
    pub plan: SweepPlan,
    pub options: MathOptions,
}

impl JobConfig {
    pub fn units(&self) -> SpectralUnits {
        if self.ev {
            SpectralUnits::ElectronVolts
        } else {
            SpectralUnits::Micrometres
        }
    }

    /// Check every option and build the profile, plan and solver options.
    pub fn validate(&self) -> Result<Job> {
        let profile = GratingProfile::from_parameters(
            self.grating_type,
            self.grating_period,
            &self.grating_geometry,
            self.grating_material.clone(),
        )
        .context("Invalid grating")?;

        let options = MathOptions::new(self.n)
            .and_then(|o| o.with_slices(self.slices))
            .context("Invalid math options")?
            .with_polarization(self.polarization);

        let geometry = match self.mode {
            SweepMode::ConstantIncidence => {
                let incidence_deg = self
                    .incidence_angle
                    .context("constantIncidence mode requires --incidenceAngle")?;
                check_incidence("incidenceAngle", incidence_deg)?;
                SweepGeometry::ConstantIncidence { incidence_deg }
            }
            SweepMode::ConstantIncludedAngle => {
                let included_angle_deg = self
                    .included_angle
                    .context("constantIncludedAngle mode requires --includedAngle")?;
                let order = self
                    .to_order
                    .context("constantIncludedAngle mode requires --toOrder")?;
                SweepGeometry::ConstantIncludedAngle {
                    included_angle_deg,
                    order,
                }
            }
            SweepMode::ConstantWavelength => {
                let wavelength = self
                    .wavelength
                    .context("constantWavelength mode requires --wavelength")?;
                check_incidence("min", self.min)?;
                check_incidence("max", self.max)?;
                SweepGeometry::ConstantWavelength { wavelength }
            }
        };

        let plan = SweepPlan::new(geometry, self.units(), self.min, self.max, self.increment)
            .context("Invalid sweep range")?;

        if self.threads == Some(0) {
            bail!("--threads must be at least 1");
        }

        Ok(Job {
            profile,
            plan,
            options,
        })
    }
}

fn check_incidence(name: &str, degrees: f64) -> Result<()> {
    if !(degrees.is_finite() && degrees.abs() < 90.0) {
        bail!("{name} must be strictly between -90 and 90 degrees, got {degrees}");
    }
    Ok(())
}

/// Load a job configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<JobConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: JobConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}
