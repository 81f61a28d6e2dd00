//! Output and progress files.
//!
//! The output file has three blocks:
//!
//! ```text
//! # Input
//! mode=constantIncidence
//! incidenceAngle=88
//! ...
//! # Progress
//! status=inProgress
//! completedSteps=3
//! totalSteps=41
//! # Output
//! 100<TAB>e(-N),...,e(+N)
//! ```
//!
//! It is rewritten whole after every step, through a temporary file and a
//! rename, so a reader never sees a half-written file. The optional progress
//! file holds the `# Progress` block alone.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lamella_core::sweep::{SweepMode, SweepRecord, SweepState};
use lamella_core::EvaluationStatus;

use crate::config::JobConfig;

/// The `# Input` block echoing the job.
pub fn input_block(config: &JobConfig) -> String {
    let mut out = String::from("# Input\n");
    // Writing to a String cannot fail.
    let _ = writeln!(out, "mode={}", config.mode);
    match config.mode {
        SweepMode::ConstantIncidence => {
            if let Some(angle) = config.incidence_angle {
                let _ = writeln!(out, "incidenceAngle={angle}");
            }
        }
        SweepMode::ConstantIncludedAngle => {
            if let Some(angle) = config.included_angle {
                let _ = writeln!(out, "includedAngle={angle}");
            }
            if let Some(order) = config.to_order {
                let _ = writeln!(out, "toOrder={order}");
            }
        }
        SweepMode::ConstantWavelength => {
            if let Some(wavelength) = config.wavelength {
                let _ = writeln!(out, "wavelength={wavelength}");
            }
        }
    }
    let _ = writeln!(out, "units={}", config.units().label());
    let _ = writeln!(out, "min={}", config.min);
    let _ = writeln!(out, "max={}", config.max);
    let _ = writeln!(out, "increment={}", config.increment);
    let _ = writeln!(out, "gratingType={}", config.grating_type);
    let _ = writeln!(out, "gratingPeriod={}", config.grating_period);
    let geometry: Vec<String> = config.grating_geometry.iter().map(|v| v.to_string()).collect();
    let _ = writeln!(out, "gratingGeometry={}", geometry.join(","));
    let _ = writeln!(out, "gratingMaterial={}", config.grating_material);
    let _ = writeln!(out, "N={}", config.n);
    let _ = writeln!(out, "polarization={}", config.polarization);
    out
}

/// The `# Progress` block of `state`.
pub fn progress_block(state: &SweepState) -> String {
    format!(
        "# Progress\nstatus={}\ncompletedSteps={}\ntotalSteps={}\n",
        state.status(),
        state.completed(),
        state.total()
    )
}

/// A swept value rounded to six significant digits, so accumulated
/// floating-point steps print as `0.3` rather than `0.30000000000000004`.
pub fn format_value(value: f64) -> String {
    match format!("{value:.5e}").parse::<f64>() {
        Ok(rounded) => rounded.to_string(),
        Err(_) => value.to_string(),
    }
}

/// One `# Output` line: the swept value, a tab, then the reflected
/// efficiencies of orders -N..=N. Failed steps print `nan` in every column.
pub fn output_line(record: &SweepRecord) -> String {
    let result = &record.result;
    let columns: Vec<String> = if result.status.has_efficiencies() {
        result
            .reflection_efficiencies()
            .iter()
            .map(|e| format!("{e:.6e}"))
            .collect()
    } else {
        vec!["nan".to_string(); 2 * result.truncation + 1]
    };
    format!("{}\t{}", format_value(record.step.value), columns.join(","))
}

/// The whole output file for `state`.
pub fn render(input: &str, state: &SweepState) -> String {
    let mut out = String::with_capacity(input.len() + 64 * (state.completed() + 2));
    out.push_str(input);
    out.push_str(&progress_block(state));
    out.push_str("# Output\n");
    for record in state.records() {
        out.push_str(&output_line(record));
        out.push('\n');
    }
    out
}

/// Human-readable dump of one step's intermediate results.
pub fn debug_report(record: &SweepRecord) -> String {
    let result = &record.result;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "--- step {} (value {}): wavelength {:.6} um, incidence {:.4} deg, {:?}",
        record.step.index,
        format_value(record.step.value),
        result.wavelength_um,
        result.incidence_deg,
        result.status
    );
    if let Some(message) = result.message() {
        let _ = writeln!(out, "    message: {message}");
    }
    let d = &result.diagnostics;
    if result.status != EvaluationStatus::Failure {
        let _ = writeln!(
            out,
            "    R = {:.6e}, T = {:.6e}, sum = {:.6e}, residual = {:.3e} (tolerance {:.3e}, {})",
            d.total_reflection,
            d.total_transmission,
            d.energy_sum,
            d.residual,
            d.tolerance,
            if d.lossless { "lossless" } else { "absorbing" }
        );
    }
    for order in &result.orders {
        let _ = writeln!(
            out,
            "    order {:>3}: {:?} kz = {:.6e}{:+.6e}i  r = {:.6e}{:+.6e}i  eff = {:.6e}",
            order.order,
            order.status,
            order.kz.re,
            order.kz.im,
            order.reflection.re,
            order.reflection.im,
            order.efficiency
        );
    }
    if let Some(trace) = &result.debug {
        let _ = writeln!(
            out,
            "    eps(material) = {:.6e}{:+.6e}i, eps(ambient) = {:.6e}",
            trace.material_permittivity.re, trace.material_permittivity.im, trace.ambient_permittivity.re
        );
        let kx: Vec<String> = trace.kx.iter().map(|k| format!("{k:.6}")).collect();
        let _ = writeln!(out, "    kx/k0 = [{}]", kx.join(", "));
        for (i, layer) in trace.layers.iter().enumerate() {
            let eps0 = layer
                .permittivity
                .get(layer.permittivity.len() / 2)
                .copied()
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "    layer {i}: thickness {:.6e} um, eps_0 = {:.6e}{:+.6e}i, {} modes",
                layer.thickness_um,
                eps0.re,
                eps0.im,
                layer.mode_constants.len()
            );
        }
    }
    out
}

/// Writes the output file (and the progress file, if any) at each checkpoint.
#[derive(Debug)]
pub struct OutputWriter {
    output: PathBuf,
    staging: PathBuf,
    progress: Option<PathBuf>,
    input: String,
}

impl OutputWriter {
    /// Prepare the writer, creating parent directories as needed.
    pub fn new(config: &JobConfig) -> io::Result<Self> {
        for path in std::iter::once(&config.output_file).chain(config.progress_file.iter()) {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            output: config.output_file.clone(),
            staging: staging_path(&config.output_file),
            progress: config.progress_file.clone(),
            input: input_block(config),
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Rewrite both files for `state`.
    pub fn write(&self, state: &SweepState) -> io::Result<()> {
        fs::write(&self.staging, render(&self.input, state))?;
        fs::rename(&self.staging, &self.output)?;
        if let Some(progress) = &self.progress {
            fs::write(progress, progress_block(state))?;
        }
        log::debug!(
            "checkpoint {}/{} written to {}",
            state.completed(),
            state.total(),
            self.output.display()
        );
        Ok(())
    }
}

fn staging_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    output.with_file_name(name)
}
