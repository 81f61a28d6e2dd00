//! Sweep execution: solver and backend setup, progress reporting.

use std::sync::Arc;

use anyhow::{Context, Result};
use lamella_compute::{ComputeBackend, CpuBackend, SerialBackend};
use lamella_core::sweep::{run_sweep, SweepMode, SweepState};
use lamella_core::{GratingSolver, RcwaSolver};
use lamella_materials::MaterialDatabase;

use crate::config::{Job, JobConfig};
use crate::output::{debug_report, format_value, OutputWriter};

/// Run a validated job, writing the output (and progress) files as it goes.
pub fn run_job(config: &JobConfig, job: &Job) -> Result<SweepState> {
    let solver = RcwaSolver::new(Arc::new(MaterialDatabase::builtin()));
    let backend = create_backend(config.threads)?;

    println!(
        "Grating: {} {}, period {} um",
        job.profile.material(),
        job.profile.kind(),
        job.profile.period_um()
    );
    println!("Method: {}", solver.method_name());
    println!("Backend: {}", backend.device_info().name);
    println!(
        "Sweep: {} steps, {} {} to {} step {}",
        job.plan.len(),
        job.plan.mode(),
        config.min,
        config.max,
        config.increment
    );

    let writer = OutputWriter::new(config)
        .with_context(|| format!("Failed to prepare output file: {}", config.output_file.display()))?;

    let swept = match job.plan.mode() {
        SweepMode::ConstantWavelength => "angle",
        _ => job.plan.units().label(),
    };
    let state = run_sweep(
        &solver,
        &job.profile,
        &job.plan,
        &job.options,
        config.print_debug_output,
        backend.as_ref(),
        |state| {
            if let Some(record) = state.last_record() {
                println!(
                    "  [{}/{}] {} = {}: {:?}",
                    state.completed(),
                    state.total(),
                    swept,
                    format_value(record.step.value),
                    record.result.status
                );
                if config.print_debug_output {
                    print!("{}", debug_report(record));
                }
            }
            writer.write(state)
        },
    )
    .with_context(|| format!("Sweep aborted; partial results in {}", writer.output_path().display()))?;

    Ok(state)
}

fn create_backend(threads: Option<usize>) -> Result<Box<dyn ComputeBackend>> {
    Ok(match threads {
        Some(1) => Box::new(SerialBackend),
        Some(n) => Box::new(CpuBackend::with_threads(n).context("Failed to start worker pool")?),
        None => Box::new(CpuBackend::new()),
    })
}
