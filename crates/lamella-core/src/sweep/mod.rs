//! Sweeps over wavelength or incidence angle.
//!
//! [`run_sweep`] evaluates every step of a [`SweepPlan`] on a
//! [`ComputeBackend`]. Steps run concurrently; their results are funnelled
//! back to the calling thread, folded into an immutable [`SweepState`] and
//! handed to a sink callback after each step. The callback is the only place
//! output is written, so it never needs synchronisation.
//!
//! A failing step never aborts the sweep: its error is recorded as a
//! [`Failure`](crate::types::EvaluationStatus::Failure) result. Only a sink
//! error stops the sweep, in which case no new steps are started.

pub mod plan;
pub mod state;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

use lamella_compute::{ComputeBackend, ComputeError};
use lamella_geometry::GratingProfile;
use thiserror::Error;

use crate::solver::{GratingSolver, SolverError};
use crate::types::{EfficiencyResult, MathOptions};

pub use plan::{included_angle_incidence, SpectralUnits, SweepGeometry, SweepMode, SweepPlan, SweepStep};
pub use state::{SweepRecord, SweepState, SweepStatus};

/// Errors that stop a sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Invalid sweep: {0}")]
    InvalidPlan(String),

    #[error("Compute backend error: {0}")]
    Backend(#[from] ComputeError),

    #[error("Failed to write sweep results: {0}")]
    Sink(#[from] io::Error),
}

fn evaluate_step(
    solver: &dyn GratingSolver,
    profile: &GratingProfile,
    step: &SweepStep,
    options: &MathOptions,
    debug: bool,
) -> EfficiencyResult {
    match step.incidence_deg {
        Some(incidence_deg) => solver.evaluate(profile, incidence_deg, step.wavelength_um, options, debug),
        None => {
            let err = SolverError::InvalidInput(format!(
                "no incidence angle satisfies the included-angle condition at {} um",
                step.wavelength_um
            ));
            EfficiencyResult::failure(step.wavelength_um, f64::NAN, options, &err)
        }
    }
}

/// Evaluate every step of `plan` and report progress to `on_update`.
///
/// `on_update` is called once before the first step completes and once per
/// completed step, always from the calling thread.
pub fn run_sweep<F>(
    solver: &dyn GratingSolver,
    profile: &GratingProfile,
    plan: &SweepPlan,
    options: &MathOptions,
    debug: bool,
    backend: &dyn ComputeBackend,
    mut on_update: F,
) -> Result<SweepState, SweepError>
where
    F: FnMut(&SweepState) -> io::Result<()>,
{
    let steps = plan.steps(profile.period_um());
    let total = steps.len();
    log::info!(
        "Sweep: {} steps ({}), {} on {}",
        total,
        plan.mode(),
        solver.method_name(),
        backend.device_info().name
    );

    let mut state = SweepState::new(total);
    on_update(&state)?;

    let cancel = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<(usize, EfficiencyResult)>();
    let mut sink_error = None;

    let backend_result = thread::scope(|scope| {
        let cancel = &cancel;
        let steps = &steps;
        let worker = scope.spawn(move || {
            let task = |i: usize| {
                let result = evaluate_step(solver, profile, &steps[i], options, debug);
                // The receiver outlives the worker; a send only fails if the calling thread panicked.
                let _ = tx.send((i, result));
            };
            backend.for_each_index(total, cancel, &task)
        });

        for (i, result) in rx.iter() {
            if sink_error.is_some() {
                continue;
            }
            log::debug!(
                "step {}/{}: {:?} at {:.6} um",
                i + 1,
                total,
                result.status,
                result.wavelength_um
            );
            state = std::mem::replace(&mut state, SweepState::new(0)).with_record(SweepRecord {
                step: steps[i],
                result,
            });
            if let Err(e) = on_update(&state) {
                log::error!("Sink failed, cancelling remaining steps: {e}");
                cancel.store(true, Ordering::Relaxed);
                sink_error = Some(e);
            }
        }

        match worker.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    });

    if let Some(e) = sink_error {
        return Err(SweepError::Sink(e));
    }
    backend_result?;

    log::info!(
        "Sweep finished: {} ({} of {} steps failed)",
        state.status(),
        state.failed(),
        state.total()
    );
    Ok(state)
}
