//! Integration test: sweeps through the compute backends.

use std::io;
use std::sync::Arc;

use approx::assert_relative_eq;
use lamella_compute::{CpuBackend, SerialBackend};
use lamella_core::solver::{GratingSolver, SolverError};
use lamella_core::sweep::{
    run_sweep, SpectralUnits, SweepError, SweepGeometry, SweepPlan, SweepStatus,
};
use lamella_core::types::{EfficiencyResult, EvaluationStatus, MathOptions};
use lamella_core::RcwaSolver;
use lamella_geometry::GratingProfile;
use lamella_materials::{ConstantIndex, MaterialDatabase};

/// Blazed gold grating at grazing incidence across 100-300 eV.
#[test]
fn test_blazed_gold_energy_sweep() {
    let solver = RcwaSolver::new(Arc::new(MaterialDatabase::builtin()));
    let grating = GratingProfile::blazed(1.6, 3.2, 30.0, "Au").unwrap();
    let plan = SweepPlan::new(
        SweepGeometry::ConstantIncidence { incidence_deg: 88.0 },
        SpectralUnits::ElectronVolts,
        100.0,
        300.0,
        5.0,
    )
    .unwrap();
    let opts = MathOptions::new(5).unwrap();

    let mut checkpoints = 0;
    let state = run_sweep(&solver, &grating, &plan, &opts, false, &CpuBackend::new(), |_| {
        checkpoints += 1;
        Ok(())
    })
    .unwrap();

    assert_eq!(state.total(), 41);
    assert_eq!(state.completed(), 41);
    assert_eq!(checkpoints, 42);
    for record in state.records() {
        assert_eq!(record.result.orders.len(), 11);
        assert_ne!(record.result.status, EvaluationStatus::Failure, "{:?}", record.result.diagnostics);
        assert!(record.result.diagnostics.energy_sum <= 1.0 + opts.conservation_tolerance());
        assert!(record.result.diagnostics.total_reflection > 0.0);
    }
    assert_eq!(state.status(), SweepStatus::Succeeded);
}

#[test]
fn test_serial_and_parallel_sweeps_agree() {
    let db = MaterialDatabase::new().with("glass", ConstantIndex::new("glass", 1.5, 0.0));
    let solver = RcwaSolver::new(Arc::new(db));
    let grating = GratingProfile::sinusoidal(1.0, 0.25, "glass").unwrap();
    let plan = SweepPlan::new(
        SweepGeometry::ConstantIncidence { incidence_deg: 10.0 },
        SpectralUnits::Micrometres,
        0.4,
        0.8,
        0.05,
    )
    .unwrap();
    let opts = MathOptions::new(4).unwrap().with_slices(6).unwrap();

    let serial = run_sweep(&solver, &grating, &plan, &opts, false, &SerialBackend, |_| Ok(())).unwrap();
    let parallel = run_sweep(
        &solver,
        &grating,
        &plan,
        &opts,
        false,
        &CpuBackend::with_threads(4).unwrap(),
        |_| Ok(()),
    )
    .unwrap();

    assert_eq!(serial.completed(), 9);
    for (a, b) in serial.records().zip(parallel.records()) {
        assert_eq!(a.step, b.step);
        assert_eq!(a.result.status, b.result.status);
        for (x, y) in a.result.orders.iter().zip(&b.result.orders) {
            assert_relative_eq!(x.efficiency, y.efficiency, epsilon = 1e-12, max_relative = 1e-9);
        }
    }
}

/// Fails every evaluation above a wavelength threshold.
struct ThresholdSolver {
    fail_above_um: f64,
}

impl GratingSolver for ThresholdSolver {
    fn evaluate(
        &self,
        _profile: &GratingProfile,
        incidence_deg: f64,
        wavelength_um: f64,
        options: &MathOptions,
        _debug: bool,
    ) -> EfficiencyResult {
        let mut result = EfficiencyResult::failure(
            wavelength_um,
            incidence_deg,
            options,
            &SolverError::InvalidInput("mock".into()),
        );
        if wavelength_um <= self.fail_above_um {
            result.status = EvaluationStatus::PartialFailure;
        }
        result
    }

    fn method_name(&self) -> &str {
        "threshold mock"
    }
}

fn mock_plan() -> SweepPlan {
    SweepPlan::new(
        SweepGeometry::ConstantIncidence { incidence_deg: 0.0 },
        SpectralUnits::Micrometres,
        0.1,
        0.5,
        0.1,
    )
    .unwrap()
}

#[test]
fn test_status_aggregation_with_mock_solver() {
    let grating = GratingProfile::sinusoidal(1.0, 0.1, "any").unwrap();
    let opts = MathOptions::new(1).unwrap();

    let cases = [
        (1.0, SweepStatus::Succeeded),
        (0.35, SweepStatus::SomeFailed),
        (0.0, SweepStatus::AllFailed),
    ];
    for (threshold, expected) in cases {
        let solver = ThresholdSolver {
            fail_above_um: threshold,
        };
        let mut seen = Vec::new();
        let state = run_sweep(&solver, &grating, &mock_plan(), &opts, false, &SerialBackend, |s| {
            seen.push(s.status());
            Ok(())
        })
        .unwrap();
        assert_eq!(state.status(), expected);
        assert!(seen[..seen.len() - 1].iter().all(|s| *s == SweepStatus::InProgress));
        assert_eq!(*seen.last().unwrap(), expected);
    }
}

#[test]
fn test_unreachable_included_angle_steps_fail_without_aborting() {
    let solver = ThresholdSolver { fail_above_um: 10.0 };
    let grating = GratingProfile::sinusoidal(0.5, 0.1, "any").unwrap();
    // Order 1 at a 170 degree included angle cannot be reached for these wavelengths.
    let plan = SweepPlan::new(
        SweepGeometry::ConstantIncludedAngle {
            included_angle_deg: 170.0,
            order: 1,
        },
        SpectralUnits::Micrometres,
        0.2,
        0.4,
        0.1,
    )
    .unwrap();
    let state = run_sweep(
        &solver,
        &grating,
        &plan,
        &MathOptions::new(1).unwrap(),
        false,
        &SerialBackend,
        |_| Ok(()),
    )
    .unwrap();
    assert_eq!(state.completed(), 3);
    assert_eq!(state.status(), SweepStatus::AllFailed);
}

#[test]
fn test_sink_error_stops_the_sweep() {
    let solver = ThresholdSolver { fail_above_um: 1.0 };
    let grating = GratingProfile::sinusoidal(1.0, 0.1, "any").unwrap();
    let mut calls = 0;
    let err = run_sweep(
        &solver,
        &grating,
        &mock_plan(),
        &MathOptions::new(1).unwrap(),
        false,
        &SerialBackend,
        |_| {
            calls += 1;
            if calls == 3 {
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            } else {
                Ok(())
            }
        },
    )
    .unwrap_err();
    assert!(matches!(err, SweepError::Sink(_)));
    assert_eq!(calls, 3);
}

#[test]
fn test_result_survives_json_round_trip() {
    let db = MaterialDatabase::new().with("glass", ConstantIndex::new("glass", 1.5, 0.0));
    let solver = RcwaSolver::new(Arc::new(db));
    let grating = GratingProfile::sinusoidal(1.0, 0.2, "glass").unwrap();
    let opts = MathOptions::new(3).unwrap().with_slices(4).unwrap();
    let result = solver.evaluate(&grating, 15.0, 0.55, &opts, false);

    let json = serde_json::to_string(&result).unwrap();
    let back: EfficiencyResult = serde_json::from_str(&json).unwrap();

    assert_eq!(back.status, result.status);
    assert_eq!(back.polarization, result.polarization);
    assert_eq!(back.orders.len(), result.orders.len());
    for (a, b) in back.orders.iter().zip(&result.orders) {
        assert_eq!(a.order, b.order);
        assert_eq!(a.status, b.status);
        assert_relative_eq!(a.efficiency, b.efficiency, epsilon = 1e-15, max_relative = 1e-14);
    }
}

#[test]
fn test_each_checkpoint_reports_one_new_record() {
    let solver = ThresholdSolver { fail_above_um: 1.0 };
    let grating = GratingProfile::sinusoidal(1.0, 0.1, "any").unwrap();
    let mut reported = Vec::new();
    let state = run_sweep(
        &solver,
        &grating,
        &mock_plan(),
        &MathOptions::new(1).unwrap(),
        false,
        &CpuBackend::with_threads(3).unwrap(),
        |s| {
            if let Some(record) = s.last_record() {
                reported.push(record.step.index);
            }
            Ok(())
        },
    )
    .unwrap();

    assert_eq!(reported.len(), state.completed());
    reported.sort_unstable();
    assert_eq!(reported, (0..state.total()).collect::<Vec<_>>());
}
