//! Accumulated sweep results.
//!
//! [`SweepState`] is a value: each completed step produces a new state via
//! [`SweepState::with_record`], and the writer is handed a shared reference.
//! Records are keyed by step index, so the state reads in sweep order no
//! matter in which order the steps complete.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::plan::SweepStep;
use crate::types::EfficiencyResult;

/// Aggregate outcome of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SweepStatus {
    InProgress,
    SomeFailed,
    AllFailed,
    Succeeded,
}

impl SweepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepStatus::InProgress => "inProgress",
            SweepStatus::SomeFailed => "someFailed",
            SweepStatus::AllFailed => "allFailed",
            SweepStatus::Succeeded => "succeeded",
        }
    }
}

impl fmt::Display for SweepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step together with its evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRecord {
    pub step: SweepStep,
    pub result: EfficiencyResult,
}

impl SweepRecord {
    /// Efficiencies are available (success or partial failure).
    pub fn succeeded(&self) -> bool {
        self.result.status.has_efficiencies()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepState {
    total: usize,
    records: BTreeMap<usize, SweepRecord>,
    /// Step index of the most recently added record.
    last: Option<usize>,
}

impl SweepState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            records: BTreeMap::new(),
            last: None,
        }
    }

    /// The state after `record` completed. A record for an index already
    /// present replaces it.
    #[must_use]
    pub fn with_record(mut self, record: SweepRecord) -> Self {
        self.last = Some(record.step.index);
        self.records.insert(record.step.index, record);
        self
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.records.len()
    }

    pub fn failed(&self) -> usize {
        self.records.values().filter(|r| !r.succeeded()).count()
    }

    /// Completed records in step order.
    pub fn records(&self) -> impl Iterator<Item = &SweepRecord> {
        self.records.values()
    }

    pub fn record(&self, index: usize) -> Option<&SweepRecord> {
        self.records.get(&index)
    }

    /// The record added by the latest [`with_record`](Self::with_record).
    pub fn last_record(&self) -> Option<&SweepRecord> {
        self.last.and_then(|index| self.records.get(&index))
    }

    pub fn is_complete(&self) -> bool {
        self.completed() >= self.total
    }

    pub fn status(&self) -> SweepStatus {
        if !self.is_complete() {
            return SweepStatus::InProgress;
        }
        match self.failed() {
            0 => SweepStatus::Succeeded,
            n if n == self.completed() => SweepStatus::AllFailed,
            _ => SweepStatus::SomeFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SolverError;
    use crate::types::{EvaluationStatus, MathOptions};

    fn record(index: usize, status: EvaluationStatus) -> SweepRecord {
        let opts = MathOptions::new(1).unwrap();
        let mut result =
            EfficiencyResult::failure(0.5, 0.0, &opts, &SolverError::InvalidInput("x".into()));
        result.status = status;
        SweepRecord {
            step: SweepStep {
                index,
                value: 0.5,
                wavelength_um: 0.5,
                incidence_deg: Some(0.0),
            },
            result,
        }
    }

    #[test]
    fn test_status_is_in_progress_until_complete() {
        let state = SweepState::new(2).with_record(record(1, EvaluationStatus::Success));
        assert_eq!(state.status(), SweepStatus::InProgress);
        let state = state.with_record(record(0, EvaluationStatus::Success));
        assert_eq!(state.status(), SweepStatus::Succeeded);
    }

    #[test]
    fn test_partial_failure_counts_as_success() {
        let state = SweepState::new(2)
            .with_record(record(0, EvaluationStatus::Success))
            .with_record(record(1, EvaluationStatus::PartialFailure));
        assert_eq!(state.status(), SweepStatus::Succeeded);
    }

    #[test]
    fn test_some_and_all_failed() {
        let some = SweepState::new(2)
            .with_record(record(0, EvaluationStatus::Failure))
            .with_record(record(1, EvaluationStatus::Success));
        assert_eq!(some.status(), SweepStatus::SomeFailed);

        let all = SweepState::new(2)
            .with_record(record(0, EvaluationStatus::Failure))
            .with_record(record(1, EvaluationStatus::Failure));
        assert_eq!(all.status(), SweepStatus::AllFailed);
        assert_eq!(all.status().to_string(), "allFailed");
    }

    #[test]
    fn test_records_iterate_in_step_order() {
        let state = SweepState::new(3)
            .with_record(record(2, EvaluationStatus::Success))
            .with_record(record(0, EvaluationStatus::Success))
            .with_record(record(1, EvaluationStatus::Failure));
        let order: Vec<usize> = state.records().map(|r| r.step.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(state.failed(), 1);
    }

    #[test]
    fn test_last_record_follows_completion_order() {
        let state = SweepState::new(3);
        assert!(state.last_record().is_none());

        let state = state.with_record(record(2, EvaluationStatus::Success));
        assert_eq!(state.last_record().map(|r| r.step.index), Some(2));
        let state = state.with_record(record(0, EvaluationStatus::Failure));
        assert_eq!(state.last_record().map(|r| r.step.index), Some(0));
        assert_eq!(state.last_record().unwrap().result.status, EvaluationStatus::Failure);
    }

    #[test]
    fn test_empty_sweep_is_succeeded() {
        assert_eq!(SweepState::new(0).status(), SweepStatus::Succeeded);
    }
}
