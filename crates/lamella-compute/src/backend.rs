//! Compute backend trait and device abstraction.
//!
//! A backend runs a task once per index in `0..count`. Tasks are independent
//! and may run in any order or concurrently; results are reported by the task
//! itself (typically over a channel), so the backend never needs to know the
//! result type.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

/// Errors originating from compute backends.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Device error: {0}")]
    DeviceError(String),
}

/// Describes the capabilities of a compute backend.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub backend_type: BackendType,
    pub compute_units: Option<usize>,
}

/// The type of compute backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Serial,
    Cpu,
}

/// Abstraction over compute backends.
pub trait ComputeBackend: Send + Sync {
    /// Return information about the device.
    fn device_info(&self) -> DeviceInfo;

    /// Run `task(i)` for every `i` in `0..count`.
    ///
    /// `cancel` is polled before each task starts; once it is set no further
    /// tasks are started, though tasks already running finish. Returns the
    /// number of tasks that ran.
    fn for_each_index(
        &self,
        count: usize,
        cancel: &AtomicBool,
        task: &(dyn Fn(usize) + Send + Sync),
    ) -> Result<usize, ComputeError>;
}

/// Runs every task in order on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialBackend;

impl ComputeBackend for SerialBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Serial (1 thread)".into(),
            backend_type: BackendType::Serial,
            compute_units: Some(1),
        }
    }

    fn for_each_index(
        &self,
        count: usize,
        cancel: &AtomicBool,
        task: &(dyn Fn(usize) + Send + Sync),
    ) -> Result<usize, ComputeError> {
        let mut ran = 0;
        for i in 0..count {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            task(i);
            ran += 1;
        }
        Ok(ran)
    }
}
