//! # Lamella Compute
//!
//! Execution backends for independent work items, such as the steps of a
//! wavelength or angle sweep. The [`ComputeBackend`](backend::ComputeBackend)
//! trait keeps the solver free of any threading details.
//!
//! ## Available backends
//!
//! | Backend | Feature flag | Status |
//! |---------|-------------|--------|
//! | Serial (calling thread) | always | Implemented |
//! | CPU (Rayon) | `cpu` (default) | Implemented |

pub mod backend;

#[cfg(feature = "cpu")]
pub mod cpu;

pub use backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo, SerialBackend};

#[cfg(feature = "cpu")]
pub use cpu::CpuBackend;
