//! CPU compute backend using Rayon for shared-memory parallelism.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo};

/// CPU backend that spreads tasks across a Rayon thread pool.
pub struct CpuBackend {
    /// Dedicated pool, or `None` to use Rayon's global pool.
    pool: Option<rayon::ThreadPool>,
    num_threads: usize,
}

impl CpuBackend {
    /// Create a new CPU backend on the global pool (all available threads).
    pub fn new() -> Self {
        Self {
            pool: None,
            num_threads: rayon::current_num_threads(),
        }
    }

    /// Create a CPU backend with its own pool of `num_threads` workers.
    pub fn with_threads(num_threads: usize) -> Result<Self, ComputeError> {
        if num_threads == 0 {
            return Err(ComputeError::DeviceError(
                "thread count must be at least 1".into(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("lamella-worker-{i}"))
            .build()
            .map_err(|e| ComputeError::DeviceError(e.to_string()))?;
        Ok(Self {
            pool: Some(pool),
            num_threads,
        })
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuBackend")
            .field("num_threads", &self.num_threads)
            .field("dedicated_pool", &self.pool.is_some())
            .finish()
    }
}

impl ComputeBackend for CpuBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: format!("CPU ({} threads)", self.num_threads),
            backend_type: BackendType::Cpu,
            compute_units: Some(self.num_threads),
        }
    }

    fn for_each_index(
        &self,
        count: usize,
        cancel: &AtomicBool,
        task: &(dyn Fn(usize) + Send + Sync),
    ) -> Result<usize, ComputeError> {
        let ran = AtomicUsize::new(0);
        let run = || {
            (0..count).into_par_iter().for_each(|i| {
                if cancel.load(Ordering::Relaxed) {
                    return;
                }
                task(i);
                ran.fetch_add(1, Ordering::Relaxed);
            })
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
        let ran = ran.into_inner();
        log::debug!("CPU backend ran {ran}/{count} tasks");
        Ok(ran)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_every_index_runs_once() {
        let backend = CpuBackend::with_threads(2).unwrap();
        let seen = Mutex::new(Vec::new());
        let cancel = AtomicBool::new(false);
        let ran = backend
            .for_each_index(50, &cancel, &|i| seen.lock().unwrap().push(i))
            .unwrap();
        assert_eq!(ran, 50);
        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_preset_cancel_runs_nothing() {
        let backend = CpuBackend::new();
        let cancel = AtomicBool::new(true);
        let ran = backend.for_each_index(20, &cancel, &|_| {}).unwrap();
        assert_eq!(ran, 0);
    }

    #[test]
    fn test_zero_threads_is_rejected() {
        assert!(CpuBackend::with_threads(0).is_err());
    }

    #[test]
    fn test_device_info_reports_thread_count() {
        let backend = CpuBackend::with_threads(3).unwrap();
        let info = backend.device_info();
        assert_eq!(info.backend_type, BackendType::Cpu);
        assert_eq!(info.compute_units, Some(3));
    }
}
