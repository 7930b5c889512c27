mod types;

pub use types::{MetricsSnapshot, SnapshotTiming, SystemMetrics};

use std::sync::{Arc, Mutex};

use sysinfo::{Pid, ProcessesToUpdate, System};

const MAX_RECENT_SNAPSHOTS: usize = 20;

/// Counters and timings for the capture pipeline. Cheap to clone; recorded
/// from the snapshot worker thread, read from wherever diagnostics live.
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    recent_snapshots: Vec<SnapshotTiming>,
    snapshot_count: u64,
    skipped_count: u64,
    failed_count: u64,
    system: System,
    pid: Pid,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());

        // First refresh establishes the baseline for CPU deltas.
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                recent_snapshots: Vec::with_capacity(MAX_RECENT_SNAPSHOTS),
                snapshot_count: 0,
                skipped_count: 0,
                failed_count: 0,
                system,
                pid,
            })),
        }
    }

    pub fn record_snapshot(&self, timing: SnapshotTiming) {
        let mut state = self.lock();
        state.snapshot_count += 1;
        state.recent_snapshots.push(timing);
        if state.recent_snapshots.len() > MAX_RECENT_SNAPSHOTS {
            state.recent_snapshots.remove(0);
        }
    }

    /// A capture that never ran because the event carried no root node.
    pub fn record_skipped(&self) {
        self.lock().skipped_count += 1;
    }

    /// A capture that ran but whose record was dropped.
    pub fn record_failed(&self) {
        self.lock().failed_count += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut state = self.lock();
        let pid = state.pid;
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        let system = if let Some(process) = state.system.process(pid) {
            SystemMetrics {
                cpu_percent: process.cpu_usage(),
                memory_mb: process.memory() as f64 / 1024.0 / 1024.0,
            }
        } else {
            SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            }
        };

        MetricsSnapshot {
            system,
            recent_snapshots: state.recent_snapshots.clone(),
            snapshot_count: state.snapshot_count,
            skipped_count: state.skipped_count,
            failed_count: state.failed_count,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MetricsState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
