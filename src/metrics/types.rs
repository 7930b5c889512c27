use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotTiming {
    pub timestamp: DateTime<Utc>,
    pub node_count: usize,
    pub serialize_ms: u64,
    pub store_ms: u64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu_percent: f32,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub system: SystemMetrics,
    pub recent_snapshots: Vec<SnapshotTiming>,
    pub snapshot_count: u64,
    pub skipped_count: u64,
    pub failed_count: u64,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            system: SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            },
            recent_snapshots: Vec::new(),
            snapshot_count: 0,
            skipped_count: 0,
            failed_count: 0,
        }
    }
}
