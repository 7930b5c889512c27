//! Single-worker capture queue.
//!
//! `capture` runs on whatever thread delivered the UI event and does nothing
//! but take the handles and enqueue them; the walk, encoding and store write
//! all happen on one dedicated thread, strictly in arrival order. One failed
//! task is logged and dropped; the worker keeps going.

use std::{
    collections::BTreeMap,
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
    time::Instant,
};

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;

use super::{
    serialize::TreeSerializer, NodeHandle, SnapshotRecord, UiEvent, DEEP_ACTIVITY_CATEGORY,
};
use crate::metrics::{MetricsCollector, SnapshotTiming};
use crate::store::SnapshotStore;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

enum EngineCommand {
    Capture(CaptureTask),
    Shutdown,
}

struct CaptureTask {
    timestamp_ms: i64,
    classification: String,
    fields: BTreeMap<String, Value>,
    source: Option<NodeHandle>,
    root: NodeHandle,
}

struct EngineInner {
    sender: mpsc::Sender<EngineCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            // Shutdown queues behind any pending captures, so they still land
            // in the store before the thread exits.
            if let Err(err) = self.sender.send(EngineCommand::Shutdown) {
                log_error!("Failed to send shutdown to snapshot worker: {err}");
            }
            if let Err(join_err) = handle.join() {
                log_error!("Failed to join snapshot worker: {join_err:?}");
            }
        }
    }
}

#[derive(Clone)]
pub struct SnapshotEngine {
    inner: Arc<EngineInner>,
    metrics: MetricsCollector,
}

impl SnapshotEngine {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        api_level: u32,
        metrics: MetricsCollector,
    ) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel::<EngineCommand>();
        let serializer = TreeSerializer::new(api_level);
        let worker_metrics = metrics.clone();

        let worker = thread::Builder::new()
            .name("sensekit-snapshot".into())
            .spawn(move || {
                while let Ok(command) = command_rx.recv() {
                    match command {
                        EngineCommand::Capture(task) => {
                            let event_timestamp = task.timestamp_ms;
                            if let Err(err) = process_capture(
                                task,
                                &serializer,
                                store.as_ref(),
                                &worker_metrics,
                            ) {
                                worker_metrics.record_failed();
                                log_error!(
                                    "Snapshot capture failed (event timestamp {event_timestamp}): {err:?}"
                                );
                            }
                        }
                        EngineCommand::Shutdown => break,
                    }
                }
                log_info!("Snapshot worker shutting down");
            })
            .with_context(|| "failed to spawn snapshot worker thread")?;

        Ok(Self {
            inner: Arc::new(EngineInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            metrics,
        })
    }

    /// Fast path, safe to call from the host's event-delivery thread: takes
    /// the handles, queues the task, returns.
    pub fn capture(&self, event: UiEvent) {
        let UiEvent {
            timestamp_ms,
            classification,
            fields,
            source,
            root,
        } = event;

        let Some(root) = root else {
            self.metrics.record_skipped();
            log_info!("UI event at {timestamp_ms} carried no root node, skipping capture");
            return;
        };

        let task = CaptureTask {
            timestamp_ms,
            classification,
            fields,
            source,
            root,
        };

        if self
            .inner
            .sender
            .send(EngineCommand::Capture(task))
            .is_err()
        {
            log_error!("Snapshot worker is gone, dropping capture (event timestamp {timestamp_ms})");
        }
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }
}

fn process_capture(
    task: CaptureTask,
    serializer: &TreeSerializer,
    store: &dyn SnapshotStore,
    metrics: &MetricsCollector,
) -> Result<()> {
    let started = Instant::now();

    let (tree, node_count) = serializer.serialize_tree(&task.root);

    let mut event_map = task.fields;
    event_map.insert("eventType".into(), Value::String(task.classification));
    event_map.insert("eventTime".into(), Value::from(task.timestamp_ms));
    if let Some(source) = task.source {
        // Fields only; the full tree above already covers its subtree.
        let node = serializer.serialize_single(&source, -1);
        event_map.insert(
            "source".into(),
            serde_json::to_value(node).context("failed to encode source node")?,
        );
    }

    let payload_value = serde_json::json!({
        "accessibilityNodes": tree,
        "accessibilityEvent": event_map,
    });
    let payload =
        serde_json::to_string(&payload_value).context("failed to encode snapshot payload")?;
    let serialize_ms = started.elapsed().as_millis() as u64;

    let record = SnapshotRecord {
        event_timestamp_ms: task.timestamp_ms,
        category: DEEP_ACTIVITY_CATEGORY.to_string(),
        payload,
    };

    let store_started = Instant::now();
    store
        .insert(&record)
        .context("failed to persist snapshot record")?;
    let store_ms = store_started.elapsed().as_millis() as u64;

    metrics.record_snapshot(SnapshotTiming {
        timestamp: Utc::now(),
        node_count,
        serialize_ms,
        store_ms,
        total_ms: started.elapsed().as_millis() as u64,
    });
    log_debug!(
        "Captured {node_count} nodes for event at {}",
        task.timestamp_ms
    );

    Ok(())
}
