//! Continuous multi-source telemetry collection for research instrumentation.
//!
//! A fixed set of heterogeneous signal sources (motion, connectivity,
//! charging, interaction markers, screen orientation, UI events) runs under
//! one start/stop contract, each appending timestamped records to its own
//! sink. On top of that, the snapshot engine captures deep serializations of
//! the live UI tree whenever the host reports a UI change, persisting them
//! through an append-only store without blocking the delivering thread.
//!
//! The hosting process supplies a [`Host`] implementation (capabilities,
//! probes, event subscriptions), decides when to call
//! [`Dispatcher::activate`]/[`Dispatcher::deactivate`], and feeds UI events
//! into [`SnapshotEngine::capture`].

pub mod config;
pub mod host;
pub mod metrics;
pub mod sensor;
pub mod snapshot;
pub mod store;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use config::{ConfigStore, SensorToggles};
pub use host::{Capability, EventHandler, EventTopic, Host, HostEvent, Probe, SubscriptionId};
pub use metrics::{MetricsCollector, MetricsSnapshot, SnapshotTiming, SystemMetrics};
pub use sensor::{
    dispatcher::{ActivationSummary, DeactivationSummary, Dispatcher},
    registry::{self, SensorRegistry, SensorSlot},
    sampling::SamplingController,
    AnySensor, Sensor, SensorCore, SinkFactory,
};
pub use snapshot::{
    NodeHandle, NodeSnapshot, SnapshotEngine, SnapshotRecord, UiEvent, UiNode,
    DEEP_ACTIVITY_CATEGORY,
};
pub use store::{csv::CsvSink, sqlite::SqliteStore, RecordSink, SnapshotStore};
pub use utils::logging::init_logging;
