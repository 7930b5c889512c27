//! Boundary to the hosting environment.
//!
//! Everything the collection framework needs from the surrounding process goes
//! through [`Host`]: capability checks, one-shot state probes, the reported API
//! level (used for field gating in the snapshot serializer), and the event
//! subscription surface. Implementations live outside this crate; tests ship
//! their own in-memory host.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;

/// Hardware or permission capabilities a source may require before starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// A fused rotation-vector sensor is present.
    RotationVector,
    /// The host can run nearby-device discovery.
    DeviceDiscovery,
    /// The discovery/scan permission has been granted.
    ScanPermission,
    /// The host delivers UI-tree change events.
    UiEventStream,
}

/// One-shot state reads, answered immediately and without side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    /// Whether the device is currently on external power ("true"/"false").
    ChargingState,
    /// The current screen orientation label.
    ScreenOrientation,
}

/// Named event categories a source can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    RotationVector,
    DeviceFound,
    ScreenOrientationChanged,
    UiEvent,
}

/// A single event delivered by the host on a thread of its choosing.
#[derive(Debug, Clone)]
pub struct HostEvent {
    pub timestamp_ms: i64,
    /// Opaque classification code, e.g. the UI event type name.
    pub classification: String,
    pub fields: BTreeMap<String, String>,
}

/// Callback registered for a topic. Handlers must be cheap: check a flag,
/// append one record, return.
pub type EventHandler = Arc<dyn Fn(HostEvent) + Send + Sync>;

/// Token returned by [`Host::subscribe`], used to release the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

pub trait Host: Send + Sync {
    /// Pure capability check; no side effects.
    fn is_capability_available(&self, capability: Capability) -> bool;

    /// Platform API level, consulted once at snapshot-engine construction.
    fn api_level(&self) -> u32;

    /// Immediate state read; `None` when the host cannot answer.
    fn probe(&self, probe: Probe) -> Option<String>;

    /// Register interest in a topic. The host may refuse (permission revoked,
    /// service unavailable); callers treat that as a subscription failure and
    /// stay in their prior state.
    fn subscribe(&self, topic: EventTopic, handler: EventHandler) -> Result<SubscriptionId>;

    /// Release a subscription. Must be idempotent: releasing an unknown or
    /// already-released id is not an error.
    fn unsubscribe(&self, id: SubscriptionId) -> Result<()>;
}
