//! Deep UI-tree snapshot capture.
//!
//! On every UI-change event the engine grabs the live root-node handle,
//! queues it on a single background worker, serializes the whole tree into a
//! nested record and hands it to the persistent store. The live tree belongs
//! to the host and can go stale mid-walk; every read tolerates that.

mod engine;
mod serialize;

pub use engine::SnapshotEngine;

use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;
use serde_json::Value;

/// Record category tag under which deep captures are persisted.
pub const DEEP_ACTIVITY_CATEGORY: &str = "deepactivity";

/// Shared handle to a node of the live, externally-owned UI tree.
///
/// The tree may be mutated or torn down by the host at any moment, so every
/// accessor is allowed to come back empty; the serializer maps that to nulls
/// instead of failing the walk.
pub trait UiNode: Send + Sync {
    /// Identity hash of the underlying node. Only unique within one capture.
    fn identity(&self) -> i64;

    /// Number of children the node reports. Individual child lookups may
    /// still come back empty.
    fn child_count(&self) -> usize;

    fn child(&self, index: usize) -> Option<NodeHandle>;

    /// Read one named attribute. `None` means the attribute is unavailable on
    /// this node or the node has been invalidated by the host.
    fn field(&self, name: &str) -> Option<Value>;
}

pub type NodeHandle = Arc<dyn UiNode>;

/// A UI-change event as delivered by the host.
pub struct UiEvent {
    pub timestamp_ms: i64,
    /// Opaque classification code (e.g. the platform event type name).
    pub classification: String,
    /// The event's own scalar attributes, captured flat.
    pub fields: BTreeMap<String, Value>,
    /// The node the event originated from, if the host exposes one.
    pub source: Option<NodeHandle>,
    /// Root of the window content at event time; absent when the host has no
    /// active window.
    pub root: Option<NodeHandle>,
}

/// One serialized node. `parent_id` is −1 for the root only; for every other
/// node it equals the parent's `own_id`. A child the host reported but could
/// not hand out stays in `children` as an explicit null.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub own_id: i64,
    pub parent_id: i64,
    pub fields: BTreeMap<String, Value>,
    pub children: Vec<Option<NodeSnapshot>>,
}

/// The persisted result of one capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    pub event_timestamp_ms: i64,
    pub category: String,
    pub payload: String,
}

/// Node attributes with the platform API level that introduced them.
///
/// The full name list is emitted for every node regardless of level (gated
/// fields below the running level serialize as null), so record consumers see
/// one schema across device generations.
pub(crate) const FIELD_GATES: &[(&str, u32)] = &[
    ("availableExtraData", 26),
    ("childCount", 1),
    ("className", 1),
    ("contentDescription", 1),
    ("drawingOrder", 24),
    ("error", 21),
    ("hintText", 26),
    ("inputType", 14),
    ("liveRegion", 19),
    ("maxTextLength", 21),
    ("movementGranularities", 16),
    ("packageName", 1),
    ("paneTitle", 28),
    ("stateDescription", 30),
    ("text", 1),
    ("textSelectionEnd", 18),
    ("textSelectionStart", 18),
    ("tooltipText", 28),
    ("uniqueId", 33),
    ("viewIdResourceName", 18),
];
